mod common;

#[cfg(test)]
mod tests {
    use super::common::{BasketContext, ADMIN, GROUP, MONITOR, USER};
    use basket::db::access::{AccessItem, AccessList};
    use basket::libs::access::CallerIdentity;
    use basket::libs::auth::{AuthorizationGate, AuthorizationOracle, Role, WorkbasketPermission};
    use basket::libs::error::ErrorKind;
    use basket::libs::task::WorkbasketSummary;
    use std::sync::Arc;
    use test_context::test_context;

    fn basket(id: &str) -> WorkbasketSummary {
        WorkbasketSummary {
            id: id.to_string(),
            key: id.to_string(),
            domain: "DOMAIN_A".to_string(),
            ..WorkbasketSummary::default()
        }
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_access_list_permissions(ctx: &mut BasketContext) {
        let list = AccessList::new(ctx.db.clone(), ctx.config.roles.clone());
        let user = CallerIdentity::new(USER, &[GROUP]);
        let lone_user = CallerIdentity::new(USER, &[]);

        assert!(list.has_permission(&user, "WBI:1", WorkbasketPermission::Transfer).unwrap());
        assert!(!list.has_permission(&user, "WBI:3", WorkbasketPermission::Transfer).unwrap());
        assert!(list.has_permission(&user, "WBI:4", WorkbasketPermission::Read).unwrap());
        assert!(!list.has_permission(&lone_user, "WBI:4", WorkbasketPermission::Read).unwrap());
        assert!(!list.has_permission(&user, "WBI:4", WorkbasketPermission::Append).unwrap());
        assert!(!list.has_permission(&user, "WBI:404", WorkbasketPermission::Read).unwrap());
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_grant_replaces_previous_flags(ctx: &mut BasketContext) {
        let list = AccessList::new(ctx.db.clone(), ctx.config.roles.clone());
        let user = CallerIdentity::new(USER, &[]);

        list.grant(&AccessItem::new("WBI:5", "USER-1-1", &[WorkbasketPermission::Read, WorkbasketPermission::Distribute]))
            .unwrap();
        assert!(list.has_permission(&user, "WBI:5", WorkbasketPermission::Read).unwrap());
        assert!(list.has_permission(&user, "WBI:5", WorkbasketPermission::Distribute).unwrap());

        list.grant(&AccessItem::new("WBI:5", USER, &[WorkbasketPermission::Open])).unwrap();
        assert!(!list.has_permission(&user, "WBI:5", WorkbasketPermission::Read).unwrap());
        assert!(list.has_permission(&user, "WBI:5", WorkbasketPermission::Open).unwrap());
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_gate_roles_and_admin_bypass(ctx: &mut BasketContext) {
        let gate = AuthorizationGate::new(Arc::new(AccessList::new(ctx.db.clone(), ctx.config.roles.clone())));
        let admin = CallerIdentity::new(ADMIN, &[]);
        let monitor = CallerIdentity::new(MONITOR, &[]);
        let user = CallerIdentity::new(USER, &[GROUP]);

        assert!(gate.is_admin(&admin));
        assert!(!gate.is_admin(&monitor));

        gate.check_permission(&admin, &basket("WBI:5"), WorkbasketPermission::Transfer).unwrap();
        gate.check_permission(&user, &basket("WBI:1"), WorkbasketPermission::Append).unwrap();
        let err = gate.check_permission(&user, &basket("WBI:5"), WorkbasketPermission::Read).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);

        gate.check_role(&monitor, &[Role::Monitor, Role::Admin]).unwrap();
        gate.check_role(&admin, &[Role::Monitor, Role::Admin]).unwrap();
        assert_eq!(gate.check_role(&user, &[Role::Monitor, Role::Admin]).unwrap_err().kind(), ErrorKind::NotAuthorized);
    }
}
