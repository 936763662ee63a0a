use basket::commands::Cli;
use basket::libs::access::USER_ENV;
use basket::libs::error::TaskError;
use basket::libs::messages::macros::is_debug_mode;
use basket::libs::messages::Message;
use basket::msg_error;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    if is_debug_mode() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("basket=debug"));
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }

    match Cli::menu() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<TaskError>() {
                Some(TaskError::NotAuthorized { user, .. }) if user.is_empty() => msg_error!(Message::NoIdentity(USER_ENV.to_string())),
                Some(task_err) => msg_error!(Message::OperationFailed {
                    kind: task_err.kind().to_string(),
                    reason: task_err.to_string(),
                }),
                None => msg_error!(err),
            }
            ExitCode::FAILURE
        }
    }
}
