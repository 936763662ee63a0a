use crate::{
    db::{db::Db, master_data::MasterData},
    libs::messages::Message,
    msg_success,
};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON file with `workbaskets`, `classifications` and `access` lists
    file: PathBuf,
}

pub fn cmd(args: ImportArgs) -> Result<()> {
    let data = MasterData::from_file(&args.file)?;
    data.import(&Db::new()?)?;

    msg_success!(Message::MasterDataImported {
        workbaskets: data.workbaskets.len(),
        classifications: data.classifications.len(),
        access_items: data.access.len(),
    });
    Ok(())
}
