use anyhow::Result;

use crate::args::{Cli, JobArgs};
use crate::commands::Workspace;

pub async fn run(cli: &Cli, args: &JobArgs) -> Result<()> {
    let workspace = Workspace::load(cli)?;
    let input = workspace.build_input(args).await?;
    let preview = workspace.driver().preview_insert(&input).await?;

    for event in &preview.events {
        eprintln!("{}", event);
    }
    for statement in &preview.statements {
        println!("{}", statement);
    }
    Ok(())
}
