use anyhow::Result;

use tablefill_core::output::direct::ping;

use crate::args::Cli;
use crate::commands::Workspace;

pub async fn run(cli: &Cli) -> Result<()> {
    let workspace = Workspace::load(cli)?;
    let profile = workspace.profile(None).await?;
    let target = profile.target(None);
    ping(&target).await?;
    eprintln!("✓ Connected to {} ({})", target.display_url(), profile.name);
    Ok(())
}
