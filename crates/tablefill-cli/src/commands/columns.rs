use anyhow::Result;
use comfy_table::{Cell, Table as ComfyTable};

use crate::args::{Cli, ColumnsArgs, OutputFormat};
use crate::commands::Workspace;

pub async fn run(cli: &Cli, args: &ColumnsArgs) -> Result<()> {
    let workspace = Workspace::load(cli)?;
    let profile = workspace.profile(None).await?;
    let columns = workspace
        .fetch_columns(&profile, args.database.as_deref(), &args.table)
        .await?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&columns)?);
        }
        OutputFormat::Table => {
            let mut t = ComfyTable::new();
            t.set_header(vec!["Column", "Type", "Kind", "PK"]);
            for column in &columns {
                t.add_row(vec![
                    Cell::new(&column.name),
                    Cell::new(&column.raw_type),
                    Cell::new(column.classification),
                    Cell::new(if column.is_primary { "PK" } else { "" }),
                ]);
            }
            println!("{}", t);
        }
    }
    Ok(())
}
