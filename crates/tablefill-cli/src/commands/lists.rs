use anyhow::Result;
use comfy_table::{Cell, Table as ComfyTable};

use crate::args::{Cli, ListsArgs, OutputFormat};
use crate::commands::Workspace;

/// Values shown per list in table output.
const SAMPLE_SIZE: usize = 5;

pub async fn run(cli: &Cli, args: &ListsArgs) -> Result<()> {
    let workspace = Workspace::load(cli)?;
    let lists = workspace.catalog.lists(args.value_type.map(Into::into));

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&lists)?);
        }
        OutputFormat::Table => {
            if lists.is_empty() {
                eprintln!("No custom lists configured.");
                return Ok(());
            }
            let mut t = ComfyTable::new();
            t.set_header(vec!["ID", "Name", "Type", "Items", "Sample"]);
            for list in lists {
                let mut sample = list
                    .values
                    .iter()
                    .take(SAMPLE_SIZE)
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                if list.item_count > SAMPLE_SIZE {
                    sample.push_str(", ...");
                }
                t.add_row(vec![
                    Cell::new(list.id),
                    Cell::new(&list.name),
                    Cell::new(list.value_type),
                    Cell::new(list.item_count),
                    Cell::new(sample),
                ]);
            }
            println!("{}", t);
        }
    }
    Ok(())
}
