// Category commands

use crate::app::App;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// List outpatient and inpatient categories
    List,

    /// Move every item of a category into another one
    Rename {
        old: String,
        new: String,
    },

    /// Delete a category and all of its items
    Delete {
        category: String,
    },
}

pub async fn run(app: &App, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::List => {
            println!("Outpatient:");
            for category in app.inventory.outpatient_categories().await {
                println!("  {} ({})", category, app.inventory.items_in(&category).await.len());
            }
            println!("Inpatient:");
            for category in app.inventory.inpatient_categories() {
                println!("  {} ({})", category, app.inventory.items_in(category).await.len());
            }
        }
        CategoryCommand::Rename { old, new } => {
            app.require_editor().await?;
            let moved = app.inventory.rename_category(&old, &new).await?;
            println!("Moved {} item(s) from {} to {}", moved, old, new.trim());
        }
        CategoryCommand::Delete { category } => {
            app.require_editor().await?;
            let removed = app.inventory.delete_category(&category).await?;
            println!("Deleted {} item(s)", removed);
        }
    }
    Ok(())
}
