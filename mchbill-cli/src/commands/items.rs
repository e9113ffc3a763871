// Catalog item commands

use crate::app::App;
use anyhow::{bail, Result};
use clap::Subcommand;
use mchbill_core::inventory::{InventoryItem, ItemId, ItemUpdate, NewItem};

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// List items, grouped by category
    List {
        /// Only this category
        #[arg(long)]
        category: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add an item
    Add {
        name: String,
        price: f64,

        #[arg(long)]
        category: Option<String>,

        /// Item type (Tablet, Injection, Test, ...)
        #[arg(long = "type")]
        item_type: Option<String>,

        #[arg(long)]
        strength: Option<String>,
    },

    /// Change an item; omitted fields keep their value
    Update {
        id: ItemId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long = "type")]
        item_type: Option<String>,

        #[arg(long)]
        strength: Option<String>,
    },

    /// Delete an item
    Delete {
        id: ItemId,
    },

    /// Find items by name or category
    Search {
        query: String,
    },
}

pub async fn run(app: &App, command: ItemCommand) -> Result<()> {
    match command {
        ItemCommand::List { category, json } => {
            let items = match category {
                Some(category) => app.inventory.items_in(&category).await,
                None => app.inventory.export_items().await,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_items(&items);
            }
        }
        ItemCommand::Add {
            name,
            price,
            category,
            item_type,
            strength,
        } => {
            app.require_editor().await?;
            let mut item = NewItem::new(name, price);
            item.category = category;
            item.item_type = item_type;
            item.strength = strength;
            let id = app.inventory.add_item(item).await?;
            println!("{}", id);
        }
        ItemCommand::Update {
            id,
            name,
            price,
            category,
            item_type,
            strength,
        } => {
            app.require_editor().await?;
            let Some(current) = app.inventory.find(id).await else {
                bail!("No item with id {}", id);
            };
            let update = ItemUpdate {
                name,
                price,
                category: Some(category.unwrap_or_else(|| current.category.clone())),
                item_type,
                strength,
            };
            app.inventory.update_item(id, update, Some(&current.category)).await?;
        }
        ItemCommand::Delete { id } => {
            app.require_editor().await?;
            let Some(current) = app.inventory.find(id).await else {
                bail!("No item with id {}", id);
            };
            app.inventory.delete_item(id, &current.category).await?;
        }
        ItemCommand::Search { query } => {
            print_items(&app.inventory.search(&query).await);
        }
    }
    Ok(())
}

fn print_items(items: &[InventoryItem]) {
    let mut category = None;
    for item in items {
        if category != Some(&item.category) {
            println!("[{}]", item.category);
            category = Some(&item.category);
        }
        let detail = [item.item_type.as_deref(), item.strength.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {:>14}  {:<32} {:>10.2}  {}", item.id, item.name, item.price, detail);
    }
}
