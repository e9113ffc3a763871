// Import, export and seeding

use crate::app::App;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn import(app: &App, file: &Path) -> Result<()> {
    app.require_editor().await?;
    let json = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let count = app.inventory.import_json(&json).await?;
    println!("Imported {} item(s)", count);
    Ok(())
}

pub async fn export(app: &App, out: Option<&Path>) -> Result<()> {
    match out {
        Some(dir) => {
            let today = chrono::Local::now().date_naive();
            let path = app.inventory.export_to_dir(dir, today).await?;
            println!("{}", path.display());
        }
        None => println!("{}", app.inventory.export_json().await?),
    }
    Ok(())
}

pub async fn seed(app: &App, file: &Path) -> Result<()> {
    app.require_editor().await?;
    if app.inventory.seed_from_json(file).await? {
        println!("Seeded {} item(s)", app.inventory.item_count().await);
    } else {
        println!("Catalog already has items, nothing seeded");
    }
    Ok(())
}
