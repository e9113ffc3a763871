// Statement pricing

use crate::app::App;
use anyhow::{anyhow, bail, Result};
use mchbill_core::inventory::ItemId;
use mchbill_core::statement::{Quantity, Statement};

fn parse_entry(entry: &str) -> Result<(ItemId, Option<f64>)> {
    let (id, units) = match entry.split_once(':') {
        Some((id, units)) => (id, Some(units)),
        None => (entry, None),
    };
    let id = id.trim().parse().map_err(|_| anyhow!("Invalid item id in {:?}", entry))?;
    let units = units
        .map(|u| u.trim().parse::<f64>())
        .transpose()
        .map_err(|_| anyhow!("Invalid units in {:?}", entry))?;
    Ok((id, units))
}

pub async fn run(app: &App, entries: &[String]) -> Result<()> {
    let mut statement = Statement::new();
    for entry in entries {
        let (id, units) = parse_entry(entry)?;
        let Some(item) = app.inventory.find(id).await else {
            bail!("No item with id {}", id);
        };
        let quantity = units.map(Quantity::Units).unwrap_or_else(|| Quantity::default_for(&item));
        statement.add(item, quantity)?;
    }

    for line in statement.lines() {
        println!(
            "{:<32} {:>8} x {:>10.2} = {:>10.2}",
            line.item.name,
            line.quantity.total(),
            line.item.price,
            line.subtotal
        );
    }
    println!("{:<32} {:>34.2}", "TOTAL", statement.total());
    Ok(())
}
