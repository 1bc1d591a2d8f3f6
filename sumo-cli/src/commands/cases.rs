use anyhow::Result;
use sumo_explorer::{CaseFilter, Explorer};

/// List cases matching the given attributes
pub async fn run_cases(
    explorer: &Explorer,
    status: Option<String>,
    asset: Option<String>,
    field: Option<String>,
    name: Option<String>,
    limit: usize,
) -> Result<()> {
    let mut filter = CaseFilter::new();
    if let Some(status) = status {
        filter = filter.status(status);
    }
    if let Some(asset) = asset {
        filter = filter.asset(asset);
    }
    if let Some(field) = field {
        filter = filter.field(field);
    }
    if let Some(name) = name {
        filter = filter.name(name);
    }

    let cases = explorer.cases().filter(&filter);
    let total = cases.len().await?;

    println!("{} cases", total);
    println!("--------------------------------------------------------------------------------");
    for i in 0..total.min(limit) {
        let case = cases.at(i).await?;
        println!(
            "{}  {:<32} {:<10} {:<12} {}",
            case.uuid(),
            case.name().unwrap_or("-"),
            case.status().unwrap_or("-"),
            case.asset().unwrap_or("-"),
            case.user().unwrap_or("-"),
        );
    }
    if total > limit {
        println!("... {} more", total - limit);
    }

    Ok(())
}
