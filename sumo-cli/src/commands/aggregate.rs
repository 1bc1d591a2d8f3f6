use super::ChildArgs;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use sumo_explorer::{AggregationOperation, Explorer, SurfaceCollection};

/// Aggregate the selected surfaces and write the irap binary result
pub async fn run_aggregate(
    explorer: &Explorer,
    operation: &str,
    args: &ChildArgs,
    output: &Path,
) -> Result<()> {
    // Reject unknown operations before any request is made
    let operation: AggregationOperation = operation.parse()?;

    let surfaces = SurfaceCollection::new(
        Arc::clone(explorer.client()),
        args.case_uuid()?,
        explorer.paging(),
    )
    .filter(&args.to_filter()?)?;

    let count = surfaces.len().await?;
    println!("Aggregating {} surfaces with {}", count, operation);

    let start = Instant::now();
    let blob = surfaces.aggregate(operation).await?;
    blob.write_to(output)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;

    println!(
        "Wrote {} bytes to {:?} in {:.1}s",
        blob.len(),
        output,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
