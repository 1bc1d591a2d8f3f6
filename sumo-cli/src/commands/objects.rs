use super::{ChildArgs, ObjectKind};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use sumo_explorer::{ChildCollection, Explorer, SurfaceCollection};

fn collection(explorer: &Explorer, kind: ObjectKind, args: &ChildArgs) -> Result<ChildCollection> {
    let children = ChildCollection::new(
        Arc::clone(explorer.client()),
        kind.into(),
        args.case_uuid()?,
        explorer.paging(),
    );
    Ok(children.add_filter(&args.to_filter()?)?)
}

/// List objects of one class under a case
pub async fn run_objects(
    explorer: &Explorer,
    kind: ObjectKind,
    args: &ChildArgs,
    limit: usize,
) -> Result<()> {
    let children = collection(explorer, kind, args)?;
    let total = children.len().await?;

    println!("{} objects", total);
    println!("--------------------------------------------------------------------------------");
    for i in 0..total.min(limit) {
        let child = children.at(i).await?;
        let member = match (child.realization(), child.operation()) {
            (Some(id), _) => format!("realization-{}", id),
            (None, Some(operation)) => operation.to_string(),
            (None, None) => "-".to_string(),
        };
        println!(
            "{}  {:<28} {:<24} {:<8} {}",
            child.uuid(),
            child.name().unwrap_or("-"),
            child.tagname().unwrap_or("-"),
            child.iteration().unwrap_or("-"),
            member,
        );
    }
    if total > limit {
        println!("... {} more", total - limit);
    }

    Ok(())
}

fn print_values(dimension: &str, values: &[Value]) {
    println!("{} ({})", dimension, values.len());
    for value in values {
        match value {
            Value::String(s) => println!("  {}", s),
            other => println!("  {}", other),
        }
    }
}

/// Print distinct values of a case or object dimension
pub async fn run_facets(
    explorer: &Explorer,
    dimension: &str,
    kind: Option<ObjectKind>,
    args: &ChildArgs,
) -> Result<()> {
    let Some(kind) = kind else {
        let cases = explorer.cases();
        let values = match dimension {
            "names" => cases.names().await?,
            "statuses" => cases.statuses().await?,
            "users" => cases.users().await?,
            "assets" => cases.assets().await?,
            "fields" => cases.fields().await?,
            other => anyhow::bail!(
                "Unknown case dimension '{}'. Accepted: names, statuses, users, assets, fields",
                other
            ),
        };
        print_values(dimension, &values);
        return Ok(());
    };

    if kind == ObjectKind::Surface && matches!(dimension, "timestamps" | "intervals") {
        let surfaces = SurfaceCollection::new(
            Arc::clone(explorer.client()),
            args.case_uuid()?,
            explorer.paging(),
        )
        .filter(&args.to_filter()?)?;

        if dimension == "timestamps" {
            let values: Vec<Value> = surfaces
                .timestamps()
                .await?
                .into_iter()
                .map(Value::String)
                .collect();
            print_values(dimension, &values);
        } else {
            let intervals = surfaces.intervals().await?;
            println!("{} ({})", dimension, intervals.len());
            for (t0, t1) in intervals {
                println!("  {} - {}", t0, t1);
            }
        }
        return Ok(());
    }

    let children = collection(explorer, kind, args)?;
    let values = match dimension {
        "names" => children.names().await?,
        "tagnames" => children.tagnames().await?,
        "iterations" => children.iterations().await?,
        "realizations" => children.realizations().await?,
        "aggregations" => children.aggregations().await?,
        "stages" => children.stages().await?,
        other => anyhow::bail!(
            "Unknown object dimension '{}'. Accepted: names, tagnames, iterations, realizations, aggregations, stages, timestamps, intervals",
            other
        ),
    };
    print_values(dimension, &values);

    Ok(())
}
