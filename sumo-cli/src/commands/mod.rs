pub mod aggregate;
pub mod cases;
pub mod objects;

pub use aggregate::run_aggregate;
pub use cases::run_cases;
pub use objects::{run_facets, run_objects};

use anyhow::Result;
use clap::{Args, ValueEnum};
use sumo_explorer::{ChildFilter, ObjectClass, TimeFilter, TimeType};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Surface,
    Polygons,
    Table,
}

impl From<ObjectKind> for ObjectClass {
    fn from(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Surface => ObjectClass::Surface,
            ObjectKind::Polygons => ObjectClass::Polygons,
            ObjectKind::Table => ObjectClass::Table,
        }
    }
}

/// Case scope and child filter shared by the object commands
#[derive(Args, Debug, Default)]
pub struct ChildArgs {
    /// Case uuid
    #[arg(long)]
    pub case: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub tagname: Option<String>,

    /// Iteration name, e.g. iter-0
    #[arg(long)]
    pub iteration: Option<String>,

    /// Realization ids (repeatable)
    #[arg(long)]
    pub realization: Vec<i64>,

    /// Aggregation operation of pre-aggregated objects
    #[arg(long)]
    pub aggregation: Option<String>,

    /// Only realization objects, leaving out aggregations
    #[arg(long, conflicts_with = "aggregation")]
    pub realizations_only: bool,

    #[arg(long)]
    pub stage: Option<String>,

    /// Time shape: timestamp, interval, all or none
    #[arg(long)]
    pub time: Option<String>,

    /// Start of the time window (ISO 8601)
    #[arg(long, requires = "time")]
    pub start: Option<String>,

    /// End of the time window (ISO 8601)
    #[arg(long, requires = "time")]
    pub end: Option<String>,

    /// Match window bounds exactly
    #[arg(long, requires = "time")]
    pub exact: bool,

    /// Accept intervals overlapping the window
    #[arg(long, requires = "time")]
    pub overlap: bool,
}

impl ChildArgs {
    pub fn case_uuid(&self) -> Result<&str> {
        match &self.case {
            Some(case) => Ok(case),
            None => anyhow::bail!("--case is required for object commands"),
        }
    }

    pub fn to_filter(&self) -> Result<ChildFilter> {
        let mut filter = ChildFilter::new();
        if let Some(name) = &self.name {
            filter = filter.name(name.as_str());
        }
        if let Some(tagname) = &self.tagname {
            filter = filter.tagname(tagname.as_str());
        }
        if let Some(iteration) = &self.iteration {
            filter = filter.iteration(iteration.as_str());
        }
        if !self.realization.is_empty() {
            filter = filter.realization(self.realization.clone());
        }
        if let Some(aggregation) = &self.aggregation {
            filter = filter.aggregation(aggregation.as_str());
        } else if self.realizations_only {
            filter = filter.aggregation(false);
        }
        if let Some(stage) = &self.stage {
            filter = filter.stage(stage.as_str());
        }
        if let Some(time) = &self.time {
            let mut time = TimeFilter::new(time.parse::<TimeType>()?)
                .exact(self.exact)
                .overlap(self.overlap);
            if let Some(start) = &self.start {
                time = time.start(start.as_str());
            }
            if let Some(end) = &self.end {
                time = time.end(end.as_str());
            }
            filter = filter.time(time);
        }
        Ok(filter)
    }
}
