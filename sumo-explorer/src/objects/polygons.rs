//! Polygons objects

use crate::objects::child::Child;

/// A polygons object in Sumo (CSV or parquet blob)
#[derive(Debug)]
pub struct Polygons {
    child: Child,
}

impl Polygons {
    pub fn new(child: Child) -> Self {
        Self { child }
    }

    pub fn child(&self) -> &Child {
        &self.child
    }
}

impl std::ops::Deref for Polygons {
    type Target = Child;

    fn deref(&self) -> &Child {
        &self.child
    }
}
