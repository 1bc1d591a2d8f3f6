//! Surface objects and surface blobs

use crate::error::{ExplorerError, Result};
use crate::objects::child::Child;
use bytes::Bytes;
use serde_json::Value;
use std::path::Path;

/// Fortran record marker opening an irap binary header
const IRAP_RECORD_MARKER: i32 = 32;
/// Magic id in the first header word of an irap binary surface
const IRAP_ID: i32 = -996;

/// Encoded surface grid (irap binary)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceBlob {
    data: Bytes,
}

impl SurfaceBlob {
    /// Wrap bytes after checking the irap binary header
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        if data.len() < 8 {
            return Err(ExplorerError::Decode(format!(
                "surface blob too short ({} bytes)",
                data.len()
            )));
        }

        let marker = i32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let id = i32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if marker != IRAP_RECORD_MARKER || id != IRAP_ID {
            return Err(ExplorerError::Decode(
                "surface blob is not in irap binary format".to_string(),
            ));
        }

        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, &self.data).await
    }
}

/// A surface object in Sumo
#[derive(Debug)]
pub struct Surface {
    child: Child,
}

impl Surface {
    pub fn new(child: Child) -> Self {
        Self { child }
    }

    pub fn child(&self) -> &Child {
        &self.child
    }

    pub fn bbox(&self) -> Option<&Value> {
        self.child.document().get_property(&["data", "bbox"])
    }

    pub fn spec(&self) -> Option<&Value> {
        self.child.document().get_property(&["data", "spec"])
    }

    fn t0(&self) -> Option<&str> {
        self.child.document().get_str(&["data", "time", "t0", "value"])
    }

    fn t1(&self) -> Option<&str> {
        self.child.document().get_str(&["data", "time", "t1", "value"])
    }

    /// Timestamp, when the surface has one time value
    pub fn timestamp(&self) -> Option<&str> {
        match (self.t0(), self.t1()) {
            (Some(t0), None) => Some(t0),
            _ => None,
        }
    }

    /// `(t0, t1)` when the surface covers an interval
    pub fn interval(&self) -> Option<(&str, &str)> {
        match (self.t0(), self.t1()) {
            (Some(t0), Some(t1)) => Some((t0, t1)),
            _ => None,
        }
    }

    /// Fetch the blob and check it is an irap binary surface
    pub async fn to_surface_blob(&self) -> Result<SurfaceBlob> {
        match self.child.format() {
            Some("irap_binary") => SurfaceBlob::from_bytes(self.child.blob().await?),
            other => Err(ExplorerError::Decode(format!(
                "Unknown surface format: {}",
                other.unwrap_or("<missing>")
            ))),
        }
    }
}

impl std::ops::Deref for Surface {
    type Target = Child;

    fn deref(&self) -> &Child {
        &self.child
    }
}

#[cfg(test)]
pub(crate) fn irap_header() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&IRAP_RECORD_MARKER.to_be_bytes());
    data.extend_from_slice(&IRAP_ID.to_be_bytes());
    data.extend_from_slice(&[0u8; 24]);
    data.extend_from_slice(&IRAP_RECORD_MARKER.to_be_bytes());
    data
}
