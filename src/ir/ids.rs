//! Newtype label identifier.
//!
//! Label ids are indices into an external class taxonomy. Their range is a
//! contract with that taxonomy and is only checked on request (see
//! [`crate::validation::ValidateOptions::num_classes`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A class index as written in the first column of a YOLO label line.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub u32);

impl LabelId {
    /// Creates a new LabelId.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelId({})", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LabelId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
