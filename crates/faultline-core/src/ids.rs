use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a single recorded occurrence (`occ_<uuidv7>`).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurrenceId(String);

impl OccurrenceId {
    pub fn new() -> Self {
        Self(format!("occ_{}", Uuid::now_v7()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OccurrenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OccurrenceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
