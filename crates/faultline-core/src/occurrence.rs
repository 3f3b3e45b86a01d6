use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::Metadata;
use crate::failure::Failure;
use crate::ids::OccurrenceId;

/// One recorded instance of a failure. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub failure: Failure,
    pub metadata: Metadata,
}

impl Occurrence {
    pub fn new(failure: Failure, metadata: Metadata) -> Self {
        Self {
            id: OccurrenceId::new(),
            failure,
            metadata,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.metadata.time
    }

    pub fn command(&self) -> &str {
        &self.metadata.command
    }

    /// Every present field as a title-cased `(key, value)` pair, exception first.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(7);
        fields.push(("Exception", self.failure.summary()));
        fields.extend(self.metadata.fields());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{extract, NO_COMMAND};

    #[test]
    fn fields_lead_with_exception() {
        let occ = Occurrence::new(Failure::new("ValueError", "bad input"), extract(None, None));
        let fields = occ.fields();
        assert_eq!(fields[0], ("Exception", "ValueError: bad input".to_string()));
        assert_eq!(fields[2], ("Command", NO_COMMAND.to_string()));
        assert_eq!(fields.len(), 3);
        assert_eq!(occ.command(), NO_COMMAND);
    }

    #[test]
    fn each_occurrence_gets_its_own_id() {
        let a = Occurrence::new(Failure::new("E", "m"), extract(None, None));
        let b = Occurrence::new(Failure::new("E", "m"), extract(None, None));
        assert_ne!(a.id, b.id);
    }
}
