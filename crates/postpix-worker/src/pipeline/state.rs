use std::fmt;

/// Progress of one work item through the pipeline.
///
/// Each state names what has been completed; [`Stage::step`] names the operation that
/// moves the item out of it. A failed item stays in the last state it reached, so that
/// state's step is the one that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    /// A raw message was received but its body has not been parsed yet.
    Delivered,
    WorkReceived,
    Fetched,
    Transformed,
    Stored,
    MetadataBuilt,
    Persisted,
    Acknowledged,
}

impl Stage {
    /// The state reached when the current step succeeds.
    pub fn next(self) -> Stage {
        match self {
            Stage::Idle => Stage::Delivered,
            Stage::Delivered => Stage::WorkReceived,
            Stage::WorkReceived => Stage::Fetched,
            Stage::Fetched => Stage::Transformed,
            Stage::Transformed => Stage::Stored,
            Stage::Stored => Stage::MetadataBuilt,
            Stage::MetadataBuilt => Stage::Persisted,
            Stage::Persisted => Stage::Acknowledged,
            Stage::Acknowledged => self,
        }
    }

    /// Name of the operation performed in this state, used as the `stage` log field.
    pub fn step(self) -> &'static str {
        match self {
            Stage::Idle => "receive",
            Stage::Delivered => "parse",
            Stage::WorkReceived => "fetch",
            Stage::Fetched => "transform",
            Stage::Transformed => "store",
            Stage::Stored => "synthesize",
            Stage::MetadataBuilt => "persist",
            Stage::Persisted => "acknowledge",
            Stage::Acknowledged => "done",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Acknowledged)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step())
    }
}
