//! Mutation journal: what changed, and who changed it
//!
//! Every tree operation appends a record, drained by the host the way a
//! mutation observer would deliver them. The origin tag lets the engine
//! tell its own rewrites apart from host edits.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Who performed a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Origin {
    /// The page, the user, anything outside the engine
    #[default]
    Host,
    /// An apply cycle
    Engine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
    pub origin: Origin,
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    records: Vec<MutationRecord>,
    origin: Origin,
    revision: u64,
}

impl Journal {
    pub(crate) fn record(&mut self, target: NodeId, kind: MutationKind) {
        self.revision += 1;
        self.records.push(MutationRecord {
            target,
            kind,
            origin: self.origin,
        });
    }

    pub(crate) fn take(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub(crate) fn pending(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn origin(&self) -> Origin {
        self.origin
    }

    /// Swap in a new origin, returning the previous one
    pub(crate) fn set_origin(&mut self, origin: Origin) -> Origin {
        std::mem::replace(&mut self.origin, origin)
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }
}
