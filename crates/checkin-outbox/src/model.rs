//! Queued operation model.

use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One guided check-in: the single entity type synced to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub thoughts: String,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub body_sensations: Vec<String>,
    pub energy_level: u8,
    #[serde(default)]
    pub behavior: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Checkin {
    pub const MIN_ENERGY: u8 = 1;
    pub const MAX_ENERGY: u8 = 10;

    /// Check the fields the remote schema constrains.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(Self::MIN_ENERGY..=Self::MAX_ENERGY).contains(&self.energy_level) {
            return Err(ValidationError::EnergyOutOfRange(self.energy_level));
        }
        if self.thoughts.trim().is_empty() && self.emotions.is_empty() {
            return Err(ValidationError::Empty);
        }
        Ok(())
    }
}

/// What a queued operation does to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationKind {
    Create {
        payload: Checkin,
    },
    Update {
        #[serde(rename = "targetId")]
        target_id: String,
        payload: Checkin,
    },
    Delete {
        #[serde(rename = "targetId")]
        target_id: String,
    },
}

impl OperationKind {
    /// Short name used in logs and on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// Remote id the operation targets. `None` for creates.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { target_id, .. } | Self::Delete { target_id } => Some(target_id),
        }
    }

    /// Check-in data carried by the operation. `None` for deletes.
    pub fn payload(&self) -> Option<&Checkin> {
        match self {
            Self::Create { payload } | Self::Update { payload, .. } => Some(payload),
            Self::Delete { .. } => None,
        }
    }
}

/// A write persisted in the offline queue until the remote store confirms it.
///
/// Only [`QueuedOperation::new`] creates one, so every operation gets a
/// fresh id and enqueue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    id: String,
    #[serde(flatten)]
    kind: OperationKind,
    enqueued_at: DateTime<Utc>,
}

impl QueuedOperation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            enqueued_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn target_id(&self) -> Option<&str> {
        self.kind.target_id()
    }

    pub fn payload(&self) -> Option<&Checkin> {
        self.kind.payload()
    }
}

/// Result of one drain of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Operations removed from the queue (delivered or dropped).
    pub processed: usize,
    /// Snapshot operations still queued.
    pub remaining: usize,
}

#[cfg(test)]
pub(crate) fn sample_checkin(thoughts: &str) -> Checkin {
    Checkin {
        thoughts: thoughts.to_string(),
        emotions: vec!["calm".to_string()],
        body_sensations: vec!["relaxed shoulders".to_string()],
        energy_level: 6,
        behavior: "went for a walk".to_string(),
        note: None,
        created_at: Utc::now(),
    }
}
