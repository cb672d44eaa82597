//! Error types for activity execution

use serde::{Deserialize, Serialize};

/// Hard failures raised by an activity.
///
/// Values are recorded into replay history, so the type is plain data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActivityError {
    #[error("No activity registered for capability: {capability}")]
    NotRegistered { capability: String },

    #[error("Invalid payload for {capability}: {message}")]
    InvalidPayload { capability: String, message: String },

    #[error("{capability} failed: {message}")]
    Failed { capability: String, message: String },

    #[error("{capability} aborted: {message}")]
    Aborted { capability: String, message: String },

    #[error(
        "Nondeterministic replay at sequence {sequence}: \
         history has {recorded}, orchestration scheduled {scheduled}"
    )]
    Nondeterministic {
        sequence: u64,
        recorded: String,
        scheduled: String,
    },
}

impl ActivityError {
    pub fn failed(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            capability: capability.into(),
            message: message.into(),
        }
    }

    pub fn not_registered(capability: impl Into<String>) -> Self {
        Self::NotRegistered {
            capability: capability.into(),
        }
    }

    pub fn invalid_payload(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Capability the failure belongs to, when known
    pub fn capability(&self) -> Option<&str> {
        match self {
            Self::NotRegistered { capability }
            | Self::InvalidPayload { capability, .. }
            | Self::Failed { capability, .. }
            | Self::Aborted { capability, .. } => Some(capability),
            Self::Nondeterministic { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ActivityError::failed("WriteBlob", "container does not exist");
        assert_eq!(err.to_string(), "WriteBlob failed: container does not exist");
        assert_eq!(err.capability(), Some("WriteBlob"));
    }

    #[test]
    fn test_history_round_trip() {
        let err = ActivityError::Nondeterministic {
            sequence: 2,
            recorded: "GetSecret".into(),
            scheduled: "WriteBlob".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "nondeterministic");
        let back: ActivityError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
        assert_eq!(back.capability(), None);
    }
}
