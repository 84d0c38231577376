//! Request/response correlation.
//!
//! OCPP responses carry only the message id of the call they answer, not
//! the action name. Without this table a CallResult's semantic meaning is
//! unrecoverable, so every classified Call is recorded here and looked up
//! when its response arrives.

use std::collections::HashMap;

use ocppmon_protocol::Call;
use tracing::debug;

/// Pending-request table mapping message ids to their originating calls.
///
/// Entries are never evicted: a late or duplicate response still resolves
/// against the call that produced it. The table grows with the number of
/// distinct ids seen on the stream.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<String, Call>,
}

impl Correlator {
    /// Creates an empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call, overwriting any previous call with the same id.
    ///
    /// Id collisions are a rare wire condition; last writer wins.
    pub fn record(&mut self, call: Call) {
        if let Some(previous) = self.pending.insert(call.message_id.clone(), call) {
            debug!(
                message_id = %previous.message_id,
                action = %previous.action,
                "overwrote pending call with duplicate message id"
            );
        }
    }

    /// Looks up the call a response correlates to.
    ///
    /// Read-only: the entry stays in the table.
    pub fn resolve(&self, message_id: &str) -> Option<&Call> {
        self.pending.get(message_id)
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no call has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(message_id: &str, action: &str) -> Call {
        Call {
            message_id: message_id.to_string(),
            action: action.to_string(),
            payload: json!({}),
        }
    }

    #[test]
    fn record_then_resolve_round_trip() {
        let mut correlator = Correlator::new();
        let original = call("19", "StartTransaction");
        correlator.record(original.clone());
        assert_eq!(correlator.resolve("19"), Some(&original));
    }

    #[test]
    fn resolve_unseen_id_is_none() {
        let correlator = Correlator::new();
        assert_eq!(correlator.resolve("nope"), None);
    }

    #[test]
    fn resolve_does_not_remove() {
        let mut correlator = Correlator::new();
        correlator.record(call("1", "Heartbeat"));
        assert!(correlator.resolve("1").is_some());
        assert!(correlator.resolve("1").is_some());
        assert_eq!(correlator.len(), 1);
    }

    #[test]
    fn duplicate_id_last_writer_wins() {
        let mut correlator = Correlator::new();
        correlator.record(call("1", "StartTransaction"));
        correlator.record(call("1", "StopTransaction"));
        assert_eq!(correlator.len(), 1);
        assert_eq!(
            correlator.resolve("1").map(|c| c.action.as_str()),
            Some("StopTransaction")
        );
    }

    #[test]
    fn empty_state() {
        let correlator = Correlator::new();
        assert!(correlator.is_empty());
        assert_eq!(correlator.len(), 0);
    }
}
