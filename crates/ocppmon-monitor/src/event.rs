//! Lifecycle events emitted by the pipeline.

use ocppmon_core::Transaction;
use ocppmon_protocol::{CallError, Frame};

/// One observable outcome of feeding a chunk through the pipeline.
///
/// Events come out in the order the stream produced them; a presentation
/// layer polls them and renders frames, transaction rows, and warnings
/// however it likes. The core never renders.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A validated frame was extracted from the stream.
    FrameExtracted(Frame),

    /// A tracked transaction was created or mutated.
    TransactionUpdated {
        /// The server-assigned transaction id.
        transaction_id: String,
        /// The transaction after the update.
        transaction: Transaction,
    },

    /// A CallError arrived. Carries no transaction semantics.
    CallErrorReceived(CallError),

    /// A non-fatal problem worth showing: a discarded malformed frame or
    /// an unclassifiable message.
    Warning {
        /// Human-readable description.
        message: String,
    },
}

impl MonitorEvent {
    /// Returns `true` for warning events.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }
}
