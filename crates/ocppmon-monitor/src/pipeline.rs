//! The chunk-to-events pipeline.
//!
//! One `feed` call runs extraction, classification, correlation, and
//! state-machine updates synchronously, strictly in arrival order, and
//! returns what happened. All mutable state lives here; callers that
//! want to read concurrently take [`snapshot`](MonitorPipeline::transactions_snapshot)s.

use std::collections::HashMap;

use tracing::{debug, warn};

use ocppmon_core::Transaction;
use ocppmon_protocol::{FrameExtractor, Message};

use crate::config::MonitorConfig;
use crate::correlator::Correlator;
use crate::event::MonitorEvent;
use crate::tracker::TransactionTracker;

/// The monitor core: chunk in, frames and state out.
#[derive(Debug)]
pub struct MonitorPipeline {
    extractor: FrameExtractor,
    correlator: Correlator,
    tracker: TransactionTracker,
}

impl Default for MonitorPipeline {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

impl MonitorPipeline {
    /// Creates a pipeline from the given configuration.
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            extractor: FrameExtractor::with_max_buffer_size(config.max_buffer_size),
            correlator: Correlator::new(),
            tracker: TransactionTracker::new(config.status_match_window),
        }
    }

    /// Feeds one chunk through the pipeline.
    ///
    /// Returns the lifecycle events the chunk produced, in stream order.
    /// Never fails: malformed input becomes warnings, unknown
    /// correlations and unknown transaction references are silent.
    pub fn feed(&mut self, chunk: &str) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        for frame in self.extractor.feed(chunk) {
            events.push(MonitorEvent::FrameExtracted(frame.clone()));

            match Message::classify(&frame) {
                Ok(Message::Call(call)) => {
                    if let Some((transaction_id, transaction)) = self.tracker.handle_call(&call) {
                        events.push(MonitorEvent::TransactionUpdated {
                            transaction_id,
                            transaction,
                        });
                    }
                    self.correlator.record(call);
                }
                Ok(Message::CallResult(result)) => {
                    // A response with no recorded call is expected for
                    // untracked actions and mid-session joins.
                    if let Some(request) = self.correlator.resolve(&result.message_id) {
                        if let Some((transaction_id, transaction)) =
                            self.tracker.handle_call_result(request, &result.payload)
                        {
                            events.push(MonitorEvent::TransactionUpdated {
                                transaction_id,
                                transaction,
                            });
                        }
                    } else {
                        debug!(message_id = %result.message_id, "response without recorded call");
                    }
                }
                Ok(Message::CallError(error)) => {
                    events.push(MonitorEvent::CallErrorReceived(error));
                }
                Err(error) => {
                    warn!(%error, frame = frame.raw(), "unclassifiable frame");
                    events.push(MonitorEvent::Warning {
                        message: format!("unclassifiable frame: {error}"),
                    });
                }
            }
        }

        for discarded in self.extractor.take_discarded() {
            events.push(MonitorEvent::Warning {
                message: format!("discarded malformed frame: {discarded}"),
            });
        }

        events
    }

    /// Read-only view of the tracked transactions.
    pub fn transactions(&self) -> &HashMap<String, Transaction> {
        self.tracker.transactions()
    }

    /// Clones the transaction set for a concurrent reader.
    pub fn transactions_snapshot(&self) -> HashMap<String, Transaction> {
        self.tracker.snapshot()
    }

    /// Number of pending recorded calls (diagnostics).
    pub fn pending_requests(&self) -> usize {
        self.correlator.len()
    }
}
