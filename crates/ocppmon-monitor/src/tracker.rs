//! Charging transaction state machine.
//!
//! Consumes classified, correlated messages for the four tracked actions
//! and maintains the authoritative transaction set. Everything else on
//! the stream passes through untouched.
//!
//! Transactions are created when a `StartTransaction` response with
//! `idTagInfo.status == "Accepted"` arrives, keyed by the server-assigned
//! `transactionId`. `MeterValues` update the energy counters while
//! active; `StopTransaction` finalizes; `StatusNotification` only feeds
//! the single-slot cache used to refine generic stop reasons.
//!
//! Every handler is a defensive no-op on missing or malformed fields:
//! the monitor may have joined the stream mid-session, and a field a
//! device forgot to send must never take the pipeline down.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use ocppmon_core::{Transaction, parse_wire_timestamp};
use ocppmon_protocol::{Call, payload};

const ACTION_START_TRANSACTION: &str = "StartTransaction";
const ACTION_STOP_TRANSACTION: &str = "StopTransaction";
const ACTION_METER_VALUES: &str = "MeterValues";
const ACTION_STATUS_NOTIFICATION: &str = "StatusNotification";

const MEASURAND_ENERGY_IMPORT: &str = "Energy.Active.Import.Register";

/// Stop reason reported when neither the payload nor the transaction
/// carries one.
const DEFAULT_STOP_REASON: &str = "Remote";

/// The most recent StatusNotification, kept only to refine stop reasons.
#[derive(Debug, Clone)]
struct StatusNotification {
    status: Option<String>,
    error_code: Option<String>,
    vendor_error_code: Option<String>,
    seen_at: Instant,
}

/// The authoritative set of charging transactions.
#[derive(Debug)]
pub struct TransactionTracker {
    transactions: HashMap<String, Transaction>,
    last_status: Option<StatusNotification>,
    status_match_window: Duration,
}

impl TransactionTracker {
    /// Creates a tracker with the given status-notification match window.
    pub fn new(status_match_window: Duration) -> Self {
        Self {
            transactions: HashMap::new(),
            last_status: None,
            status_match_window,
        }
    }

    /// Read-only view of the transaction set, keyed by transaction id.
    pub fn transactions(&self) -> &HashMap<String, Transaction> {
        &self.transactions
    }

    /// Clones the transaction set for hand-off to a concurrent reader.
    pub fn snapshot(&self) -> HashMap<String, Transaction> {
        self.transactions.clone()
    }

    /// Applies a tracked request.
    ///
    /// Returns the updated `(transaction_id, transaction)` pair when a
    /// transaction changed, `None` otherwise.
    pub fn handle_call(&mut self, call: &Call) -> Option<(String, Transaction)> {
        match call.action.as_str() {
            ACTION_STOP_TRANSACTION => self.handle_stop(&call.payload),
            ACTION_METER_VALUES => self.handle_meter_values(&call.payload),
            ACTION_STATUS_NOTIFICATION => {
                self.handle_status_notification(&call.payload);
                None
            }
            // StartTransaction requests create nothing on their own; the
            // transaction id only exists once the response accepts.
            _ => None,
        }
    }

    /// Applies a response, given the call it correlates to.
    ///
    /// Only accepted `StartTransaction` responses have an effect.
    pub fn handle_call_result(
        &mut self,
        request: &Call,
        response_payload: &Value,
    ) -> Option<(String, Transaction)> {
        if request.action != ACTION_START_TRANSACTION {
            return None;
        }
        self.handle_start_accepted(&request.payload, response_payload)
    }

    fn handle_start_accepted(
        &mut self,
        request_payload: &Value,
        response_payload: &Value,
    ) -> Option<(String, Transaction)> {
        let auth_status = response_payload
            .get("idTagInfo")
            .and_then(|info| payload::str_field(info, "status"));
        if auth_status != Some("Accepted") {
            debug!(?auth_status, "ignoring non-accepted start response");
            return None;
        }

        let transaction_id = payload::id_field(response_payload, "transactionId")?;
        if self.transactions.contains_key(&transaction_id) {
            // First write wins; a replayed response must not reset state.
            return None;
        }

        let connector_id = payload::int_field(request_payload, "connectorId").unwrap_or(1);
        let id_tag = payload::str_field(request_payload, "idTag").unwrap_or_default();
        let meter_start = payload::int_field(request_payload, "meterStart").unwrap_or(0);
        let start_time = payload::str_field(request_payload, "timestamp")
            .and_then(parse_wire_timestamp)
            .unwrap_or_else(Utc::now);

        let transaction = Transaction::started(connector_id, id_tag, meter_start, start_time);
        info!(%transaction_id, connector_id, "transaction started");
        self.transactions
            .insert(transaction_id.clone(), transaction.clone());
        Some((transaction_id, transaction))
    }

    fn handle_meter_values(&mut self, payload: &Value) -> Option<(String, Transaction)> {
        let transaction_id = payload::id_field(payload, "transactionId")?;
        let transaction = self.transactions.get_mut(&transaction_id)?;
        if !transaction.is_active() {
            return None;
        }

        let meter_wh = latest_energy_sample(payload)?;
        transaction.record_meter_value(meter_wh);
        debug!(%transaction_id, meter_wh, "meter value recorded");
        Some((transaction_id, transaction.clone()))
    }

    fn handle_stop(&mut self, payload: &Value) -> Option<(String, Transaction)> {
        let transaction_id = payload::id_field(payload, "transactionId")?;
        let transaction = self.transactions.get_mut(&transaction_id)?;

        let stop_time = payload::str_field(payload, "timestamp")
            .and_then(parse_wire_timestamp)
            .unwrap_or_else(Utc::now);
        let meter_stop = payload::int_field(payload, "meterStop");

        let mut reason = payload::str_field(payload, "reason")
            .map(str::to_string)
            .or_else(|| transaction.reason.clone())
            .unwrap_or_else(|| DEFAULT_STOP_REASON.to_string());

        // A generic reason gets refined from a StatusNotification that
        // arrived close enough to this stop to describe the same fault.
        if let Some(note) = &self.last_status
            && note.seen_at.elapsed() <= self.status_match_window
        {
            if reason == "Remote" {
                if let Some(code) = note
                    .vendor_error_code
                    .clone()
                    .or_else(|| note.error_code.clone())
                {
                    reason = code;
                }
            } else if reason == "Other"
                && let Some(status) = &note.status
            {
                reason = format!("Other - {status}");
            }
        }

        transaction.complete(stop_time, meter_stop, reason);
        info!(%transaction_id, energy_wh = transaction.energy_wh, "transaction completed");
        Some((transaction_id, transaction.clone()))
    }

    fn handle_status_notification(&mut self, payload: &Value) {
        self.last_status = Some(StatusNotification {
            status: payload::str_field(payload, "status").map(str::to_string),
            error_code: payload::str_field(payload, "errorCode").map(str::to_string),
            vendor_error_code: payload::str_field(payload, "vendorErrorCode").map(str::to_string),
            seen_at: Instant::now(),
        });
    }
}

/// Finds the first sampled energy-register value in a MeterValues payload.
///
/// The payload nests `meterValue: [{sampledValue: [{measurand, value}]}]`;
/// the first sample whose measurand is the active-import energy register
/// wins. A matching sample with a non-numeric value is a no-op.
fn latest_energy_sample(meter_payload: &Value) -> Option<i64> {
    for entry in payload::array_field(meter_payload, "meterValue")? {
        let Some(samples) = payload::array_field(entry, "sampledValue") else {
            continue;
        };
        for sample in samples {
            if payload::str_field(sample, "measurand") == Some(MEASURAND_ENERGY_IMPORT) {
                return sample.get("value").and_then(payload::as_int);
            }
        }
    }
    None
}
