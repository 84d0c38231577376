//! Charging transaction records.
//!
//! This module provides the domain representation of one charging session:
//! - [`Transaction`]: meter readings, timestamps, and energy accounting
//! - [`TransactionStatus`]: the `Pending → Active → Completed` lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a charging transaction.
///
/// `Completed` is terminal; a completed transaction no longer accepts
/// meter updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// A start request has been sent but not yet acknowledged.
    Pending,
    /// The charge point accepted the start; energy is being delivered.
    Active,
    /// The transaction has been stopped.
    Completed,
}

impl TransactionStatus {
    /// Returns a human-readable label for display layers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

/// One charging session's lifecycle and energy accounting.
///
/// Created when a `StartTransaction` exchange concludes, updated by
/// `MeterValues` while active, and frozen by `StopTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Connector the session runs on.
    pub connector_id: i64,

    /// The authorization tag that started the session.
    pub id_tag: String,

    /// When the session started (wire timestamp, else arrival time).
    pub start_time: DateTime<Utc>,

    /// When the session stopped; absent until completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<DateTime<Utc>>,

    /// Meter reading at session start, in Wh.
    pub meter_start: i64,

    /// Most recent meter reading, in Wh; absent until the first update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_stop: Option<i64>,

    /// Energy delivered so far, in Wh. Never negative.
    pub energy_wh: i64,

    /// Current lifecycle state.
    pub status: TransactionStatus,

    /// Why the session stopped; absent until completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Transaction {
    /// Creates an active transaction from the fields of an accepted start.
    pub fn started(
        connector_id: i64,
        id_tag: impl Into<String>,
        meter_start: i64,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            connector_id,
            id_tag: id_tag.into(),
            start_time,
            stop_time: None,
            meter_start,
            meter_stop: None,
            energy_wh: 0,
            status: TransactionStatus::Active,
            reason: None,
        }
    }

    /// Returns `true` while the session accepts meter updates.
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Returns `true` once the session has stopped.
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Applies a new meter reading, in Wh.
    ///
    /// Returns `true` if the reading was applied. Readings against a
    /// non-active session are ignored.
    pub fn record_meter_value(&mut self, meter_wh: i64) -> bool {
        if !self.is_active() {
            return false;
        }
        self.meter_stop = Some(meter_wh);
        self.recompute_energy();
        true
    }

    /// Finalizes the session.
    ///
    /// A missing `meter_stop` falls back to the last recorded reading,
    /// else the start reading. Applying the same stop twice leaves every
    /// field unchanged.
    pub fn complete(
        &mut self,
        stop_time: DateTime<Utc>,
        meter_stop: Option<i64>,
        reason: impl Into<String>,
    ) {
        self.stop_time = Some(stop_time);
        self.meter_stop = meter_stop.or(self.meter_stop).or(Some(self.meter_start));
        self.reason = Some(reason.into());
        self.status = TransactionStatus::Completed;
        self.recompute_energy();
    }

    fn recompute_energy(&mut self) {
        let last = self.meter_stop.unwrap_or(self.meter_start);
        self.energy_wh = (last - self.meter_start).max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn started_transaction_is_active() {
        let tx = Transaction::started(1, "TAG1", 100, start_time());
        assert!(tx.is_active());
        assert_eq!(tx.meter_start, 100);
        assert_eq!(tx.meter_stop, None);
        assert_eq!(tx.energy_wh, 0);
        assert_eq!(tx.reason, None);
    }

    #[test]
    fn meter_value_updates_energy() {
        let mut tx = Transaction::started(1, "TAG1", 100, start_time());
        assert!(tx.record_meter_value(150));
        assert_eq!(tx.meter_stop, Some(150));
        assert_eq!(tx.energy_wh, 50);
    }

    #[test]
    fn meter_value_below_start_clamps_to_zero() {
        let mut tx = Transaction::started(1, "TAG1", 100, start_time());
        assert!(tx.record_meter_value(80));
        assert_eq!(tx.energy_wh, 0);
    }

    #[test]
    fn meter_value_ignored_after_completion() {
        let mut tx = Transaction::started(1, "TAG1", 100, start_time());
        tx.complete(start_time(), Some(200), "Local");
        assert!(!tx.record_meter_value(300));
        assert_eq!(tx.meter_stop, Some(200));
        assert_eq!(tx.energy_wh, 100);
    }

    #[test]
    fn complete_falls_back_to_last_reading() {
        let mut tx = Transaction::started(1, "TAG1", 100, start_time());
        tx.record_meter_value(150);
        tx.complete(start_time(), None, "Remote");
        assert_eq!(tx.meter_stop, Some(150));
        assert_eq!(tx.energy_wh, 50);
    }

    #[test]
    fn complete_falls_back_to_meter_start() {
        let mut tx = Transaction::started(1, "TAG1", 100, start_time());
        tx.complete(start_time(), None, "Remote");
        assert_eq!(tx.meter_stop, Some(100));
        assert_eq!(tx.energy_wh, 0);
    }

    #[test]
    fn complete_is_idempotent() {
        let mut tx = Transaction::started(1, "TAG1", 100, start_time());
        tx.complete(start_time(), Some(200), "Local");
        let first = tx.clone();
        tx.complete(start_time(), Some(200), "Local");
        assert_eq!(tx, first);
    }

    #[test]
    fn status_serde_round_trip() {
        let json = serde_json::to_string(&TransactionStatus::Active).unwrap();
        assert_eq!(json, r#""active""#);
        let parsed: TransactionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TransactionStatus::Active);
    }

    #[test]
    fn transaction_serde_skips_absent_fields() {
        let tx = Transaction::started(1, "TAG1", 100, start_time());
        let json = serde_json::to_string(&tx).unwrap();
        assert!(!json.contains("stop_time"));
        assert!(!json.contains("meter_stop"));
        assert!(!json.contains("reason"));

        let parsed: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tx);
    }
}
