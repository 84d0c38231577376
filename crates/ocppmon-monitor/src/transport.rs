//! Transport seam and the monitor read loop.
//!
//! The physical connection (serial port, socket, replay file) lives
//! behind the [`Transport`] trait; the monitor only pulls chunks from it
//! and classifies its failures. [`MonitorRunner`] is the single read
//! loop: one chunk per wake-up, fed synchronously through the pipeline,
//! with a pause flag and a bounded reconnect policy.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult, TransportError};
use crate::event::MonitorEvent;
use crate::pipeline::MonitorPipeline;

/// A source of raw text chunks.
///
/// Implementations own the physical connection lifecycle; the monitor
/// never opens or closes anything itself.
pub trait Transport {
    /// Waits for the next chunk.
    ///
    /// Returns `Ok(None)` on a clean end of stream. Chunks are arbitrary
    /// sized with no framing guarantee.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Option<String>, TransportError>>;

    /// Tears down and re-establishes the underlying connection.
    fn reconnect(&mut self) -> impl Future<Output = Result<(), TransportError>>;
}

/// Heuristic for errors worth a reconnect attempt.
///
/// Matches the error text against the phrases serial drivers actually
/// produce when a device drops off the bus.
pub fn is_connection_error(error: &TransportError) -> bool {
    let text = error.to_string().to_lowercase();
    ["disconnected", "closed", "failed"]
        .iter()
        .any(|needle| text.contains(needle))
}

/// Drives a [`Transport`] through a [`MonitorPipeline`].
pub struct MonitorRunner<T> {
    transport: T,
    pipeline: MonitorPipeline,
    config: MonitorConfig,
    paused: Arc<AtomicBool>,
}

impl<T: Transport> MonitorRunner<T> {
    /// Creates a runner over the given transport.
    pub fn new(transport: T, config: MonitorConfig) -> Self {
        let pipeline = MonitorPipeline::new(&config);
        Self {
            transport,
            pipeline,
            config,
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The shared pause flag.
    ///
    /// While set, incoming chunks are dropped without touching the
    /// pipeline or tearing down the transport.
    pub fn pause_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.paused)
    }

    /// The pipeline, for snapshot reads between or after runs.
    pub fn pipeline(&self) -> &MonitorPipeline {
        &self.pipeline
    }

    /// Runs the read loop until end of stream or a fatal error.
    ///
    /// `on_event` receives every lifecycle event in stream order. On a
    /// connection-related read error the runner waits the configured
    /// delay and asks the transport to reconnect exactly once per
    /// failure; a reconnect failure is surfaced as
    /// [`MonitorError::ReconnectFailed`]. Any partial frame still in the
    /// extraction buffer at end of stream is dropped.
    pub async fn run(&mut self, mut on_event: impl FnMut(MonitorEvent)) -> MonitorResult<()> {
        loop {
            match self.transport.read_chunk().await {
                Ok(Some(chunk)) => {
                    if self.paused.load(Ordering::Relaxed) {
                        continue;
                    }
                    for event in self.pipeline.feed(&chunk) {
                        on_event(event);
                    }
                }
                Ok(None) => {
                    info!("transport reached end of stream");
                    return Ok(());
                }
                Err(error) if is_connection_error(&error) => {
                    warn!(%error, delay = ?self.config.reconnect_delay, "connection lost, reconnecting");
                    tokio::time::sleep(self.config.reconnect_delay).await;
                    self.transport
                        .reconnect()
                        .await
                        .map_err(|source| MonitorError::ReconnectFailed { source })?;
                    info!("transport reconnected");
                }
                Err(error) => return Err(MonitorError::Transport(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    const START_REQUEST: &str = r#"[2,"1","StartTransaction",{"connectorId":1,"idTag":"TAG1","meterStart":100,"timestamp":"2024-01-01T00:00:00Z"}]"#;
    const START_RESPONSE: &str = r#"[3,"1",{"idTagInfo":{"status":"Accepted"},"transactionId":"42"}]"#;

    /// Scripted transport: pops one outcome per read.
    struct ScriptedTransport {
        reads: VecDeque<Result<Option<String>, TransportError>>,
        reconnects: usize,
        fail_reconnect: bool,
    }

    impl ScriptedTransport {
        fn new(reads: Vec<Result<Option<String>, TransportError>>) -> Self {
            Self {
                reads: reads.into(),
                reconnects: 0,
                fail_reconnect: false,
            }
        }
    }

    impl Transport for ScriptedTransport {
        async fn read_chunk(&mut self) -> Result<Option<String>, TransportError> {
            self.reads.pop_front().unwrap_or(Ok(None))
        }

        async fn reconnect(&mut self) -> Result<(), TransportError> {
            self.reconnects += 1;
            if self.fail_reconnect {
                Err(TransportError::device("port open failed"))
            } else {
                Ok(())
            }
        }
    }

    fn chunk(text: &str) -> Result<Option<String>, TransportError> {
        Ok(Some(text.to_string()))
    }

    #[tokio::test]
    async fn feeds_chunks_until_end_of_stream() {
        let transport =
            ScriptedTransport::new(vec![chunk(START_REQUEST), chunk(START_RESPONSE)]);
        let mut runner = MonitorRunner::new(transport, MonitorConfig::default());

        let mut events = Vec::new();
        runner.run(|event| events.push(event)).await.unwrap();

        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, MonitorEvent::FrameExtracted(_)))
                .count(),
            2
        );
        assert_eq!(runner.pipeline().transactions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_error_triggers_single_reconnect() {
        let transport = ScriptedTransport::new(vec![
            chunk(START_REQUEST),
            Err(TransportError::device("device disconnected")),
            chunk(START_RESPONSE),
        ]);
        let mut runner = MonitorRunner::new(transport, MonitorConfig::default());

        runner.run(|_| {}).await.unwrap();

        assert_eq!(runner.transport.reconnects, 1);
        assert_eq!(runner.pipeline().transactions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reconnect_is_surfaced() {
        let mut transport = ScriptedTransport::new(vec![Err(TransportError::device(
            "serial port closed",
        ))]);
        transport.fail_reconnect = true;
        let mut runner = MonitorRunner::new(transport, MonitorConfig::default());

        let result = runner.run(|_| {}).await;
        assert!(matches!(result, Err(MonitorError::ReconnectFailed { .. })));
    }

    #[tokio::test]
    async fn non_connection_error_is_fatal_without_reconnect() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::device(
            "framing error on wire",
        ))]);
        let mut runner = MonitorRunner::new(transport, MonitorConfig::default());

        let result = runner.run(|_| {}).await;
        assert!(matches!(result, Err(MonitorError::Transport(_))));
        assert_eq!(runner.transport.reconnects, 0);
    }

    #[tokio::test]
    async fn paused_runner_drops_chunks() {
        let transport =
            ScriptedTransport::new(vec![chunk(START_REQUEST), chunk(START_RESPONSE)]);
        let mut runner = MonitorRunner::new(transport, MonitorConfig::default());
        runner.pause_flag().store(true, Ordering::Relaxed);

        let mut events = Vec::new();
        runner.run(|event| events.push(event)).await.unwrap();

        assert!(events.is_empty());
        assert!(runner.pipeline().transactions().is_empty());
    }

    #[test]
    fn connection_error_heuristic() {
        assert!(is_connection_error(&TransportError::device(
            "device disconnected"
        )));
        assert!(is_connection_error(&TransportError::device(
            "stream closed by peer"
        )));
        assert!(is_connection_error(&TransportError::device(
            "open failed: busy"
        )));
        assert!(!is_connection_error(&TransportError::device(
            "parity error"
        )));
    }
}
