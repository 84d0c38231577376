//! Monitor error types.

use thiserror::Error;

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors surfaced by a transport collaborator.
///
/// The monitor does not own the physical connection; it only classifies
/// the errors the transport reports (see
/// [`is_connection_error`](crate::is_connection_error)).
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error text reported by the device or driver layer.
    #[error("device error: {0}")]
    Device(String),
}

impl TransportError {
    /// Creates a device-layer error from its message text.
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device(message.into())
    }
}

/// Errors that terminate the monitor read loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A transport error not recognized as connection-related.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The single reconnect attempt after a connection error failed.
    #[error("reconnect attempt failed: {source}")]
    ReconnectFailed {
        /// The error returned by the reconnect attempt.
        source: TransportError,
    },
}
