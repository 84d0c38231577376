//! Wire-layer error types.

use thiserror::Error;

/// Result type for message classification.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors produced while classifying an extracted frame.
///
/// None of these are fatal to the pipeline: the caller logs the frame and
/// moves on to the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The top-level JSON value is not an array.
    #[error("top-level JSON value is not an array")]
    NotAnArray,

    /// The array does not have the call/result shape.
    #[error("frame shape mismatch: {reason}")]
    ShapeMismatch {
        /// What was wrong with the shape.
        reason: &'static str,
    },

    /// The leading type tag is an integer outside the known set.
    #[error("unknown message type id: {type_id}")]
    UnknownMessageType {
        /// The unrecognized tag value.
        type_id: i64,
    },
}

impl ClassifyError {
    pub(crate) fn shape(reason: &'static str) -> Self {
        Self::ShapeMismatch { reason }
    }
}
