//! OCPP wire layer: stream frame extraction and message classification.
//!
//! OCPP-over-serial delivers JSON-RPC style arrays with no framing
//! guarantee: a single frame may span many reads, and many frames (plus
//! boot noise, log lines, and garbage) may arrive in one read.
//!
//! # Pipeline position
//!
//! ```text
//! raw chunks ──> FrameExtractor ──> Frame ──> Message::classify ──> Message
//! ```
//!
//! # Wire format
//!
//! | Form       | Shape                                                    |
//! |------------|----------------------------------------------------------|
//! | Call       | `[2, messageId, action, payload]`                        |
//! | CallResult | `[3, messageId, payload]`                                |
//! | CallError  | `[4, messageId, errorCode, errorDescription, details]`   |

mod error;
mod framing;
mod message;
pub mod payload;

pub use error::{ClassifyError, ClassifyResult};
pub use framing::{DEFAULT_MAX_BUFFER_SIZE, Frame, FrameExtractor};
pub use message::{
    Call, CallError, CallResult, MESSAGE_TYPE_CALL, MESSAGE_TYPE_CALL_ERROR,
    MESSAGE_TYPE_CALL_RESULT, Message,
};
