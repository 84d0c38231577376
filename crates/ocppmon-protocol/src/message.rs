//! OCPP message forms and classification.
//!
//! Every frame on the wire is a JSON array whose first element is an
//! integer type tag: 2 for a Call, 3 for a CallResult, 4 for a CallError.
//! [`Message::classify`] validates that shape and extracts the fields
//! positionally. Classification has no side effects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClassifyError, ClassifyResult};
use crate::framing::Frame;

/// Type tag for a request.
pub const MESSAGE_TYPE_CALL: i64 = 2;
/// Type tag for a successful response.
pub const MESSAGE_TYPE_CALL_RESULT: i64 = 3;
/// Type tag for an error response.
pub const MESSAGE_TYPE_CALL_ERROR: i64 = 4;

/// A request: `[2, messageId, action, payload]`.
///
/// `action` is an open vocabulary; unknown actions are preserved, not
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Correlation id, never empty.
    pub message_id: String,
    /// The OCPP action name, never empty.
    pub action: String,
    /// The action payload. An empty object if the frame omitted it.
    pub payload: Value,
}

/// A successful response: `[3, messageId, payload]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    /// Correlation id of the originating call, never empty.
    pub message_id: String,
    /// The response payload.
    pub payload: Value,
}

/// An error response: `[4, messageId, errorCode, errorDescription, details]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallError {
    /// Correlation id of the originating call, never empty.
    pub message_id: String,
    /// Machine-readable error code.
    pub error_code: String,
    /// Human-readable description; empty if the frame omitted it.
    pub error_description: String,
    /// Free-form error details; null if the frame omitted them.
    pub details: Value,
}

/// A classified OCPP message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// A request from the charge point.
    Call(Call),
    /// A successful response.
    CallResult(CallResult),
    /// An error response.
    CallError(CallError),
}

impl Message {
    /// Classifies an extracted frame into one of the three message forms.
    ///
    /// Validates the array shape (length ≥ 3, integer type tag, non-empty
    /// string message id) and extracts fields positionally per type.
    pub fn classify(frame: &Frame) -> ClassifyResult<Self> {
        let items = frame
            .value()
            .as_array()
            .ok_or(ClassifyError::NotAnArray)?;

        if items.len() < 3 {
            return Err(ClassifyError::shape("array shorter than three elements"));
        }

        let type_id = items[0]
            .as_i64()
            .ok_or_else(|| ClassifyError::shape("type tag is not an integer"))?;

        let message_id = non_empty_string(
            &items[1],
            "message id is not a string",
            "message id is empty",
        )?;

        match type_id {
            MESSAGE_TYPE_CALL => {
                let action =
                    non_empty_string(&items[2], "action is not a string", "action is empty")?;
                let payload = items
                    .get(3)
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default()));
                Ok(Self::Call(Call {
                    message_id,
                    action,
                    payload,
                }))
            }
            MESSAGE_TYPE_CALL_RESULT => Ok(Self::CallResult(CallResult {
                message_id,
                payload: items[2].clone(),
            })),
            MESSAGE_TYPE_CALL_ERROR => {
                let error_code = non_empty_string(
                    &items[2],
                    "error code is not a string",
                    "error code is empty",
                )?;
                let error_description = items
                    .get(3)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let details = items.get(4).cloned().unwrap_or(Value::Null);
                Ok(Self::CallError(CallError {
                    message_id,
                    error_code,
                    error_description,
                    details,
                }))
            }
            other => Err(ClassifyError::UnknownMessageType { type_id: other }),
        }
    }

    /// The correlation id, whichever form this is.
    pub fn message_id(&self) -> &str {
        match self {
            Self::Call(call) => &call.message_id,
            Self::CallResult(result) => &result.message_id,
            Self::CallError(error) => &error.message_id,
        }
    }
}

fn non_empty_string(
    value: &Value,
    not_a_string: &'static str,
    empty: &'static str,
) -> ClassifyResult<String> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        Some(_) => Err(ClassifyError::ShapeMismatch { reason: empty }),
        None => Err(ClassifyError::ShapeMismatch {
            reason: not_a_string,
        }),
    }
}
