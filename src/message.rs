// src/message.rs
// Wire model for the peer protocol. Field presence on the raw JSON object
// decides the message type: `request`, `response` or `notification`.

use serde_json::{json, Value};
use thiserror::Error;

use crate::peer::request_id::IdSource;

/// A classified protocol message. Inbound payloads only become one of these
/// after passing through [`classify`]; outbound messages are built with the
/// constructors below and serialized with [`Message::to_value`].
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Request {
        id: u64,
        method: String,
        data: Value,
    },
    Response {
        id: u64,
        result: ResponseResult,
    },
    Notification {
        method: String,
        data: Value,
    },
}

/// Outcome carried by a Response: success payload, or an error code/reason
/// pair passed through from the remote peer as-is.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseResult {
    Success { data: Value },
    Error { code: Option<i64>, reason: String },
}

/// Why an inbound payload failed classification. These never reach a pending
/// caller; the dispatcher logs them and drops the payload.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClassifyError {
    #[error("not an object")]
    NotAnObject,

    #[error("missing/invalid method field")]
    InvalidMethod,

    #[error("missing/invalid id field")]
    InvalidId,

    #[error("missing request/response field")]
    MissingDiscriminator,
}

/// Builds an outbound request with a fresh identifier drawn from `ids`.
/// No side effects: the request is not registered anywhere until the peer
/// tracks it.
pub fn create_request(ids: &IdSource, method: &str, data: Option<Value>) -> Message {
    Message::Request {
        id: ids.next_id(),
        method: method.to_string(),
        data: data.unwrap_or_else(|| json!({})),
    }
}

/// Builds the success Response answering the request with the given id.
pub fn create_success_response(id: u64, data: Value) -> Message {
    Message::Response {
        id,
        result: ResponseResult::Success { data },
    }
}

/// Builds the error Response answering the request with the given id.
pub fn create_error_response(id: u64, code: i64, reason: &str) -> Message {
    Message::Response {
        id,
        result: ResponseResult::Error {
            code: Some(code),
            reason: reason.to_string(),
        },
    }
}

/// Builds a fire-and-forget notification.
pub fn create_notification(method: &str, data: Option<Value>) -> Message {
    Message::Notification {
        method: method.to_string(),
        data: data.unwrap_or_else(|| json!({})),
    }
}

/// Classifies one raw inbound payload. Pure and state-free; validation rules
/// are applied in order and short-circuit on the first failure.
pub fn classify(raw: &Value) -> Result<Message, ClassifyError> {
    if !raw.is_object() {
        return Err(ClassifyError::NotAnObject);
    }

    if is_truthy(raw.get("request")) {
        let method = match raw.get("method").and_then(Value::as_str) {
            Some(method) => method.to_string(),
            None => return Err(ClassifyError::InvalidMethod),
        };

        let id = match raw.get("id").and_then(Value::as_u64) {
            Some(id) => id,
            None => return Err(ClassifyError::InvalidId),
        };

        Ok(Message::Request {
            id,
            method,
            data: data_or_default(raw),
        })
    } else if is_truthy(raw.get("response")) {
        let id = match raw.get("id").and_then(Value::as_u64) {
            Some(id) => id,
            None => return Err(ClassifyError::InvalidId),
        };

        let result = if is_truthy(raw.get("ok")) {
            ResponseResult::Success {
                data: data_or_default(raw),
            }
        } else {
            // errorCode/errorReason are forwarded unvalidated; either may be
            // absent on the wire.
            ResponseResult::Error {
                code: raw.get("errorCode").and_then(Value::as_i64),
                reason: raw
                    .get("errorReason")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
        };

        Ok(Message::Response { id, result })
    } else if is_truthy(raw.get("notification")) {
        let method = match raw.get("method").and_then(Value::as_str) {
            Some(method) => method.to_string(),
            None => return Err(ClassifyError::InvalidMethod),
        };

        Ok(Message::Notification {
            method,
            data: data_or_default(raw),
        })
    } else {
        Err(ClassifyError::MissingDiscriminator)
    }
}

impl Message {
    /// Serializes to the wire shape, with the boolean discriminator field
    /// the remote classifier keys on.
    pub fn to_value(&self) -> Value {
        match self {
            Message::Request { id, method, data } => json!({
                "request": true,
                "id": id,
                "method": method,
                "data": data,
            }),
            Message::Response { id, result } => match result {
                ResponseResult::Success { data } => json!({
                    "response": true,
                    "id": id,
                    "ok": true,
                    "data": data,
                }),
                ResponseResult::Error { code, reason } => json!({
                    "response": true,
                    "id": id,
                    "ok": false,
                    "errorCode": code,
                    "errorReason": reason,
                }),
            },
            Message::Notification { method, data } => json!({
                "notification": true,
                "method": method,
                "data": data,
            }),
        }
    }
}

// JS-style truthiness, since peers following the original schema send the
// discriminators as booleans but are not required to.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn data_or_default(raw: &Value) -> Value {
    match raw.get("data") {
        Some(Value::Null) | None => json!({}),
        Some(data) => data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rejects_non_objects() {
        assert_eq!(classify(&json!([1, 2])), Err(ClassifyError::NotAnObject));
        assert_eq!(classify(&json!("hello")), Err(ClassifyError::NotAnObject));
        assert_eq!(classify(&json!(null)), Err(ClassifyError::NotAnObject));
    }

    #[test]
    fn classify_rejects_missing_discriminator() {
        assert_eq!(
            classify(&json!({})),
            Err(ClassifyError::MissingDiscriminator)
        );
        assert_eq!(
            classify(&json!({"id": 1, "method": "m"})),
            Err(ClassifyError::MissingDiscriminator)
        );
    }

    #[test]
    fn classify_rejects_request_without_id() {
        assert_eq!(
            classify(&json!({"request": true, "method": "m"})),
            Err(ClassifyError::InvalidId)
        );
    }

    #[test]
    fn classify_rejects_request_without_method() {
        assert_eq!(
            classify(&json!({"request": true, "id": 7})),
            Err(ClassifyError::InvalidMethod)
        );
        assert_eq!(
            classify(&json!({"request": true, "id": 7, "method": 42})),
            Err(ClassifyError::InvalidMethod)
        );
    }

    #[test]
    fn classify_rejects_notification_without_method() {
        assert_eq!(
            classify(&json!({"notification": true})),
            Err(ClassifyError::InvalidMethod)
        );
    }

    #[test]
    fn classify_request_defaults_data_to_empty_object() {
        let message = classify(&json!({"request": true, "id": 3, "method": "sum"})).unwrap();
        assert_eq!(
            message,
            Message::Request {
                id: 3,
                method: "sum".to_string(),
                data: json!({}),
            }
        );
    }

    #[test]
    fn classify_success_response() {
        let message =
            classify(&json!({"response": true, "id": 42, "ok": true, "data": {"x": 1}})).unwrap();
        assert_eq!(
            message,
            Message::Response {
                id: 42,
                result: ResponseResult::Success { data: json!({"x": 1}) },
            }
        );
    }

    #[test]
    fn classify_error_response_passes_code_and_reason_through() {
        let raw = json!({
            "response": true,
            "id": 42,
            "ok": false,
            "errorCode": 404,
            "errorReason": "not found",
        });
        let message = classify(&raw).unwrap();
        assert_eq!(
            message,
            Message::Response {
                id: 42,
                result: ResponseResult::Error {
                    code: Some(404),
                    reason: "not found".to_string(),
                },
            }
        );
    }

    #[test]
    fn classify_error_response_tolerates_absent_code_and_reason() {
        let message = classify(&json!({"response": true, "id": 8})).unwrap();
        assert_eq!(
            message,
            Message::Response {
                id: 8,
                result: ResponseResult::Error {
                    code: None,
                    reason: String::new(),
                },
            }
        );
    }

    #[test]
    fn classify_notification() {
        let message =
            classify(&json!({"notification": true, "method": "ping", "data": {"n": 2}})).unwrap();
        assert_eq!(
            message,
            Message::Notification {
                method: "ping".to_string(),
                data: json!({"n": 2}),
            }
        );
    }

    #[test]
    fn request_round_trips_through_classify() {
        let ids = IdSource::sequential();
        let request = create_request(&ids, "math.sum", Some(json!({"a": 1, "b": 2})));
        assert_eq!(classify(&request.to_value()).unwrap(), request);

        let bare = create_request(&ids, "ping", None);
        assert_eq!(classify(&bare.to_value()).unwrap(), bare);
        match bare {
            Message::Request { data, .. } => assert_eq!(data, json!({})),
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn responses_and_notifications_round_trip_through_classify() {
        let success = create_success_response(11, json!({"ok": "yes"}));
        assert_eq!(classify(&success.to_value()).unwrap(), success);

        let failure = create_error_response(12, 500, "boom");
        assert_eq!(classify(&failure.to_value()).unwrap(), failure);

        let note = create_notification("chat.message", Some(json!({"text": "hi"})));
        assert_eq!(classify(&note.to_value()).unwrap(), note);
    }

    #[test]
    fn truthy_discriminators_follow_loose_typing() {
        // Peers are expected to send booleans, but any truthy value selects
        // the branch.
        let message = classify(&json!({"request": 1, "id": 5, "method": "m"})).unwrap();
        assert!(matches!(message, Message::Request { id: 5, .. }));

        assert_eq!(
            classify(&json!({"request": false, "response": false})),
            Err(ClassifyError::MissingDiscriminator)
        );
    }
}
