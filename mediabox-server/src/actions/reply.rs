//! Successful action responses

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

/// Body produced by a successful action, always sent with 200
///
/// Serializes as `{"success": true, "message"?: ..., ...data}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReply {
    body: Map<String, Value>,
}

impl ActionReply {
    /// `{"success": true}`
    pub fn ok() -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        Self { body }
    }

    /// `{"success": true, "message": message}`
    pub fn message(message: impl Into<String>) -> Self {
        Self::ok().with("message", Value::String(message.into()))
    }

    /// Add a data field next to `success`
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.body.insert(key.to_string(), value);
        self
    }

    /// Field lookup, mostly for tests
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// JSON body of the reply
    pub fn body(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

impl IntoResponse for ActionReply {
    fn into_response(self) -> Response {
        Json(Value::Object(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_body_shape() {
        let reply = ActionReply::message("Discovery started.").with("devices", json!(["a"]));
        assert_eq!(
            reply.body(),
            json!({"success": true, "message": "Discovery started.", "devices": ["a"]})
        );
    }
}
