use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message returned by a pull on the event subscription.
///
/// The payload is kept as an untyped tree; cameras disagree on its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl Notification {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: Some(topic.into()),
            payload,
        }
    }
}
