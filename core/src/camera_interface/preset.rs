use serde::{Deserialize, Serialize};

/// Preset record exactly as the camera lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPreset {
    #[serde(default)]
    pub name: String,
    pub token: String,
}

impl RawPreset {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
        }
    }
}
