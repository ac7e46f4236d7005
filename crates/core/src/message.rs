//! The command/response contract between a driver and a page session.
//!
//! Wire format is JSON with an `action` tag and camelCase fields:
//!
//! ```json
//! { "action": "rewritePage", "apiKey": "sk-...", "targetLevel": "B1" }
//! { "success": true, "originalLength": 5120, "newLength": 4310 }
//! ```

use serde::{Deserialize, Serialize};

use crate::level::CefrLevel;

/// A command sent to a page session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    RewritePage { api_key: String, target_level: CefrLevel },
    #[serde(rename_all = "camelCase")]
    SummarizePage { api_key: String, target_level: CefrLevel },
    ResetPage,
}

impl Command {
    /// Parse a command from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A session's answer to a [`Command`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_length: Option<usize>,
}

impl Response {
    pub fn rewritten(original_length: usize, new_length: usize) -> Self {
        Self { success: true, original_length: Some(original_length), new_length: Some(new_length), ..Default::default() }
    }

    pub fn summarized(summary_length: usize) -> Self {
        Self { success: true, summary_length: Some(summary_length), ..Default::default() }
    }

    pub fn reset() -> Self {
        Self { success: true, ..Default::default() }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()), ..Default::default() }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"success":false,"error":"unserializable response"}"#.to_string())
    }
}
