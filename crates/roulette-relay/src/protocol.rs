//! Relay wire protocol: JSON text frames tagged by `type`.

use serde::{Deserialize, Serialize};

/// Frames a client sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Chat text; a leading `/name` makes it a command.
    #[serde(rename = "message")]
    Message { text: String },

    /// The client edited an earlier message.
    #[serde(rename = "edit")]
    Edit,

    /// The client deleted an earlier message.
    #[serde(rename = "delete")]
    Delete,
}

/// Frames the relay sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// First frame on every connection.
    #[serde(rename = "welcome")]
    Welcome { user_id: String },

    /// A status notice for the receiving user.
    #[serde(rename = "notice")]
    Notice { kind: &'static str, text: String },

    /// Text from the partner, unmodified.
    #[serde(rename = "relayed")]
    Relayed { text: String },
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        // Every variant is plain strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
