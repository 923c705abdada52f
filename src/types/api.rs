use serde::{Deserialize, Serialize};

use crate::models::Paste;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePaste {
    pub content: String,
    pub syntax: String,
    pub ttl: String,
    pub allow_edit: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePaste {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthPaste {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedPaste {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasteView {
    pub id: String,
    pub content: String,
    pub syntax: String,
    pub allow_edit: bool,
    /// Unix seconds, 0 when the paste never expires.
    pub expires_at: i64,
}

impl From<Paste> for PasteView {
    fn from(paste: Paste) -> Self {
        PasteView {
            id: paste.id,
            content: paste.content,
            syntax: paste.syntax,
            allow_edit: paste.allow_edit,
            expires_at: paste.expires_at.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Purged {
    pub purged: u64,
}
