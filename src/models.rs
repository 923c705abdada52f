use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Paste {
    pub id: String,
    pub content: String,
    pub syntax: String,
    pub allow_edit: bool,
    pub pw_salt: Option<String>,
    pub pw_hash: Option<String>,
    pub created_at: i64,
    pub expires_at: Option<i64>,
}

impl Paste {
    pub fn is_protected(&self) -> bool {
        self.pw_hash.is_some()
    }

    /// Whether the paste is logically gone at `now`, swept or not.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at < now)
    }
}

/// Row shape of the admin listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PasteSummary {
    pub id: String,
    pub created: i64,
    pub expires: i64,
    pub allow_edit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paste(expires_at: Option<i64>) -> Paste {
        Paste {
            id: "abcd1234".into(),
            content: "hello".into(),
            syntax: "auto".into(),
            allow_edit: false,
            pw_salt: None,
            pw_hash: None,
            created_at: 100,
            expires_at,
        }
    }

    #[test]
    fn expiry() {
        assert!(!paste(None).is_expired(i64::MAX));
        assert!(!paste(Some(200)).is_expired(199));
        assert!(!paste(Some(200)).is_expired(200));
        assert!(paste(Some(200)).is_expired(201));
    }
}
