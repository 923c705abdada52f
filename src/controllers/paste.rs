use std::time::Duration;

use tracing::{info, warn};

use crate::auth::{check_password, hash_password};
use crate::db::is_unique_violation;
use crate::keys::generate_key;
use crate::models::{Paste, PasteSummary};
use crate::types::api::CreatePaste;
use crate::{ApiError, App};

/// How many fresh ids to try before giving up on an insert.
const MAX_KEY_ATTEMPTS: usize = 5;

/// How many pastes the admin listing shows.
const RECENT_LIMIT: i64 = 200;

/// A validated paste submission.
#[derive(Debug)]
pub struct NewPaste {
    pub content: String,
    pub syntax: String,
    pub allow_edit: bool,
    pub password: Option<String>,
    pub ttl: Option<Duration>,
}

impl TryFrom<CreatePaste> for NewPaste {
    type Error = ApiError;

    fn try_from(form: CreatePaste) -> Result<Self, Self::Error> {
        let syntax = match form.syntax.trim() {
            "" => "auto".to_owned(),
            syntax => syntax.to_owned(),
        };

        Ok(NewPaste {
            content: form.content.trim().to_owned(),
            syntax,
            allow_edit: form.allow_edit == "on",
            password: Some(form.password).filter(|p| !p.is_empty()),
            ttl: parse_ttl(&form.ttl)?,
        })
    }
}

/// Parse a TTL like "15m", "2h" or "1d". Empty and zero mean no expiry.
pub fn parse_ttl(ttl: &str) -> crate::ApiResult<Option<Duration>> {
    let ttl = ttl.trim();
    if ttl.is_empty() || ttl == "0" {
        return Ok(None);
    }

    let duration =
        humantime::parse_duration(ttl).map_err(|_| ApiError::InvalidInput("invalid ttl"))?;
    Ok(Some(duration).filter(|d| !d.is_zero()))
}

fn validate_content(app: &App, content: &str) -> crate::ApiResult<()> {
    if content.is_empty() {
        return Err(ApiError::InvalidInput("empty content"));
    }
    if content.len() > app.config.limits.max_content_size {
        return Err(ApiError::InvalidInput("content too large"));
    }
    Ok(())
}

fn expiry(created_at: i64, ttl: Option<Duration>) -> crate::ApiResult<Option<i64>> {
    let Some(ttl) = ttl else { return Ok(None) };

    // sub-second ttls still have to end after creation
    let secs = i64::try_from(ttl.as_secs().max(1))
        .map_err(|_| ApiError::InvalidInput("ttl too long"))?;
    created_at
        .checked_add(secs)
        .map(Some)
        .ok_or(ApiError::InvalidInput("ttl too long"))
}

fn is_authorized(app: &App, paste: &Paste, token: Option<&str>) -> bool {
    !paste.is_protected() || token.map_or(false, |t| app.signer.verify_token(&paste.id, t))
}

/// Fetch a paste that exists and has not expired, without any auth check.
async fn fetch_live(app: &App, id: &str) -> crate::ApiResult<Paste> {
    let paste = app.database.get_paste(id).await?;
    if paste.is_expired(app.clock.now()) {
        return Err(ApiError::Expired);
    }
    Ok(paste)
}

pub async fn create(app: &App, new: NewPaste) -> crate::ApiResult<Paste> {
    create_with_keys(app, new, generate_key).await
}

async fn create_with_keys(
    app: &App,
    new: NewPaste,
    mut next_key: impl FnMut() -> String,
) -> crate::ApiResult<Paste> {
    validate_content(app, &new.content)?;

    let created_at = app.clock.now();
    let expires_at = expiry(created_at, new.ttl)?;

    let (pw_salt, pw_hash) = match &new.password {
        Some(password) => {
            let (salt, hash) = hash_password(password);
            (Some(hex::encode(salt)), Some(hex::encode(hash)))
        }
        None => (None, None),
    };

    let mut paste = Paste {
        id: next_key(),
        content: new.content,
        syntax: new.syntax,
        allow_edit: new.allow_edit,
        pw_salt,
        pw_hash,
        created_at,
        expires_at,
    };

    let mut attempt = 1;
    loop {
        match app.database.insert_paste(&paste).await {
            Ok(()) => break,
            Err(error) if is_unique_violation(&error) && attempt < MAX_KEY_ATTEMPTS => {
                warn!("paste id collision on '{}', retrying", paste.id);
                paste.id = next_key();
                attempt += 1;
            }
            Err(error) => return Err(error.into()),
        }
    }

    info!(
        "new paste: id='{id}', syntax='{syntax}', size={size}, protected={protected}, \
         editable={editable}, expires_at={expires_at:?}",
        id = paste.id,
        syntax = paste.syntax,
        size = paste.content.len(),
        protected = paste.is_protected(),
        editable = paste.allow_edit,
        expires_at = paste.expires_at,
    );

    Ok(paste)
}

/// Fetch a paste for display. Protected pastes need a valid token.
pub async fn get(app: &App, id: &str, token: Option<&str>) -> crate::ApiResult<Paste> {
    let paste = fetch_live(app, id).await?;
    if !is_authorized(app, &paste, token) {
        return Err(ApiError::Unauthorized);
    }
    Ok(paste)
}

pub async fn update(
    app: &App,
    id: &str,
    content: &str,
    token: Option<&str>,
) -> crate::ApiResult<()> {
    let paste = fetch_live(app, id).await?;
    if !paste.allow_edit {
        return Err(ApiError::Forbidden);
    }
    if !is_authorized(app, &paste, token) {
        return Err(ApiError::Unauthorized);
    }
    validate_content(app, content)?;

    if !app.database.update_content(id, content).await? {
        // deleted between the read and the write
        return Err(ApiError::NotFound);
    }

    info!("updated paste: id='{id}', size={size}", size = content.len());
    Ok(())
}

pub async fn delete(app: &App, id: &str) -> crate::ApiResult<()> {
    fetch_live(app, id).await?;
    delete_any(app, id).await
}

/// Delete a paste whether or not it has expired.
pub async fn delete_any(app: &App, id: &str) -> crate::ApiResult<()> {
    if !app.database.delete_paste(id).await? {
        return Err(ApiError::NotFound);
    }
    info!("deleted paste: id='{id}'");
    Ok(())
}

/// Check a paste's password, returning a signed token on success.
pub async fn authenticate(app: &App, id: &str, password: &str) -> crate::ApiResult<String> {
    let paste = app.database.get_paste(id).await?;

    let (Some(salt), Some(hash)) = (&paste.pw_salt, &paste.pw_hash) else {
        return Err(ApiError::NoPassword);
    };

    let matches = match (hex::decode(salt), hex::decode(hash)) {
        (Ok(salt), Ok(hash)) => check_password(password, &salt, &hash),
        _ => {
            warn!("paste '{id}' has a malformed password hash");
            false
        }
    };

    if !matches {
        return Err(ApiError::Unauthorized);
    }

    Ok(app.signer.sign_token(id))
}

/// Physically delete every paste whose expiry has passed.
pub async fn purge_expired(app: &App) -> crate::ApiResult<u64> {
    let count = app.database.delete_expired(app.clock.now()).await?;
    if count > 0 {
        info!("deleted {count} expired pastes");
    }
    Ok(count)
}

pub async fn list_recent(app: &App) -> crate::ApiResult<Vec<PasteSummary>> {
    app.database.recent_pastes(RECENT_LIMIT).await
}
