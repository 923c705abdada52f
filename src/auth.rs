//! Password hashing and signed auth tokens for protected pastes.
//!
//! A client that proves knowledge of a paste's password receives
//! `HMAC-SHA256(secret, id)` in a cookie named after the paste. The token is
//! only ever compared, never decoded into anything.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;

/// How long an auth cookie stays valid.
pub const TOKEN_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Name of the cookie carrying the token for paste `id`.
pub fn cookie_name(id: &str) -> String {
    format!("auth_{id}")
}

/// Hash a password with a fresh random salt, returning `(salt, hash)`.
pub fn hash_password(password: &str) -> (Vec<u8>, Vec<u8>) {
    let mut salt = vec![0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let hash = salted_hash(&salt, password);
    (salt, hash)
}

pub fn check_password(password: &str, salt: &[u8], hash: &[u8]) -> bool {
    salted_hash(salt, password).ct_eq(hash).into()
}

fn salted_hash(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// Signs and verifies per-paste auth tokens with the server secret.
#[derive(Clone)]
pub struct Signer {
    secret: Arc<[u8]>,
}

impl Signer {
    pub fn new(secret: &[u8]) -> Self {
        Signer {
            secret: secret.into(),
        }
    }

    fn mac(&self, id: &str) -> HmacSha256 {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac key of any size");
        mac.update(id.as_bytes());
        mac
    }

    pub fn sign_token(&self, id: &str) -> String {
        URL_SAFE_NO_PAD.encode(self.mac(id).finalize().into_bytes())
    }

    pub fn verify_token(&self, id: &str, token: &str) -> bool {
        let Ok(raw) = URL_SAFE_NO_PAD.decode(token) else {
            return false;
        };
        self.mac(id).verify_slice(&raw).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let (salt, hash) = hash_password("secret");
        assert_eq!(salt.len(), SALT_LEN);
        assert_eq!(hash.len(), 32);
        assert!(check_password("secret", &salt, &hash));
        assert!(!check_password("Secret", &salt, &hash));
        assert!(!check_password("", &salt, &hash));
    }

    #[test]
    fn salts_are_random() {
        let (salt_a, hash_a) = hash_password("secret");
        let (salt_b, hash_b) = hash_password("secret");
        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn hash_is_sha256_of_salt_then_password() {
        let salt = b"0123456789abcdef";
        let expected = Sha256::digest(b"0123456789abcdefhunter2");
        assert!(check_password("hunter2", salt, &expected));
    }

    #[test]
    fn truncated_hash_is_rejected() {
        let (salt, hash) = hash_password("secret");
        assert!(!check_password("secret", &salt, &hash[..16]));
    }

    #[test]
    fn tokens_are_bound_to_id_and_secret() {
        let signer = Signer::new(b"server secret");
        let token = signer.sign_token("abcd1234");

        assert!(!token.contains('='));
        assert!(signer.verify_token("abcd1234", &token));
        assert!(!signer.verify_token("abcd1235", &token));
        assert!(!Signer::new(b"other secret").verify_token("abcd1234", &token));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let signer = Signer::new(b"server secret");
        assert!(!signer.verify_token("abcd1234", ""));
        assert!(!signer.verify_token("abcd1234", "not base64!"));
        assert!(!signer.verify_token("abcd1234", "AAAA"));
    }

    #[test]
    fn cookie_is_named_after_paste() {
        assert_eq!(cookie_name("abcd1234"), "auth_abcd1234");
    }
}
