use rand::rngs::OsRng;
use rand::seq::SliceRandom;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a paste id.
pub const KEY_LEN: usize = 8;

/// Generate a random paste id from the base62 alphabet.
pub fn generate_key() -> String {
    let mut rng = OsRng;
    (0..KEY_LEN)
        .filter_map(|_| ALPHABET.choose(&mut rng))
        .map(|&b| b as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys_are_base62() {
        for _ in 0..100 {
            let key = generate_key();
            assert_eq!(key.len(), KEY_LEN);
            assert!(key.chars().all(|c| c.is_ascii_alphanumeric()), "{key}");
        }
    }

    #[test]
    fn keys_differ() {
        let keys: HashSet<_> = (0..1000).map(|_| generate_key()).collect();
        assert_eq!(keys.len(), 1000);
    }
}
