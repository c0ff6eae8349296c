//! Content hashing for cache keys
//!
//! Reference material and embeddings are keyed by SHA-256 so that
//! distinct content can never share a cache slot.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`
pub fn content_hash(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    hex::encode(hasher.finalize())
}

/// Cache key for one embedding of `text` produced by `model` on `provider`.
///
/// Fields are length-prefixed so `("a|b", "c")` and `("a", "b|c")` differ.
pub fn embedding_cache_key(provider: &str, model: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [provider, model, text] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(content_hash("abc").len(), 64);
    }

    #[test]
    fn test_cache_key_field_boundaries() {
        let a = embedding_cache_key("ollama", "a|b", "c");
        let b = embedding_cache_key("ollama", "a", "b|c");
        assert_ne!(a, b);
        assert_eq!(a, embedding_cache_key("ollama", "a|b", "c"));
    }
}
