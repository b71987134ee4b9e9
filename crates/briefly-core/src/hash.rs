use sha2::{Digest, Sha256};

/// SHA-256 hash of `title + text`, used for exact-content dedup (spec §3
/// RawItem.content_hash). Returned as a lowercase hex string so it's a plain
/// `TEXT` column rather than a bytea, matching how the rest of the schema
/// stores ids/keys.
pub fn content_hash(title: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = content_hash("Title", "Body text");
        let b = content_hash("Title", "Body text");
        assert_eq!(a, b);
    }

    #[test]
    fn sensitive_to_either_field() {
        let a = content_hash("Title", "Body text");
        let b = content_hash("Title", "Body text!");
        let c = content_hash("Title!", "Body text");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
