//! Entry name hashing.
//!
//! LPK packages never store an entry under its logical name. Every entry is
//! addressed by the lowercase hex MD5 digest of the UTF-8 encoded name.

/// Compute the archive entry name for a logical name.
#[inline]
pub fn hashed_name(logical: &str) -> String {
    format!("{:x}", md5::compute(logical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(hashed_name(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(hashed_name("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}
