//! Fragment content hashing via xxh3.

use xxhash_rust::xxh3::xxh3_64;

/// xxh3 64-bit hash of captured markup.
#[inline]
pub fn hash_fragment(markup: &[u8]) -> u64 {
    xxh3_64(markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_markup_hashes_equal() {
        let markup = b"<Pax><PaxID>PAX1</PaxID></Pax>";
        assert_eq!(hash_fragment(markup), hash_fragment(markup));
    }

    #[test]
    fn whitespace_changes_the_hash() {
        assert_ne!(
            hash_fragment(b"<Pax><PTC>ADT</PTC></Pax>"),
            hash_fragment(b"<Pax> <PTC>ADT</PTC></Pax>")
        );
    }
}
