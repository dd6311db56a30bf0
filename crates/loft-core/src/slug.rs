//! Human-readable slug generation for project identifiers.
//!
//! Slugs look like `brisk-otter-x4k2md`: two dictionary words for
//! readability, a short random suffix for collision resistance. The suffix
//! alphabet is lowercase alphanumeric so the slug is always a valid DNS
//! label and a valid Redis channel segment.

use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "bold", "brave", "bright", "brisk", "calm", "clever",
    "cosmic", "crimson", "curious", "dapper", "eager", "early", "fleet",
    "gentle", "gilded", "glad", "golden", "grand", "hardy", "hidden", "humble",
    "ivory", "jolly", "keen", "kind", "lively", "lucid", "lunar", "mellow",
    "misty", "noble", "nimble", "opal", "pale", "placid", "proud", "quiet",
    "rapid", "rustic", "silent", "solar", "steady", "swift", "tidy", "vivid",
    "wild",
];

const NOUNS: &[&str] = &[
    "aspen", "badger", "bay", "beacon", "birch", "bluff", "breeze", "brook",
    "canyon", "cedar", "cliff", "comet", "cove", "crane", "creek", "dune",
    "falcon", "fern", "finch", "fjord", "gale", "glade", "grove", "harbor",
    "heron", "hollow", "island", "knoll", "lagoon", "larch", "lark", "marsh",
    "meadow", "mesa", "moss", "otter", "peak", "pine", "prairie", "reef",
    "ridge", "river", "shore", "sparrow", "spruce", "summit", "thicket",
    "trail", "valley", "willow",
];

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 6;

/// Generate a fresh slug.
#[must_use]
pub fn generate() -> String {
    let mut rng = rand::thread_rng();

    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];

    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect();

    format!("{adjective}-{noun}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slugs_are_unique_across_repeated_calls() {
        let slugs: HashSet<String> = (0..1000).map(|_| generate()).collect();
        assert_eq!(slugs.len(), 1000);
    }

    #[test]
    fn slugs_are_valid_dns_labels() {
        for _ in 0..100 {
            let slug = generate();
            assert!(slug.len() <= 63, "slug too long for a DNS label: {slug}");
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            assert!(!slug.starts_with('-'));
            assert!(!slug.ends_with('-'));
        }
    }
}
