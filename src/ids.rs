// 🆔 Identifier generation for new accounts and profiles
//
// UUID-v4 shaped ids from a fast non-cryptographic source.
// No uniqueness check against the database; collisions are accepted as negligible.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use uuid::Builder;

/// Source of new 36-character identifiers
pub trait IdGenerator {
    fn new_id(&mut self) -> String;
}

/// Default generator: 16 random bytes shaped into a hyphenated v4 UUID
pub struct RandomIdGenerator {
    rng: SmallRng,
}

impl RandomIdGenerator {
    pub fn new() -> Self {
        RandomIdGenerator {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic sequence, for reproducible fixtures
    pub fn seeded(seed: u64) -> Self {
        RandomIdGenerator {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn new_id(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);

        // Builder sets version nibble to 4 and variant bits to 10xx
        Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_v4_shape(id: &str) {
        assert_eq!(id.len(), 36, "id should be 36 chars: {}", id);

        let chars: Vec<char> = id.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            if [8, 13, 18, 23].contains(&i) {
                assert_eq!(*c, '-', "expected hyphen at {} in {}", i, id);
            } else {
                assert!(
                    c.is_ascii_hexdigit() && !c.is_ascii_uppercase(),
                    "expected lowercase hex at {} in {}",
                    i,
                    id
                );
            }
        }

        assert_eq!(chars[14], '4', "version nibble must be 4: {}", id);
        assert!(
            ['8', '9', 'a', 'b'].contains(&chars[19]),
            "variant nibble must be 8/9/a/b: {}",
            id
        );
    }

    #[test]
    fn test_new_id_has_v4_shape() {
        let mut ids = RandomIdGenerator::new();
        for _ in 0..500 {
            assert_v4_shape(&ids.new_id());
        }
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let mut a = RandomIdGenerator::seeded(42);
        let mut b = RandomIdGenerator::seeded(42);

        assert_eq!(a.new_id(), b.new_id());
        assert_eq!(a.new_id(), b.new_id());
    }

    #[test]
    fn test_consecutive_ids_differ() {
        let mut ids = RandomIdGenerator::seeded(7);
        assert_ne!(ids.new_id(), ids.new_id());
    }
}
