use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::storage::Attribute;
use crate::types::{TupleValue, TupleValueType};

/// Produces one value per attribute during bulk population. Injectable so
/// the storage layer never depends on a particular randomness source.
#[cfg_attr(test, mockall::automock)]
pub trait DataGenerator {
    fn value(&mut self, attribute: &Attribute) -> TupleValue;
}

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bruno", "Carla", "David", "Elena", "Felix", "Greta", "Henry", "Irene", "Jonas",
];
const LAST_NAMES: &[&str] = &[
    "Abel", "Berger", "Chen", "Dubois", "Evans", "Fischer", "Garcia", "Hansen", "Ito", "Jones",
];
const WORDS: &[&str] = &[
    "blue", "night", "river", "stone", "echo", "silver", "dawn", "ember", "hollow", "wild",
    "paper", "glass", "autumn", "neon", "velvet", "quiet",
];

/// Random generator mirroring the usual demo data: years in 1950..=2020,
/// small integers, person-like names and short titles.
pub struct RandomDataGenerator {
    rng: StdRng,
}

impl RandomDataGenerator {
    pub fn new() -> Self {
        RandomDataGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomDataGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick<'a>(&mut self, pool: &'a [&'a str]) -> &'a str {
        pool[self.rng.gen_range(0..pool.len())]
    }

    fn words(&mut self, n: usize) -> String {
        (0..n).map(|_| self.pick(WORDS).to_string()).join(" ")
    }
}

impl Default for RandomDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DataGenerator for RandomDataGenerator {
    fn value(&mut self, attribute: &Attribute) -> TupleValue {
        match attribute.domain {
            TupleValueType::Double => TupleValue::Double(self.rng.gen_range(0.0..100.0)),
            TupleValueType::Bool => TupleValue::Bool(self.rng.gen_bool(0.5)),
            TupleValueType::Int if attribute.name == "year" => {
                TupleValue::Int(self.rng.gen_range(1950..=2020))
            }
            TupleValueType::Int => TupleValue::Int(self.rng.gen_range(0..=100)),
            TupleValueType::Text if attribute.name == "name" => TupleValue::Text(format!(
                "{} {}",
                self.pick(FIRST_NAMES),
                self.pick(LAST_NAMES)
            )),
            TupleValueType::Text if attribute.name == "title" => TupleValue::Text(self.words(3)),
            TupleValueType::Text => TupleValue::Text(self.words(2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_values_match_domain() {
        let mut generator = RandomDataGenerator::with_seed(42);
        let attributes = vec![
            Attribute::new("artist", TupleValueType::Text),
            Attribute::new("year", TupleValueType::Int),
            Attribute::new("rating", TupleValueType::Double),
            Attribute::new("live", TupleValueType::Bool),
        ];
        for _ in 0..100 {
            for attribute in &attributes {
                let value = generator.value(attribute);
                assert!(attribute.domain.matches_value(&value));
            }
        }
    }

    #[test]
    fn test_year_attribute_range() {
        let mut generator = RandomDataGenerator::with_seed(7);
        let year = Attribute::new("year", TupleValueType::Int);
        for _ in 0..200 {
            match generator.value(&year) {
                TupleValue::Int(y) => assert!((1950..=2020).contains(&y)),
                other => panic!("expected an integer year, got {}", other),
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let attribute = Attribute::new("title", TupleValueType::Text);
        let mut a = RandomDataGenerator::with_seed(1234);
        let mut b = RandomDataGenerator::with_seed(1234);
        for _ in 0..20 {
            assert_eq!(a.value(&attribute), b.value(&attribute));
        }
    }
}
