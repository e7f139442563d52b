use std::collections::BTreeMap;

use super::relation::Tuple;
use crate::types::TupleValue;

/// Secondary index: ordered key -> bucket of tuples sharing that key.
/// Built from a full snapshot of the relation's tuples; never maintained
/// incrementally. Equal keys keep their original relative order.
#[derive(Debug, Clone, Default)]
pub struct AttributeIndex {
    buckets: BTreeMap<TupleValue, Vec<Tuple>>,
}

impl AttributeIndex {
    /// Builds the index over the value at `position` in each tuple via a
    /// stable sort, then groups into buckets.
    pub fn build(tuples: &[Tuple], position: usize) -> AttributeIndex {
        let mut sorted: Vec<&Tuple> = tuples.iter().collect();
        sorted.sort_by(|a, b| a.values[position].cmp(&b.values[position]));
        let mut buckets: BTreeMap<TupleValue, Vec<Tuple>> = BTreeMap::new();
        for tuple in sorted {
            buckets
                .entry(tuple.values[position].clone())
                .or_default()
                .push(tuple.clone());
        }
        AttributeIndex { buckets }
    }

    /// The bucket for `key`, empty when the key is absent.
    pub fn lookup(&self, key: &TupleValue) -> &[Tuple] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(id: i64, year: i64) -> Tuple {
        Tuple::new(vec![TupleValue::Int(id), TupleValue::Int(year)])
    }

    #[test]
    fn test_build_groups_equal_keys_in_original_order() {
        let tuples = vec![
            tuple(0, 1970),
            tuple(1, 1980),
            tuple(2, 1970),
            tuple(3, 1990),
            tuple(4, 1970),
        ];
        let index = AttributeIndex::build(&tuples, 1);
        assert_eq!(index.key_count(), 3);

        let bucket = index.lookup(&TupleValue::Int(1970));
        assert_eq!(bucket, &[tuple(0, 1970), tuple(2, 1970), tuple(4, 1970)]);
        assert_eq!(index.lookup(&TupleValue::Int(1990)), &[tuple(3, 1990)]);
    }

    #[test]
    fn test_lookup_absent_key_is_empty() {
        let index = AttributeIndex::build(&[tuple(0, 1970)], 1);
        assert!(index.lookup(&TupleValue::Int(2000)).is_empty());
    }

    #[test]
    fn test_empty_relation_builds_empty_index() {
        let index = AttributeIndex::build(&[], 0);
        assert_eq!(index.key_count(), 0);
        assert!(index.lookup(&TupleValue::Int(1)).is_empty());
    }
}
