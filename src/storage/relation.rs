use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use super::index::AttributeIndex;
use crate::datagen::DataGenerator;
use crate::types::{TupleValue, TupleValueType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub domain: TupleValueType,
}

impl Attribute {
    pub fn new(name: &str, domain: TupleValueType) -> Attribute {
        Attribute {
            name: name.to_string(),
            domain,
        }
    }
}

/// Ordered attribute list shared by all tuples of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Schema {
        Schema { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }

    pub fn validate(&self, tuple: &Tuple) -> Result<(), SchemaError> {
        if tuple.values.len() != self.attributes.len() {
            return Err(SchemaError::ArityMismatch {
                expected: self.attributes.len(),
                actual: tuple.values.len(),
            });
        }
        for (attribute, value) in self.attributes.iter().zip(&tuple.values) {
            if !attribute.domain.matches_value(value) {
                return Err(SchemaError::DomainMismatch {
                    attribute: attribute.name.clone(),
                    expected: attribute.domain,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub values: Vec<TupleValue>,
}

impl Tuple {
    pub fn new(values: Vec<TupleValue>) -> Tuple {
        Tuple { values }
    }
}

/// Simulated per-tuple access cost of the medium a relation lives on.
/// A cost model only: the delay blocks before each tuple delivery and is
/// never parallelized or batched away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLatency {
    InMemory,
    Ssd,
    Hdd,
}

impl StorageLatency {
    pub fn per_tuple_delay(&self) -> Duration {
        match self {
            StorageLatency::InMemory => Duration::ZERO,
            StorageLatency::Ssd => Duration::from_millis(10),
            StorageLatency::Hdd => Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    UnknownAttribute(String),
    MissingIndex(String),
    ArityMismatch {
        expected: usize,
        actual: usize,
    },
    DomainMismatch {
        attribute: String,
        expected: TupleValueType,
        value: TupleValue,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::UnknownAttribute(name) => write!(f, "no such attribute: {}", name),
            SchemaError::MissingIndex(name) => write!(f, "no index on attribute: {}", name),
            SchemaError::ArityMismatch { expected, actual } => {
                write!(f, "tuple has {} values, schema has {} attributes", actual, expected)
            }
            SchemaError::DomainMismatch {
                attribute,
                expected,
                value,
            } => write!(
                f,
                "value {} does not match domain {} of attribute {}",
                value, expected, attribute
            ),
        }
    }
}

impl Error for SchemaError {}

#[derive(Debug, Default)]
struct RelationData {
    tuples: Vec<Tuple>,
    indexes: HashMap<String, AttributeIndex>,
}

/// Named, schema-typed tuple multiset plus its secondary indexes and
/// simulated access latency.
///
/// A `Relation` is a cheap-clone handle: `to_hdd()`/`to_ssd()` produce a
/// handle onto the same tuple storage and indexes with a different latency
/// tier. Strictly single-threaded; bulk mutation must not be interleaved
/// with an in-flight scan on the same relation.
#[derive(Debug, Clone)]
pub struct Relation {
    name: String,
    schema: Schema,
    data: Rc<RefCell<RelationData>>,
    latency: StorageLatency,
}

impl Relation {
    pub fn new(name: &str, schema: Schema) -> Relation {
        Relation {
            name: name.to_string(),
            schema,
            data: Rc::new(RefCell::new(RelationData::default())),
            latency: StorageLatency::InMemory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn latency(&self) -> StorageLatency {
        self.latency
    }

    pub fn len(&self) -> usize {
        self.data.borrow().tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same storage, different simulated medium.
    pub fn with_latency(&self, latency: StorageLatency) -> Relation {
        Relation {
            name: self.name.clone(),
            schema: self.schema.clone(),
            data: self.data.clone(),
            latency,
        }
    }

    pub fn to_hdd(&self) -> Relation {
        self.with_latency(StorageLatency::Hdd)
    }

    pub fn to_ssd(&self) -> Relation {
        self.with_latency(StorageLatency::Ssd)
    }

    /// Loads a single schema-validated tuple. Existing indexes are NOT
    /// updated; rebuild them with `create_index` after bulk loading.
    pub fn insert(&self, tuple: Tuple) -> Result<(), SchemaError> {
        self.schema.validate(&tuple)?;
        self.data.borrow_mut().tuples.push(tuple);
        Ok(())
    }

    /// Drops all tuples. Indexes are rebuilt (to empty) since the tuple
    /// set changed.
    pub fn clear(&self) {
        let mut data = self.data.borrow_mut();
        data.tuples.clear();
        for index in data.indexes.values_mut() {
            *index = AttributeIndex::default();
        }
    }

    /// Builds (or replaces) the secondary index on `attribute` from the
    /// current tuples.
    pub fn create_index(&self, attribute: &str) -> Result<(), SchemaError> {
        let position = self
            .schema
            .position_of(attribute)
            .ok_or_else(|| SchemaError::UnknownAttribute(attribute.to_string()))?;
        let index = {
            let data = self.data.borrow();
            AttributeIndex::build(&data.tuples, position)
        };
        self.data
            .borrow_mut()
            .indexes
            .insert(attribute.to_string(), index);
        Ok(())
    }

    /// Appends `n` generated tuples, validating every value against the
    /// schema, then rebuilds every existing index.
    pub fn generate(&self, n: usize, generator: &mut dyn DataGenerator) -> Result<(), SchemaError> {
        let mut fresh = Vec::with_capacity(n);
        for _ in 0..n {
            let values = self
                .schema
                .attributes()
                .iter()
                .map(|attribute| generator.value(attribute))
                .collect();
            let tuple = Tuple::new(values);
            self.schema.validate(&tuple)?;
            fresh.push(tuple);
        }
        self.data.borrow_mut().tuples.append(&mut fresh);

        let indexed: Vec<String> = self.data.borrow().indexes.keys().cloned().collect();
        for attribute in indexed {
            self.create_index(&attribute)?;
        }
        Ok(())
    }

    /// Lazy single-pass scan in storage order, each tuple preceded by the
    /// relation's simulated latency.
    pub fn scan(&self) -> TupleScan {
        TupleScan {
            data: self.data.clone(),
            delay: self.latency.per_tuple_delay(),
            position: 0,
        }
    }

    /// The raw index bucket for `value`, in original relative order.
    /// Empty when no tuple matches; an error only when no index exists.
    pub fn find(&self, attribute: &str, value: &TupleValue) -> Result<Vec<Tuple>, SchemaError> {
        let data = self.data.borrow();
        let index = data
            .indexes
            .get(attribute)
            .ok_or_else(|| SchemaError::MissingIndex(attribute.to_string()))?;
        Ok(index.lookup(value).to_vec())
    }

    /// Index-driven equality lookup delivered tuple by tuple, each
    /// preceded by the relation's simulated latency. Cost is proportional
    /// to the match count, not the relation size.
    pub fn index_scan(
        &self,
        attribute: &str,
        value: &TupleValue,
    ) -> Result<IndexBucketScan, SchemaError> {
        Ok(IndexBucketScan {
            tuples: self.find(attribute, value)?,
            delay: self.latency.per_tuple_delay(),
            position: 0,
        })
    }
}

fn simulate_access(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Cursor over a relation's tuples in storage order.
pub struct TupleScan {
    data: Rc<RefCell<RelationData>>,
    delay: Duration,
    position: usize,
}

impl TupleScan {
    /// Back to the first tuple; a rewound scan pays the access latency again.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl Iterator for TupleScan {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        let tuple = self.data.borrow().tuples.get(self.position).cloned()?;
        self.position += 1;
        simulate_access(self.delay);
        Some(tuple)
    }
}

/// Cursor over one index bucket, snapshotted at lookup time.
pub struct IndexBucketScan {
    tuples: Vec<Tuple>,
    delay: Duration,
    position: usize,
}

impl IndexBucketScan {
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl Iterator for IndexBucketScan {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        let tuple = self.tuples.get(self.position).cloned()?;
        self.position += 1;
        simulate_access(self.delay);
        Some(tuple)
    }
}
