mod index;
mod relation;

pub use index::AttributeIndex;
pub use relation::{
    Attribute, IndexBucketScan, Relation, Schema, SchemaError, StorageLatency, Tuple, TupleScan,
};
