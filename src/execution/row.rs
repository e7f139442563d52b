use std::rc::Rc;

use crate::types::TupleValue;

/// Transient output unit of an operator: an ordered column-name -> value
/// mapping. The column header is shared between all rows of one operator
/// instance; rows are produced, consumed by the parent and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Rc<Vec<String>>,
    values: Vec<TupleValue>,
}

impl Row {
    pub(crate) fn new(columns: Rc<Vec<String>>, values: Vec<TupleValue>) -> Row {
        debug_assert_eq!(columns.len(), values.len());
        Row { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[TupleValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&TupleValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub(crate) fn value_at(&self, position: usize) -> &TupleValue {
        &self.values[position]
    }

    pub(crate) fn into_values(self) -> Vec<TupleValue> {
        self.values
    }
}

#[derive(Debug, Clone, Copy)]
enum MergeSource {
    Left(usize),
    Right(usize),
}

/// Precomputed merge of two row headers for the join operators: left
/// columns first, right-only columns appended, and on a name collision
/// the right side's value wins.
#[derive(Debug, Clone)]
pub(crate) struct MergeLayout {
    columns: Rc<Vec<String>>,
    sources: Vec<MergeSource>,
}

impl MergeLayout {
    pub(crate) fn plan(left: &[String], right: &[String]) -> MergeLayout {
        let mut columns = Vec::with_capacity(left.len() + right.len());
        let mut sources = Vec::with_capacity(left.len() + right.len());
        for (i, column) in left.iter().enumerate() {
            match right.iter().position(|c| c == column) {
                Some(j) => sources.push(MergeSource::Right(j)),
                None => sources.push(MergeSource::Left(i)),
            }
            columns.push(column.clone());
        }
        for (j, column) in right.iter().enumerate() {
            if !left.contains(column) {
                columns.push(column.clone());
                sources.push(MergeSource::Right(j));
            }
        }
        MergeLayout {
            columns: Rc::new(columns),
            sources,
        }
    }

    pub(crate) fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn merge(&self, left: &Row, right: &Row) -> Row {
        let values = self
            .sources
            .iter()
            .map(|source| match source {
                MergeSource::Left(i) => left.value_at(*i).clone(),
                MergeSource::Right(j) => right.value_at(*j).clone(),
            })
            .collect();
        Row::new(self.columns.clone(), values)
    }
}
