use std::collections::HashMap;
use std::rc::Rc;

use itertools::Itertools;

use super::expression::{resolve_column, CompiledPredicate, EvaluationError, Predicate};
use super::row::{MergeLayout, Row};
use crate::storage::{IndexBucketScan, Relation, SchemaError, TupleScan};
use crate::types::TupleValue;

/// Pull-based physical operator. `next_row` produces the next output row
/// or signals exhaustion. All column references are resolved when the
/// tree is built, so iteration itself cannot fail.
///
/// Operators are single-pass from the caller's view; `rewind` exists so
/// the nested-loop join can re-run its right input once per left row.
pub trait Operator {
    fn next_row(&mut self) -> Option<Row>;

    /// Output column names, fixed at construction.
    fn columns(&self) -> &[String];

    /// Restores the un-iterated state. Rewound scans pay their simulated
    /// access latency again.
    fn rewind(&mut self);

    /// Node label for the diagnostic graph rendering.
    fn label(&self) -> String;

    fn children(&self) -> Vec<&dyn Operator>;
}

impl<'a> dyn Operator + 'a {
    /// Dot rendering of the subtree rooted at this operator.
    pub fn explain(&self) -> String {
        crate::explain::operator_dot(self)
    }
}

/// Leaf: one row per tuple in storage order, columns named after the
/// relation's schema attributes.
pub struct Scan {
    relation_name: String,
    header: Rc<Vec<String>>,
    scan: TupleScan,
}

impl Scan {
    pub fn new(relation: &Relation) -> Scan {
        Scan {
            relation_name: relation.name().to_string(),
            header: Rc::new(relation.schema().column_names()),
            scan: relation.scan(),
        }
    }
}

impl Operator for Scan {
    fn next_row(&mut self) -> Option<Row> {
        self.scan
            .next()
            .map(|tuple| Row::new(self.header.clone(), tuple.values))
    }

    fn columns(&self) -> &[String] {
        &self.header
    }

    fn rewind(&mut self) {
        self.scan.rewind();
    }

    fn label(&self) -> String {
        format!("Scan({})", self.relation_name)
    }

    fn children(&self) -> Vec<&dyn Operator> {
        Vec::new()
    }
}

/// Leaf: the index bucket for one attribute value. Construction fails
/// when the relation has no index on the attribute; a value with no
/// matches is an empty result, not an error.
pub struct IndexScan {
    relation_name: String,
    attribute: String,
    value: TupleValue,
    header: Rc<Vec<String>>,
    scan: IndexBucketScan,
}

impl IndexScan {
    pub fn new(
        relation: &Relation,
        attribute: &str,
        value: TupleValue,
    ) -> Result<IndexScan, SchemaError> {
        let scan = relation.index_scan(attribute, &value)?;
        Ok(IndexScan {
            relation_name: relation.name().to_string(),
            attribute: attribute.to_string(),
            value,
            header: Rc::new(relation.schema().column_names()),
            scan,
        })
    }
}

impl Operator for IndexScan {
    fn next_row(&mut self) -> Option<Row> {
        self.scan
            .next()
            .map(|tuple| Row::new(self.header.clone(), tuple.values))
    }

    fn columns(&self) -> &[String] {
        &self.header
    }

    fn rewind(&mut self) {
        self.scan.rewind();
    }

    fn label(&self) -> String {
        format!(
            "IndexScan({}, {} = {})",
            self.relation_name, self.attribute, self.value
        )
    }

    fn children(&self) -> Vec<&dyn Operator> {
        Vec::new()
    }
}

/// Emits the child rows satisfying the predicate.
pub struct Select {
    predicate: Predicate,
    compiled: CompiledPredicate,
    child: Box<dyn Operator>,
}

impl Select {
    pub fn new(predicate: Predicate, child: Box<dyn Operator>) -> Result<Select, EvaluationError> {
        let compiled = predicate.compile(child.columns())?;
        Ok(Select {
            predicate,
            compiled,
            child,
        })
    }
}

impl Operator for Select {
    fn next_row(&mut self) -> Option<Row> {
        while let Some(row) = self.child.next_row() {
            if self.compiled.evaluate(&row) {
                return Some(row);
            }
        }
        None
    }

    fn columns(&self) -> &[String] {
        self.child.columns()
    }

    fn rewind(&mut self) {
        self.child.rewind();
    }

    fn label(&self) -> String {
        format!("Select({})", self.predicate)
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }
}

/// Order-exploiting select: starts emitting at the first row satisfying
/// the predicate and stops permanently at the first non-satisfying row
/// after that.
///
/// Precondition (not enforced): the input must be sorted so that the
/// predicate holds on exactly one contiguous run, as with an equality
/// predicate over input sorted on that column. Non-monotonic input or a
/// predicate with several true-runs silently yields an incomplete result.
pub struct OrderedSelect {
    predicate: Predicate,
    compiled: CompiledPredicate,
    child: Box<dyn Operator>,
    found: bool,
    done: bool,
}

impl OrderedSelect {
    pub fn new(
        predicate: Predicate,
        child: Box<dyn Operator>,
    ) -> Result<OrderedSelect, EvaluationError> {
        let compiled = predicate.compile(child.columns())?;
        Ok(OrderedSelect {
            predicate,
            compiled,
            child,
            found: false,
            done: false,
        })
    }
}

impl Operator for OrderedSelect {
    fn next_row(&mut self) -> Option<Row> {
        if self.done {
            return None;
        }
        while let Some(row) = self.child.next_row() {
            if self.compiled.evaluate(&row) {
                self.found = true;
                return Some(row);
            }
            if self.found {
                self.done = true;
                return None;
            }
        }
        None
    }

    fn columns(&self) -> &[String] {
        self.child.columns()
    }

    fn rewind(&mut self) {
        self.child.rewind();
        self.found = false;
        self.done = false;
    }

    fn label(&self) -> String {
        format!("OrderedSelect({})", self.predicate)
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }
}

/// Emits only the requested columns, in the requested order. Bag
/// semantics: row multiplicity is untouched.
pub struct Project {
    header: Rc<Vec<String>>,
    positions: Vec<usize>,
    child: Box<dyn Operator>,
}

impl Project {
    pub fn new(columns: Vec<String>, child: Box<dyn Operator>) -> Result<Project, EvaluationError> {
        let positions = columns
            .iter()
            .map(|column| resolve_column(child.columns(), column))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Project {
            header: Rc::new(columns),
            positions,
            child,
        })
    }
}

impl Operator for Project {
    fn next_row(&mut self) -> Option<Row> {
        self.child.next_row().map(|row| {
            let values = self
                .positions
                .iter()
                .map(|&position| row.value_at(position).clone())
                .collect();
            Row::new(self.header.clone(), values)
        })
    }

    fn columns(&self) -> &[String] {
        &self.header
    }

    fn rewind(&mut self) {
        self.child.rewind();
    }

    fn label(&self) -> String {
        format!("Project([{}])", self.header.iter().join(", "))
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }
}

/// Nested-loop join: for every left row the entire right child is re-run
/// (via `rewind`), so the right side's access cost is paid once per left
/// row. O(|left| * |right|) with the full cost model intact.
pub struct NestedLoopJoin {
    predicate: Predicate,
    compiled: CompiledPredicate,
    layout: MergeLayout,
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    current_left: Option<Row>,
}

impl NestedLoopJoin {
    pub fn new(
        predicate: Predicate,
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
    ) -> Result<NestedLoopJoin, EvaluationError> {
        let layout = MergeLayout::plan(left.columns(), right.columns());
        let compiled = predicate.compile(layout.columns())?;
        Ok(NestedLoopJoin {
            predicate,
            compiled,
            layout,
            left,
            right,
            current_left: None,
        })
    }
}

impl Operator for NestedLoopJoin {
    fn next_row(&mut self) -> Option<Row> {
        loop {
            let left_row = match self.current_left.take() {
                Some(row) => row,
                None => {
                    let row = self.left.next_row()?;
                    self.right.rewind();
                    row
                }
            };
            while let Some(right_row) = self.right.next_row() {
                let merged = self.layout.merge(&left_row, &right_row);
                if self.compiled.evaluate(&merged) {
                    self.current_left = Some(left_row);
                    return Some(merged);
                }
            }
        }
    }

    fn columns(&self) -> &[String] {
        self.layout.columns()
    }

    fn rewind(&mut self) {
        self.left.rewind();
        self.right.rewind();
        self.current_left = None;
    }

    fn label(&self) -> String {
        format!("Join({})", self.predicate)
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }
}

/// Equi-join on one column pair. Build phase materializes the left child
/// into a multimap (collision buckets keep insertion order), probe phase
/// streams the right child and emits one merged row per bucket match.
/// Memory cost O(|left|).
pub struct HashJoin {
    left_column: String,
    right_column: String,
    left_key: usize,
    right_key: usize,
    layout: MergeLayout,
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    table: Option<HashMap<TupleValue, Vec<Row>, ahash::RandomState>>,
    probe: Option<(Row, usize)>,
}

impl HashJoin {
    pub fn new(
        on: (&str, &str),
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
    ) -> Result<HashJoin, EvaluationError> {
        let left_key = resolve_column(left.columns(), on.0)?;
        let right_key = resolve_column(right.columns(), on.1)?;
        let layout = MergeLayout::plan(left.columns(), right.columns());
        Ok(HashJoin {
            left_column: on.0.to_string(),
            right_column: on.1.to_string(),
            left_key,
            right_key,
            layout,
            left,
            right,
            table: None,
            probe: None,
        })
    }
}

impl Operator for HashJoin {
    fn next_row(&mut self) -> Option<Row> {
        if self.table.is_none() {
            let mut table: HashMap<TupleValue, Vec<Row>, ahash::RandomState> = HashMap::default();
            while let Some(row) = self.left.next_row() {
                let key = row.value_at(self.left_key).clone();
                table.entry(key).or_default().push(row);
            }
            self.table = Some(table);
        }
        loop {
            match self.probe.as_mut() {
                Some((right_row, position)) => {
                    let bucket = match &self.table {
                        Some(table) => table.get(right_row.value_at(self.right_key)),
                        None => None,
                    };
                    if let Some(bucket) = bucket {
                        if *position < bucket.len() {
                            let merged = self.layout.merge(&bucket[*position], right_row);
                            *position += 1;
                            return Some(merged);
                        }
                    }
                    self.probe = None;
                }
                None => match self.right.next_row() {
                    Some(row) => self.probe = Some((row, 0)),
                    None => return None,
                },
            }
        }
    }

    fn columns(&self) -> &[String] {
        self.layout.columns()
    }

    fn rewind(&mut self) {
        self.left.rewind();
        self.right.rewind();
        self.table = None;
        self.probe = None;
    }

    fn label(&self) -> String {
        format!("HashJoin({} = {})", self.left_column, self.right_column)
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }
}

/// Relabels the output columns; cardinality and values are untouched.
pub struct Rename {
    table_name: String,
    renames: Vec<(String, String)>,
    header: Rc<Vec<String>>,
    child: Box<dyn Operator>,
}

impl Rename {
    pub fn new(
        table_name: &str,
        renames: Vec<(String, String)>,
        child: Box<dyn Operator>,
    ) -> Result<Rename, EvaluationError> {
        let mut header = child.columns().to_vec();
        for (from, to) in &renames {
            let position = resolve_column(child.columns(), from)?;
            header[position] = to.clone();
        }
        Ok(Rename {
            table_name: table_name.to_string(),
            renames,
            header: Rc::new(header),
            child,
        })
    }
}

impl Operator for Rename {
    fn next_row(&mut self) -> Option<Row> {
        self.child
            .next_row()
            .map(|row| Row::new(self.header.clone(), row.into_values()))
    }

    fn columns(&self) -> &[String] {
        &self.header
    }

    fn rewind(&mut self) {
        self.child.rewind();
    }

    fn label(&self) -> String {
        format!(
            "Rename({}, [{}])",
            self.table_name,
            self.renames
                .iter()
                .map(|(from, to)| format!("{} -> {}", from, to))
                .join(", ")
        )
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }
}

/// Blocking sort: consumes the entire input, stable-sorts ascending by
/// the sort column's natural ordering, then emits.
pub struct OrderBy {
    column: String,
    key: usize,
    child: Box<dyn Operator>,
    sorted: Option<Vec<Row>>,
    position: usize,
}

impl OrderBy {
    pub fn new(column: &str, child: Box<dyn Operator>) -> Result<OrderBy, EvaluationError> {
        let key = resolve_column(child.columns(), column)?;
        Ok(OrderBy {
            column: column.to_string(),
            key,
            child,
            sorted: None,
            position: 0,
        })
    }
}

impl Operator for OrderBy {
    fn next_row(&mut self) -> Option<Row> {
        if self.sorted.is_none() {
            let mut rows = Vec::new();
            while let Some(row) = self.child.next_row() {
                rows.push(row);
            }
            let key = self.key;
            rows.sort_by(|a, b| a.value_at(key).cmp(b.value_at(key)));
            self.sorted = Some(rows);
        }
        let row = self.sorted.as_ref()?.get(self.position)?.clone();
        self.position += 1;
        Some(row)
    }

    fn columns(&self) -> &[String] {
        self.child.columns()
    }

    fn rewind(&mut self) {
        self.child.rewind();
        self.sorted = None;
        self.position = 0;
    }

    fn label(&self) -> String {
        format!("OrderBy({})", self.column)
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.child.as_ref()]
    }
}
