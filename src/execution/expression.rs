use std::error::Error;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

use super::row::Row;
use crate::types::TupleValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationError::UnknownColumn { column, available } => write!(
                f,
                "column {} is not produced by the input (available: {})",
                column,
                available.iter().join(", ")
            ),
        }
    }
}

impl Error for EvaluationError {}

pub(crate) fn resolve_column(columns: &[String], column: &str) -> Result<usize, EvaluationError> {
    columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| EvaluationError::UnknownColumn {
            column: column.to_string(),
            available: columns.to_vec(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonOp::Eq => write!(f, "="),
            ComparisonOp::NotEq => write!(f, "<>"),
            ComparisonOp::LessThan => write!(f, "<"),
            ComparisonOp::LessThanOrEq => write!(f, "<="),
            ComparisonOp::GreaterThan => write!(f, ">"),
            ComparisonOp::GreaterThanOrEq => write!(f, ">="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpression {
    Column(String),
    Literal(TupleValue),
}

impl ScalarExpression {
    pub fn column(name: &str) -> ScalarExpression {
        ScalarExpression::Column(name.to_string())
    }

    pub fn literal(value: TupleValue) -> ScalarExpression {
        ScalarExpression::Literal(value)
    }
}

impl Display for ScalarExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarExpression::Column(name) => write!(f, "{}", name),
            ScalarExpression::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// Name-based predicate as written by the caller. Compiled against the
/// producing operator's columns when the tree is built, so an undefined
/// column is rejected at construction, not mid-iteration.
// No Or/Not for now, the demo queries don't need them.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Box<Predicate>, Box<Predicate>),
    Comparison(ComparisonOp, ScalarExpression, ScalarExpression),
}

impl Predicate {
    pub fn compare(op: ComparisonOp, left: ScalarExpression, right: ScalarExpression) -> Predicate {
        Predicate::Comparison(op, left, right)
    }

    pub fn and(left: Predicate, right: Predicate) -> Predicate {
        Predicate::And(Box::new(left), Box::new(right))
    }

    /// `column = literal`
    pub fn column_equals_value(column: &str, value: TupleValue) -> Predicate {
        Predicate::Comparison(
            ComparisonOp::Eq,
            ScalarExpression::column(column),
            ScalarExpression::literal(value),
        )
    }

    /// `left_column = right_column`
    pub fn columns_equal(left: &str, right: &str) -> Predicate {
        Predicate::Comparison(
            ComparisonOp::Eq,
            ScalarExpression::column(left),
            ScalarExpression::column(right),
        )
    }

    pub(crate) fn compile(&self, columns: &[String]) -> Result<CompiledPredicate, EvaluationError> {
        match self {
            Predicate::And(left, right) => Ok(CompiledPredicate::And(
                Box::new(left.compile(columns)?),
                Box::new(right.compile(columns)?),
            )),
            Predicate::Comparison(op, left, right) => Ok(CompiledPredicate::Comparison(
                *op,
                compile_scalar(left, columns)?,
                compile_scalar(right, columns)?,
            )),
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::And(left, right) => write!(f, "{} AND {}", left, right),
            Predicate::Comparison(op, left, right) => write!(f, "{} {} {}", left, op, right),
        }
    }
}

fn compile_scalar(
    expression: &ScalarExpression,
    columns: &[String],
) -> Result<CompiledScalar, EvaluationError> {
    match expression {
        ScalarExpression::Column(name) => Ok(CompiledScalar::Column(resolve_column(columns, name)?)),
        ScalarExpression::Literal(value) => Ok(CompiledScalar::Literal(value.clone())),
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CompiledScalar {
    Column(usize),
    Literal(TupleValue),
}

impl CompiledScalar {
    fn resolve<'a>(&'a self, row: &'a Row) -> &'a TupleValue {
        match self {
            CompiledScalar::Column(position) => row.value_at(*position),
            CompiledScalar::Literal(value) => value,
        }
    }
}

/// Position-resolved predicate; evaluation cannot fail.
#[derive(Debug, Clone)]
pub(crate) enum CompiledPredicate {
    And(Box<CompiledPredicate>, Box<CompiledPredicate>),
    Comparison(ComparisonOp, CompiledScalar, CompiledScalar),
}

impl CompiledPredicate {
    pub(crate) fn evaluate(&self, row: &Row) -> bool {
        match self {
            CompiledPredicate::And(left, right) => left.evaluate(row) && right.evaluate(row),
            CompiledPredicate::Comparison(op, left, right) => {
                // Values of different domains never satisfy a comparison
                match left.resolve(row).same_domain_cmp(right.resolve(row)) {
                    Some(ordering) => match op {
                        ComparisonOp::Eq => ordering.is_eq(),
                        ComparisonOp::NotEq => ordering.is_ne(),
                        ComparisonOp::LessThan => ordering.is_lt(),
                        ComparisonOp::LessThanOrEq => ordering.is_le(),
                        ComparisonOp::GreaterThan => ordering.is_gt(),
                        ComparisonOp::GreaterThanOrEq => ordering.is_ge(),
                    },
                    None => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn test_row() -> Row {
        Row::new(
            Rc::new(vec!["title".to_string(), "year".to_string()]),
            vec![
                TupleValue::Text("abbey road".to_string()),
                TupleValue::Int(1969),
            ],
        )
    }

    fn columns() -> Vec<String> {
        vec!["title".to_string(), "year".to_string()]
    }

    #[test]
    fn test_compile_rejects_unknown_column() {
        let predicate = Predicate::column_equals_value("genre", TupleValue::Int(1));
        assert_eq!(
            predicate.compile(&columns()).err(),
            Some(EvaluationError::UnknownColumn {
                column: "genre".to_string(),
                available: columns(),
            })
        );
    }

    #[test]
    fn test_equality_comparison() {
        let hit = Predicate::column_equals_value("year", TupleValue::Int(1969))
            .compile(&columns())
            .unwrap();
        let miss = Predicate::column_equals_value("year", TupleValue::Int(1970))
            .compile(&columns())
            .unwrap();
        assert!(hit.evaluate(&test_row()));
        assert!(!miss.evaluate(&test_row()));
    }

    #[test]
    fn test_ordering_comparisons() {
        let row = test_row();
        let lt = Predicate::compare(
            ComparisonOp::LessThan,
            ScalarExpression::column("year"),
            ScalarExpression::literal(TupleValue::Int(1970)),
        );
        let ge = Predicate::compare(
            ComparisonOp::GreaterThanOrEq,
            ScalarExpression::column("year"),
            ScalarExpression::literal(TupleValue::Int(1970)),
        );
        assert!(lt.compile(&columns()).unwrap().evaluate(&row));
        assert!(!ge.compile(&columns()).unwrap().evaluate(&row));
    }

    #[test]
    fn test_and_conjunction() {
        let predicate = Predicate::and(
            Predicate::column_equals_value("year", TupleValue::Int(1969)),
            Predicate::column_equals_value("title", TupleValue::Text("abbey road".to_string())),
        );
        assert!(predicate.compile(&columns()).unwrap().evaluate(&test_row()));

        let conflicting = Predicate::and(
            Predicate::column_equals_value("year", TupleValue::Int(1969)),
            Predicate::column_equals_value("title", TupleValue::Text("let it be".to_string())),
        );
        assert!(!conflicting.compile(&columns()).unwrap().evaluate(&test_row()));
    }

    #[test]
    fn test_cross_domain_comparison_is_false() {
        let predicate = Predicate::column_equals_value("year", TupleValue::Text("1969".to_string()))
            .compile(&columns())
            .unwrap();
        assert!(!predicate.evaluate(&test_row()));
    }

    #[test]
    fn test_predicate_display() {
        assert_eq!(
            Predicate::column_equals_value("year", TupleValue::Int(1970)).to_string(),
            "year = 1970"
        );
        assert_eq!(
            Predicate::columns_equal("artist_id", "id").to_string(),
            "artist_id = id"
        );
    }
}
