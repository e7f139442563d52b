use super::operator::Operator;
use super::row::Row;

/// Root handle over a physical operator tree. Carries no state beyond the
/// root; `execute` consumes the plan because operator trees are
/// single-pass, so a re-run needs a freshly built tree.
pub struct QueryPlan {
    root: Box<dyn Operator>,
}

impl QueryPlan {
    pub fn new(root: Box<dyn Operator>) -> QueryPlan {
        QueryPlan { root }
    }

    pub fn columns(&self) -> &[String] {
        self.root.columns()
    }

    /// Drains the root to completion and returns the result rows.
    pub fn execute(mut self) -> Vec<Row> {
        let mut rows = Vec::new();
        while let Some(row) = self.root.next_row() {
            rows.push(row);
        }
        rows
    }

    /// Dot rendering of the operator tree, for inspection.
    pub fn to_dot(&self) -> String {
        self.root.explain()
    }
}

#[cfg(test)]
mod test {
    use super::super::expression::Predicate;
    use super::super::operator::mock::MockSource;
    use super::super::operator::Select;
    use super::*;
    use crate::types::TupleValue;

    fn mock_years(years: &[i64]) -> MockSource {
        MockSource::new(
            &["year"],
            years.iter().map(|y| vec![TupleValue::Int(*y)]).collect(),
        )
    }

    #[test]
    fn test_execute_drains_the_tree() {
        let select = Select::new(
            Predicate::column_equals_value("year", TupleValue::Int(1970)),
            Box::new(mock_years(&[1970, 1980, 1970])),
        )
        .unwrap();
        let plan = QueryPlan::new(Box::new(select));
        assert_eq!(plan.columns(), &["year"]);

        let rows = plan.execute();
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(row.get("year"), Some(&TupleValue::Int(1970)));
        }
    }

    #[test]
    fn test_execute_empty_input() {
        let plan = QueryPlan::new(Box::new(mock_years(&[])));
        assert!(plan.execute().is_empty());
    }

    #[test]
    fn test_to_dot_lists_nodes_and_edges() {
        let select = Select::new(
            Predicate::column_equals_value("year", TupleValue::Int(1970)),
            Box::new(mock_years(&[1970])),
        )
        .unwrap();
        let plan = QueryPlan::new(Box::new(select));
        let dot = plan.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("Select(year = 1970)"));
        assert!(dot.contains("Mock"));
        assert!(dot.contains("->"));
    }
}
