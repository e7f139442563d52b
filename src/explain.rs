use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::Graph;

use crate::algebra::LogicalNode;
use crate::execution::operator::Operator;

/*
    Diagnostic rendering of query trees as dot digraphs: one node per tree
    node, one edge per parent -> child link. Output is for inspection only
    and is never parsed back.
 */

pub fn operator_dot(root: &dyn Operator) -> String {
    let mut graph = Graph::<String, ()>::new();
    add_operator(&mut graph, root);
    render(&graph)
}

fn add_operator(graph: &mut Graph<String, ()>, operator: &dyn Operator) -> NodeIndex {
    let node = graph.add_node(operator.label());
    for child in operator.children() {
        let child_node = add_operator(graph, child);
        graph.add_edge(node, child_node, ());
    }
    node
}

pub fn algebra_dot(root: &LogicalNode) -> String {
    let mut graph = Graph::<String, ()>::new();
    add_logical(&mut graph, root);
    render(&graph)
}

fn add_logical(graph: &mut Graph<String, ()>, node: &LogicalNode) -> NodeIndex {
    let index = graph.add_node(node.label());
    for child in node.children() {
        let child_index = add_logical(graph, child);
        graph.add_edge(index, child_index, ());
    }
    index
}

fn render(graph: &Graph<String, ()>) -> String {
    format!("{:?}", Dot::with_config(graph, &[Config::EdgeNoLabel]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::LogicalNode;

    #[test]
    fn test_algebra_dot_contains_all_nodes() {
        let tree = LogicalNode::Select {
            predicate: crate::execution::expression::Predicate::column_equals_value(
                "year",
                crate::types::TupleValue::Int(1970),
            ),
            child: Box::new(LogicalNode::Scan {
                table: "album".to_string(),
            }),
        };
        let dot = algebra_dot(&tree);
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("Select(year = 1970)"));
        assert!(dot.contains("Scan(album)"));
        assert!(dot.contains("->"));
    }
}
