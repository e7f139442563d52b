use itertools::Itertools;

use crate::execution::expression::Predicate;
use crate::explain;

/// Logical relational-algebra node, the shape a query frontend hands
/// over. The engine never executes these directly and includes no
/// optimizer; callers pick a physical operator per logical node by hand.
#[derive(Debug, Clone)]
pub enum LogicalNode {
    Scan {
        table: String,
    },
    Select {
        predicate: Predicate,
        child: Box<LogicalNode>,
    },
    Project {
        columns: Vec<String>,
        child: Box<LogicalNode>,
    },
    Join {
        predicate: Predicate,
        left: Box<LogicalNode>,
        right: Box<LogicalNode>,
    },
    Rename {
        table: String,
        columns: Vec<(String, String)>,
        child: Box<LogicalNode>,
    },
    GroupBy {
        columns: Vec<String>,
        child: Box<LogicalNode>,
    },
    Aggregate {
        columns: Vec<String>,
        child: Box<LogicalNode>,
    },
    OrderBy {
        columns: Vec<String>,
        child: Box<LogicalNode>,
    },
    Limit {
        limit: usize,
        child: Box<LogicalNode>,
    },
    Union {
        left: Box<LogicalNode>,
        right: Box<LogicalNode>,
    },
    Difference {
        left: Box<LogicalNode>,
        right: Box<LogicalNode>,
    },
    Intersect {
        left: Box<LogicalNode>,
        right: Box<LogicalNode>,
    },
}

impl LogicalNode {
    pub fn label(&self) -> String {
        match self {
            LogicalNode::Scan { table } => format!("Scan({})", table),
            LogicalNode::Select { predicate, .. } => format!("Select({})", predicate),
            LogicalNode::Project { columns, .. } => {
                format!("Project([{}])", columns.iter().join(", "))
            }
            LogicalNode::Join { predicate, .. } => format!("Join({})", predicate),
            LogicalNode::Rename { table, .. } => format!("Rename({})", table),
            LogicalNode::GroupBy { columns, .. } => {
                format!("GroupBy([{}])", columns.iter().join(", "))
            }
            LogicalNode::Aggregate { columns, .. } => {
                format!("Aggregate([{}])", columns.iter().join(", "))
            }
            LogicalNode::OrderBy { columns, .. } => {
                format!("OrderBy([{}])", columns.iter().join(", "))
            }
            LogicalNode::Limit { limit, .. } => format!("Limit({})", limit),
            LogicalNode::Union { .. } => "Union".to_string(),
            LogicalNode::Difference { .. } => "Difference".to_string(),
            LogicalNode::Intersect { .. } => "Intersect".to_string(),
        }
    }

    pub fn children(&self) -> Vec<&LogicalNode> {
        match self {
            LogicalNode::Scan { .. } => Vec::new(),
            LogicalNode::Select { child, .. }
            | LogicalNode::Project { child, .. }
            | LogicalNode::Rename { child, .. }
            | LogicalNode::GroupBy { child, .. }
            | LogicalNode::Aggregate { child, .. }
            | LogicalNode::OrderBy { child, .. }
            | LogicalNode::Limit { child, .. } => vec![child],
            LogicalNode::Join { left, right, .. }
            | LogicalNode::Union { left, right }
            | LogicalNode::Difference { left, right }
            | LogicalNode::Intersect { left, right } => vec![left, right],
        }
    }

    /// Indented one-line-per-node rendering of the tree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        out.push_str(&" ".repeat(indent));
        out.push_str(&self.label());
        out.push('\n');
        for child in self.children() {
            child.dump_into(out, indent + 2);
        }
    }

    pub fn to_dot(&self) -> String {
        explain::algebra_dot(self)
    }
}
