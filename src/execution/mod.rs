/*
    Volcano-style pull-based execution: every physical operator produces
    rows one at a time on demand from its parent. Trees are built bottom-up
    with exclusive child ownership and are single-pass; re-running a query
    means building a fresh tree.
 */

pub mod expression;
pub mod operator;
pub mod plan;
pub mod row;
