mod query_node;

pub use query_node::{Operator, QueryNode};
