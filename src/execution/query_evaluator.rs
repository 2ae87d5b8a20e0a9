use std::collections::BTreeSet;

use log::{debug, info};

use crate::catalog::IndexResolver;
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::expression::{Operator, QueryNode};
use crate::storage::page::RowId;

/// Evaluates predicate trees against the indexes a resolver hands out.
/// Results are ascending and free of duplicates.
#[derive(derive_new::new)]
pub struct QueryEvaluator<'a> {
    resolver: &'a dyn IndexResolver,
}

impl QueryEvaluator<'_> {
    /// An absent tree selects nothing. NOT complements within `[0, max_row_id]`.
    pub fn evaluate_query(
        &self,
        node: Option<&QueryNode>,
        max_row_id: RowId,
    ) -> QuillIndexResult<Vec<RowId>> {
        match node {
            Some(node) => self.evaluate_node(node, max_row_id),
            None => Ok(vec![]),
        }
    }

    fn evaluate_node(&self, node: &QueryNode, max_row_id: RowId) -> QuillIndexResult<Vec<RowId>> {
        match node.operator {
            Operator::Equals | Operator::Lt | Operator::Gt | Operator::Range => {
                self.evaluate_predicate(node)
            }
            Operator::And => {
                let (left, right) = self.evaluate_children(node, max_row_id)?;
                let right: BTreeSet<RowId> = right.into_iter().collect();
                Ok(left
                    .into_iter()
                    .filter(|row_id| right.contains(row_id))
                    .collect())
            }
            Operator::Or => {
                let (left, right) = self.evaluate_children(node, max_row_id)?;
                Ok(left
                    .into_iter()
                    .chain(right)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect())
            }
            Operator::Not => {
                let child = Self::child(node, node.left.as_deref(), "operand")?;
                let matched = self.evaluate_node(child, max_row_id)?;
                let mut present = vec![false; max_row_id as usize + 1];
                for row_id in matched {
                    if let Some(slot) = present.get_mut(row_id as usize) {
                        *slot = true;
                    }
                }
                Ok((0..=max_row_id)
                    .filter(|row_id| !present[*row_id as usize])
                    .collect())
            }
        }
    }

    fn evaluate_predicate(&self, node: &QueryNode) -> QuillIndexResult<Vec<RowId>> {
        info!("evaluating predicate {}", node);
        let index = self
            .resolver
            .get_index(&node.attribute, node.operator)
            .ok_or_else(|| QuillIndexError::IndexNotFound(node.attribute.clone()))?;
        info!("using {} on {}", index.pretty_name(), index.attribute());

        let row_ids = index.evaluate(node)?;
        debug!("predicate {} matched {} rows", node, row_ids.len());
        Ok(row_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    /// Children come back sorted and deduplicated.
    fn evaluate_children(
        &self,
        node: &QueryNode,
        max_row_id: RowId,
    ) -> QuillIndexResult<(Vec<RowId>, Vec<RowId>)> {
        let left = Self::child(node, node.left.as_deref(), "left operand")?;
        let right = Self::child(node, node.right.as_deref(), "right operand")?;
        Ok((
            self.evaluate_node(left, max_row_id)?,
            self.evaluate_node(right, max_row_id)?,
        ))
    }

    fn child<'n>(
        node: &QueryNode,
        child: Option<&'n QueryNode>,
        role: &str,
    ) -> QuillIndexResult<&'n QueryNode> {
        child.ok_or_else(|| {
            QuillIndexError::InvalidPredicate(format!("{} is missing its {}", node.operator, role))
        })
    }
}
