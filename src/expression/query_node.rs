use std::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumIter, EnumString};

use crate::utils::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Operator {
    Equals,
    Lt,
    Gt,
    Range,
    And,
    Or,
    Not,
}

impl Operator {
    /// Comparison operators are answered by a single index.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Equals | Operator::Lt | Operator::Gt | Operator::Range
        )
    }
}

/// One node of a predicate tree. Comparison leaves carry textual literals in
/// `value` (and `second_value` for RANGE); connectives carry children. NOT
/// negates `left`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNode {
    pub attribute: String,
    pub operator: Operator,
    pub value: Option<String>,
    pub second_value: Option<String>,
    pub left: Option<Box<QueryNode>>,
    pub right: Option<Box<QueryNode>>,
}

impl QueryNode {
    fn leaf(attribute: &str, operator: Operator, value: &str, second_value: Option<&str>) -> Self {
        Self {
            attribute: attribute.to_string(),
            operator,
            value: Some(value.to_string()),
            second_value: second_value.map(str::to_string),
            left: None,
            right: None,
        }
    }

    fn connective(operator: Operator, left: QueryNode, right: Option<QueryNode>) -> Self {
        Self {
            attribute: String::new(),
            operator,
            value: None,
            second_value: None,
            left: Some(Box::new(left)),
            right: right.map(Box::new),
        }
    }

    pub fn equals(attribute: &str, value: &str) -> Self {
        Self::leaf(attribute, Operator::Equals, value, None)
    }

    pub fn less_than(attribute: &str, value: &str) -> Self {
        Self::leaf(attribute, Operator::Lt, value, None)
    }

    pub fn greater_than(attribute: &str, value: &str) -> Self {
        Self::leaf(attribute, Operator::Gt, value, None)
    }

    /// Both bounds are exclusive.
    pub fn range(attribute: &str, low: &str, high: &str) -> Self {
        Self::leaf(attribute, Operator::Range, low, Some(high))
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        Self::connective(Operator::And, left, Some(right))
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        Self::connective(Operator::Or, left, Some(right))
    }

    pub fn not(child: QueryNode) -> Self {
        Self::connective(Operator::Not, child, None)
    }

    pub fn is_predicate(&self) -> bool {
        self.operator.is_comparison()
    }

    /// Literal in `value`, classified into a typed key.
    pub fn parsed_value(&self) -> Option<ScalarValue> {
        self.value.as_deref().map(ScalarValue::from_literal)
    }

    pub fn parsed_second_value(&self) -> Option<ScalarValue> {
        self.second_value.as_deref().map(ScalarValue::from_literal)
    }
}

impl Display for QueryNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let child = |node: &Option<Box<QueryNode>>| {
            node.as_ref()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string())
        };
        match self.operator {
            Operator::Range => write!(
                f,
                "{} RANGE ({}, {})",
                self.attribute,
                self.value.as_deref().unwrap_or("?"),
                self.second_value.as_deref().unwrap_or("?")
            ),
            Operator::Equals | Operator::Lt | Operator::Gt => write!(
                f,
                "{} {} {}",
                self.attribute,
                self.operator,
                self.value.as_deref().unwrap_or("?")
            ),
            Operator::And | Operator::Or => write!(
                f,
                "({} {} {})",
                child(&self.left),
                self.operator,
                child(&self.right)
            ),
            Operator::Not => write!(f, "NOT {}", child(&self.left)),
        }
    }
}
