use crate::catalog::DataType;
use crate::error::{QuillIndexError, QuillIndexResult};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// An indexed attribute value. Values of different variants never compare
/// equal and ordering them is a type error.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Int64(i64),
    Float64(f64),
    Varchar(String),
    Date(NaiveDate),
}

static INTEGER_LITERAL: OnceLock<Regex> = OnceLock::new();
static DECIMAL_LITERAL: OnceLock<Regex> = OnceLock::new();
static DATE_LITERAL: OnceLock<Regex> = OnceLock::new();

/// `pattern` is always one of the constant literal patterns below, so
/// compiling it cannot fail.
fn literal_pattern(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("literal pattern is a valid regex"))
}

impl ScalarValue {
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Varchar(_) => DataType::Varchar,
            ScalarValue::Date(_) => DataType::Date,
        }
    }

    /// Classify a textual literal: integer, then decimal, then ISO date,
    /// otherwise text. Never fails; anything unparseable stays text.
    pub fn from_literal(literal: &str) -> Self {
        if literal_pattern(&INTEGER_LITERAL, r"^-?[0-9]+$").is_match(literal) {
            if let Ok(v) = literal.parse::<i64>() {
                return ScalarValue::Int64(v);
            }
        } else if literal_pattern(&DECIMAL_LITERAL, r"^-?[0-9]+\.[0-9]+$").is_match(literal) {
            if let Ok(v) = literal.parse::<f64>() {
                return ScalarValue::Float64(v);
            }
        } else if literal_pattern(&DATE_LITERAL, r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").is_match(literal)
        {
            if let Ok(v) = NaiveDate::parse_from_str(literal, "%Y-%m-%d") {
                return ScalarValue::Date(v);
            }
        }
        ScalarValue::Varchar(literal.to_string())
    }

    /// Total order between two values of the same type.
    pub fn try_cmp(&self, other: &Self) -> QuillIndexResult<Ordering> {
        use ScalarValue::*;
        match (self, other) {
            (Int64(a), Int64(b)) => Ok(a.cmp(b)),
            (Float64(a), Float64(b)) => Ok(a.total_cmp(b)),
            (Varchar(a), Varchar(b)) => Ok(a.cmp(b)),
            (Date(a), Date(b)) => Ok(a.cmp(b)),
            _ => Err(QuillIndexError::TypeMismatch(
                self.data_type(),
                other.data_type(),
            )),
        }
    }

    pub fn check_type(&self, expected: DataType) -> QuillIndexResult<()> {
        let actual = self.data_type();
        if actual != expected {
            return Err(QuillIndexError::TypeMismatch(actual, expected));
        }
        Ok(())
    }

    /// Deterministic, type-aware hash used for extendible-hash addressing.
    /// Only the low-order bits are consumed, so integers hash to themselves.
    pub fn hash_code(&self) -> u64 {
        match self {
            ScalarValue::Int64(v) => *v as u64,
            ScalarValue::Float64(v) => {
                let bits = v.to_bits();
                bits ^ (bits >> 32)
            }
            ScalarValue::Varchar(v) => v
                .bytes()
                .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(b as u64)),
            ScalarValue::Date(v) => v.num_days_from_ce() as i64 as u64,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        use ScalarValue::*;
        match (self, other) {
            (Int64(v1), Int64(v2)) => v1 == v2,
            (Float64(v1), Float64(v2)) => v1.to_bits() == v2.to_bits(),
            (Varchar(v1), Varchar(v2)) => v1 == v2,
            (Date(v1), Date(v2)) => v1 == v2,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl std::hash::Hash for ScalarValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ScalarValue::Int64(v) => v.hash(state),
            ScalarValue::Float64(v) => v.to_bits().hash(state),
            ScalarValue::Varchar(v) => v.hash(state),
            ScalarValue::Date(v) => v.hash(state),
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Varchar(v) => write!(f, "{v}"),
            ScalarValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

macro_rules! impl_from_for_scalar {
    ($ty:ty, $scalar:tt) => {
        impl From<$ty> for ScalarValue {
            fn from(value: $ty) -> Self {
                ScalarValue::$scalar(value.into())
            }
        }
    };
}

impl_from_for_scalar!(i32, Int64);
impl_from_for_scalar!(i64, Int64);
impl_from_for_scalar!(u32, Int64);
impl_from_for_scalar!(f64, Float64);
impl_from_for_scalar!(String, Varchar);
impl_from_for_scalar!(&str, Varchar);
impl_from_for_scalar!(NaiveDate, Date);
