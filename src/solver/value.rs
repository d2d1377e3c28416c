//! The dynamically-tagged value type stored in variable domains.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing sums and products of mixed numeric values.
pub const EPSILON: f64 = 1e-9;

/// A single domain element.
///
/// Equality is structural: values with different tags never compare equal
/// under `==`, and `Real` is compared through normalised bits so that the
/// type can implement `Eq` and `Hash` coherently (`NaN == NaN`,
/// `0.0 == -0.0`). Constraint predicates that want numeric promotion
/// (`Int(2) == Real(2.0)`) go through [`Value::equals`] instead.
///
/// Ordering and arithmetic are defined only for the numeric variants;
/// applying them elsewhere fails the containing predicate rather than
/// panicking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Real(f64),
    Text(String),
    Symbol(String),
    /// An opaque composite, e.g. a coordinate pair. Carried through the
    /// solver untouched; only structural equality is defined.
    Tuple(Vec<Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        Value::Symbol(s.into())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Real(_))
    }

    /// Numeric view of the value, or `None` for non-numeric tags.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Predicate-level equality: numeric variants compare by value
    /// (`Int(2)` equals `Real(2.0)`), everything else structurally.
    pub fn equals(&self, other: &Value) -> bool {
        match (self.as_num(), other.as_num()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Ordering between numeric values; `None` when either side is
    /// non-numeric.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self.as_num(), other.as_num()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

// Bit pattern used for Eq/Hash. All NaNs collapse to one pattern and both
// zeroes to one so the two impls agree.
fn real_bits(r: f64) -> u64 {
    if r.is_nan() {
        f64::NAN.to_bits()
    } else if r == 0.0 {
        0
    } else {
        r.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => real_bits(*a) == real_bits(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(i) => i.hash(state),
            Value::Real(r) => real_bits(*r).hash(state),
            Value::Text(s) | Value::Symbol(s) => s.hash(state),
            Value::Tuple(vs) => vs.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Tuple(vs) => {
                write!(f, "(")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A comparison operator shared by the expression compiler and the
/// built-in constraint factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    /// Applies the operator to two values. Equality promotes numerics;
    /// the order operators are numeric-only and fail on other tags.
    pub fn eval(&self, a: &Value, b: &Value) -> bool {
        match self {
            CmpOp::Eq => a.equals(b),
            CmpOp::Ne => !a.equals(b),
            _ => match a.compare(b) {
                Some(ord) => self.accepts(ord),
                None => false,
            },
        }
    }

    /// Applies the operator to raw numbers; `Eq`/`Ne` use a small
    /// tolerance to absorb float round-off in accumulated sums.
    pub fn eval_num(&self, a: f64, b: f64) -> bool {
        match self {
            CmpOp::Eq => (a - b).abs() < EPSILON,
            CmpOp::Ne => (a - b).abs() >= EPSILON,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_separates_tags() {
        assert_ne!(Value::Int(1), Value::Real(1.0));
        assert_ne!(Value::Text("a".into()), Value::Symbol("a".into()));
        assert_eq!(Value::Real(0.0), Value::Real(-0.0));
        assert_eq!(Value::Real(f64::NAN), Value::Real(f64::NAN));
    }

    #[test]
    fn predicate_equality_promotes_numerics() {
        assert!(Value::Int(2).equals(&Value::Real(2.0)));
        assert!(!Value::Int(2).equals(&Value::symbol("two")));
    }

    #[test]
    fn ordering_is_numeric_only() {
        assert_eq!(
            Value::Int(1).compare(&Value::Real(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::symbol("a").compare(&Value::symbol("b")), None);
        assert!(!CmpOp::Lt.eval(&Value::symbol("a"), &Value::symbol("b")));
    }

    #[test]
    fn arithmetic_view() {
        assert_eq!(Value::Int(3).as_num(), Some(3.0));
        assert_eq!(Value::Real(0.5).as_num(), Some(0.5));
        assert_eq!(Value::text("x").as_num(), None);
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).as_num(), None);
    }
}
