//! Ordered domains of candidate values.

use std::collections::HashSet;
use std::fmt;

use crate::solver::value::Value;

/// The set of values a variable may still take, kept in a stable order.
///
/// The order is the one the caller supplied (duplicates collapsed to their
/// first occurrence) and is what makes the solver's enumeration order
/// deterministic. Backed by an `im::Vector`, so cloning a domain into a
/// new search frame is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain {
    values: im::Vector<Value>,
}

impl Domain {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        let mut seen = HashSet::new();
        let values = values
            .into_iter()
            .filter(|v| seen.insert(v.clone()))
            .collect();
        Self { values }
    }

    pub fn singleton(value: Value) -> Self {
        Self {
            values: im::vector![value],
        }
    }

    /// An integer domain covering `lo..=hi` in ascending order.
    pub fn int_range(lo: i64, hi: i64) -> Self {
        Self::new((lo..=hi).map(Value::Int))
    }

    /// A domain of symbolic values, e.g. colours.
    pub fn symbols<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(names.into_iter().map(|s| Value::Symbol(s.into())))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.values.len() == 1
    }

    /// The single remaining value, if the domain has been narrowed to one.
    pub fn singleton_value(&self) -> Option<&Value> {
        if self.is_singleton() {
            self.values.front()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// A new domain holding only the values that satisfy `keep`, in the
    /// same order.
    pub fn retain(&self, keep: impl Fn(&Value) -> bool) -> Domain {
        Domain {
            values: self.values.iter().filter(|v| keep(v)).cloned().collect(),
        }
    }
}

impl FromIterator<Value> for Domain {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Domain::new(iter)
    }
}

impl From<Vec<Value>> for Domain {
    fn from(values: Vec<Value>) -> Self {
        Domain::new(values)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "}}")
    }
}
