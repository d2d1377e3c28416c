//! Predicate objects and the two constraint shapes the engine runs on.

use std::fmt;
use std::sync::Arc;

use crate::solver::value::Value;

/// Index of a variable inside a [`Problem`](crate::solver::problem::Problem),
/// assigned in insertion order.
pub type VarId = usize;

/// A two-variable test, called as `test(head_value, tail_value)`.
pub type BinaryFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// An n-ary test over the constraint's variables in declared order.
///
/// The slice holds one slot per variable; `None` marks a variable with no
/// committed value yet. Implementations must be *optimistic*: return
/// `true` unless the supplied values alone already prove a violation, and
/// decide strictly only when every slot is filled. The consistency engine
/// relies on this to prune its support search on partial assignments.
pub type NaryFn = Arc<dyn Fn(&[Option<&Value>]) -> bool + Send + Sync>;

/// A constraint predicate, classified by arity.
///
/// Two-variable constraints want the [`Binary`](Predicate::Binary) form so
/// that arc consistency can work on them directly; everything else (unary
/// included) is [`Nary`](Predicate::Nary) and handled by generalised arc
/// consistency.
#[derive(Clone)]
pub enum Predicate {
    Binary(BinaryFn),
    Nary(NaryFn),
}

impl Predicate {
    pub fn binary(f: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Binary(Arc::new(f))
    }

    pub fn nary(f: impl Fn(&[Option<&Value>]) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Nary(Arc::new(f))
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Predicate::Binary(_) => "binary",
            Predicate::Nary(_) => "n-ary",
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate::{}(..)", self.kind())
    }
}

/// One direction of a two-variable constraint.
///
/// Revising the arc prunes the *tail*: a tail value survives only if some
/// head value supports it. Each user-level binary constraint installs both
/// directions, so either endpoint can be pruned.
#[derive(Clone)]
pub struct BinaryArc {
    pub head: VarId,
    pub tail: VarId,
    pub test: BinaryFn,
    pub label: String,
}

impl BinaryArc {
    pub fn check(&self, head_value: &Value, tail_value: &Value) -> bool {
        (self.test)(head_value, tail_value)
    }
}

impl fmt::Debug for BinaryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryArc")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("label", &self.label)
            .finish()
    }
}

/// A constraint over one, or three or more, variables.
#[derive(Clone)]
pub struct NaryConstraint {
    pub vars: Vec<VarId>,
    pub test: NaryFn,
    pub label: String,
}

impl NaryConstraint {
    pub fn check(&self, local: &[Option<&Value>]) -> bool {
        (self.test)(local)
    }
}

impl fmt::Debug for NaryConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaryConstraint")
            .field("vars", &self.vars)
            .field("label", &self.label)
            .finish()
    }
}
