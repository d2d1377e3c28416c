//! The constraint-expression compiler.
//!
//! Turns strings such as `A + B == C`, `A != B != C`, `5 <= A + B <= 7`
//! or `A in [1, 2, 3]` into predicate objects classified by arity.
//! Recognition is ordered, first match wins:
//!
//! 1.  range:               `c1 <=/< V1 + … + Vn <=/< c2`
//! 2.  chained inequality:  `V1 != V2 != … != Vn` (n ≥ 3) → all-different
//! 3.  binary relation:     `V1 op V2`
//! 4.  chained ordering:    `V1 </<= V2 </<= …` (n ≥ 3), also `>`/`>=`
//! 5.  variable/constant:   `V op c`
//! 6.  variable equation:   `V1 + V2 + … == V` and `V1 * V2 * … == V`
//! 7.  arithmetic equality: `25*Q + 10*D == 100`, `A * B == 12`
//! 8.  arithmetic bound:    the same simple forms with `< <= > >=`
//! 9.  set membership:      `V in [...]` / `V not in [...]`
//! 10. fallback:            generic evaluator with `*`,`/` before `+`,`-`
//!
//! Every identifier outside a set literal must name a declared variable.

pub(crate) mod eval;
pub(crate) mod lexer;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::solver::constraint::{NaryFn, Predicate, VarId};
use crate::solver::constraints::arithmetic::{self, Fold};
use crate::solver::constraints::{self, binary, ordering};
use crate::solver::value::{CmpOp, Value, EPSILON};

use eval::parse_arith;
use lexer::{tokenize, Token};

/// A compiled constraint string: the variables it mentions, in predicate
/// slot order, and the predicate itself (binary for exactly two distinct
/// variables, n-ary otherwise).
#[derive(Debug, Clone)]
pub struct ParsedConstraint {
    pub variables: Vec<String>,
    pub predicate: Predicate,
}

impl ParsedConstraint {
    fn nary(variables: Vec<String>, f: NaryFn) -> Self {
        Self {
            variables,
            predicate: Predicate::Nary(f),
        }
    }

    fn binary(a: String, b: String, f: crate::solver::constraint::BinaryFn) -> Self {
        Self {
            variables: vec![a, b],
            predicate: Predicate::Binary(f),
        }
    }
}

/// Compiles one constraint string against the declared variable set.
pub fn parse_constraint(
    input: &str,
    declared: &HashMap<String, VarId>,
) -> Result<ParsedConstraint> {
    let tokens = tokenize(input)?;

    if let Some(parsed) = range_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    if let Some(parsed) = chained_not_equal_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    if let Some(parsed) = binary_relation_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    if let Some(parsed) = chained_ordering_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    if let Some(parsed) = variable_constant_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    if let Some(parsed) = variable_equation_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    if let Some(parsed) = arithmetic_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    if let Some(parsed) = membership_rule(input, &tokens, declared)? {
        return Ok(parsed);
    }
    fallback_rule(input, &tokens, declared)
}

fn check_declared(names: &[String], declared: &HashMap<String, VarId>) -> Result<()> {
    for name in names {
        if !declared.contains_key(name) {
            return Err(Error::UnknownVariable(name.clone()));
        }
    }
    Ok(())
}

/// Optional-minus numeric literal starting at `pos`; returns the numeric
/// value and the position after it.
fn parse_number(tokens: &[Token], pos: usize) -> Option<(f64, usize)> {
    match tokens.get(pos) {
        Some(Token::Int(n)) => Some((*n as f64, pos + 1)),
        Some(Token::Real(n)) => Some((*n, pos + 1)),
        Some(Token::Minus) => match tokens.get(pos + 1) {
            Some(Token::Int(n)) => Some((-(*n as f64), pos + 2)),
            Some(Token::Real(n)) => Some((-n, pos + 2)),
            _ => None,
        },
        _ => None,
    }
}

/// `Ident (Cmp Ident)+` covering the whole token run.
fn ident_chain(tokens: &[Token]) -> Option<(Vec<String>, Vec<CmpOp>)> {
    let mut names = vec![tokens.first()?.as_ident()?.to_string()];
    let mut ops = Vec::new();
    let mut i = 1;
    while i < tokens.len() {
        let op = tokens[i].as_cmp()?;
        let name = tokens.get(i + 1)?.as_ident()?;
        ops.push(op);
        names.push(name.to_string());
        i += 2;
    }
    if ops.is_empty() {
        None
    } else {
        Some((names, ops))
    }
}

/// `Ident (Plus Ident)*` covering the whole token run.
fn plain_sum(tokens: &[Token]) -> Option<Vec<String>> {
    let mut names = vec![tokens.first()?.as_ident()?.to_string()];
    let mut i = 1;
    while i < tokens.len() {
        if tokens[i] != Token::Plus {
            return None;
        }
        names.push(tokens.get(i + 1)?.as_ident()?.to_string());
        i += 2;
    }
    Some(names)
}

/// A linear sum `[c*]V + [c*]V + …`; duplicated variables have their
/// coefficients merged so the result maps one slot per distinct variable.
fn linear_sum(tokens: &[Token]) -> Option<(Vec<String>, Vec<f64>)> {
    let mut names: Vec<String> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    let mut i = 0;
    loop {
        let (coefficient, name, next) = match tokens.get(i)? {
            Token::Ident(name) => (1.0, name.clone(), i + 1),
            Token::Int(_) | Token::Real(_) => {
                let (c, after_num) = parse_number(tokens, i)?;
                if tokens.get(after_num) != Some(&Token::Star) {
                    return None;
                }
                let name = tokens.get(after_num + 1)?.as_ident()?.to_string();
                (c, name, after_num + 2)
            }
            _ => return None,
        };
        i = next;
        match names.iter().position(|n| *n == name) {
            Some(slot) => weights[slot] += coefficient,
            None => {
                names.push(name);
                weights.push(coefficient);
            }
        }
        match tokens.get(i) {
            None => break,
            Some(Token::Plus) => i += 1,
            Some(_) => return None,
        }
    }
    Some((names, weights))
}

/// `Ident (Star Ident)+` with no repeated variable (repetition falls
/// through to the generic evaluator, which shares slots by name).
fn plain_product(tokens: &[Token]) -> Option<Vec<String>> {
    let mut names = vec![tokens.first()?.as_ident()?.to_string()];
    let mut i = 1;
    while i < tokens.len() {
        if tokens[i] != Token::Star {
            return None;
        }
        names.push(tokens.get(i + 1)?.as_ident()?.to_string());
        i += 2;
    }
    if names.len() < 2 {
        return None;
    }
    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    if unique.len() != names.len() {
        return None;
    }
    Some(names)
}

fn weighted_sum_nary(
    weights: Vec<f64>,
    check: impl Fn(f64) -> bool + Send + Sync + 'static,
) -> NaryFn {
    Arc::new(move |slots| match arithmetic::fold_sum(slots, Some(&weights)) {
        Fold::Num(total) => check(total),
        Fold::Missing => true,
        Fold::Bad => false,
    })
}

/// Rule 1: `c1 <=/< V + V + … <=/< c2`.
fn range_rule(
    _input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let Some((lo, after_lo)) = parse_number(tokens, 0) else {
        return Ok(None);
    };
    let Some(lo_op @ (CmpOp::Lt | CmpOp::Le)) = tokens.get(after_lo).and_then(Token::as_cmp)
    else {
        return Ok(None);
    };
    // The upper comparison is the last Lt/Le token; everything between is
    // the variable sum.
    let hi_pos = (after_lo + 1..tokens.len())
        .rev()
        .find(|i| matches!(tokens[*i].as_cmp(), Some(CmpOp::Lt | CmpOp::Le)));
    let Some(hi_pos) = hi_pos else {
        return Ok(None);
    };
    let Some(hi_op) = tokens[hi_pos].as_cmp() else {
        return Ok(None);
    };
    let Some((hi, end)) = parse_number(tokens, hi_pos + 1) else {
        return Ok(None);
    };
    if end != tokens.len() {
        return Ok(None);
    }
    let Some(names) = plain_sum(&tokens[after_lo + 1..hi_pos]) else {
        return Ok(None);
    };

    check_declared(&names, declared)?;
    let lo_strict = lo_op == CmpOp::Lt;
    let hi_strict = hi_op == CmpOp::Lt;

    // Merge duplicated variables into per-slot weights.
    let mut unique: Vec<String> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    for name in names {
        match unique.iter().position(|n| *n == name) {
            Some(slot) => weights[slot] += 1.0,
            None => {
                unique.push(name);
                weights.push(1.0);
            }
        }
    }

    let uniform = weights.iter().all(|w| *w == 1.0);
    let parsed = if uniform && unique.len() == 2 {
        let b = unique.pop().unwrap();
        let a = unique.pop().unwrap();
        ParsedConstraint::binary(a, b, binary::sum_bounded(lo, lo_strict, hi, hi_strict))
    } else if uniform {
        ParsedConstraint::nary(unique, arithmetic::sum_bounded(lo, lo_strict, hi, hi_strict))
    } else {
        let f = weighted_sum_nary(weights, move |total| {
            let above = if lo_strict { total > lo } else { total >= lo };
            let below = if hi_strict { total < hi } else { total <= hi };
            above && below
        });
        ParsedConstraint::nary(unique, f)
    };
    Ok(Some(parsed))
}

/// Rule 2: `V1 != V2 != … != Vn`, n ≥ 3.
fn chained_not_equal_rule(
    _input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let Some((names, ops)) = ident_chain(tokens) else {
        return Ok(None);
    };
    if names.len() < 3 || !ops.iter().all(|op| *op == CmpOp::Ne) {
        return Ok(None);
    }
    check_declared(&names, declared)?;

    let mut unique = Vec::new();
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    let parsed = match unique.len() {
        1 => {
            // `A != A != A` can never hold.
            ParsedConstraint::nary(unique, Arc::new(|_| false))
        }
        2 => {
            let b = unique.pop().unwrap();
            let a = unique.pop().unwrap();
            ParsedConstraint::binary(a, b, binary::not_equal())
        }
        _ => ParsedConstraint::nary(unique, constraints::all_different()),
    };
    Ok(Some(parsed))
}

/// Rule 3: `V1 op V2`.
fn binary_relation_rule(
    _input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let [Token::Ident(a), op, Token::Ident(b)] = tokens else {
        return Ok(None);
    };
    let Some(op) = op.as_cmp() else {
        return Ok(None);
    };
    let names = vec![a.clone(), b.clone()];
    check_declared(&names, declared)?;

    let parsed = if a == b {
        // A relation between a variable and itself is decided per value.
        ParsedConstraint::nary(
            vec![a.clone()],
            Arc::new(move |slots| match slots.first().copied().flatten() {
                Some(v) => op.eval(v, v),
                None => true,
            }),
        )
    } else {
        ParsedConstraint::binary(a.clone(), b.clone(), binary::compare(op))
    };
    Ok(Some(parsed))
}

/// Rule 4: `V1 < V2 < … < Vn` (or `<=`, `>`, `>=`), n ≥ 3.
fn chained_ordering_rule(
    _input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let Some((names, ops)) = ident_chain(tokens) else {
        return Ok(None);
    };
    if names.len() < 3 {
        return Ok(None);
    }
    let all_up = ops.iter().all(|op| matches!(op, CmpOp::Lt | CmpOp::Le));
    let all_down = ops.iter().all(|op| matches!(op, CmpOp::Gt | CmpOp::Ge));
    if !all_up && !all_down {
        return Ok(None);
    }
    check_declared(&names, declared)?;

    let f = if ops.iter().all(|op| *op == CmpOp::Lt) {
        constraints::strictly_ascending()
    } else if ops.iter().all(|op| *op == CmpOp::Le) {
        constraints::ascending()
    } else if ops.iter().all(|op| *op == CmpOp::Ge) {
        constraints::descending()
    } else {
        ordering::chain(ops)
    };
    Ok(Some(ParsedConstraint::nary(names, f)))
}

/// Rule 5: `V op c`.
fn variable_constant_rule(
    _input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let Some(Token::Ident(name)) = tokens.first() else {
        return Ok(None);
    };
    let Some(op) = tokens.get(1).and_then(Token::as_cmp) else {
        return Ok(None);
    };
    let constant = match (tokens.get(2), tokens.get(3), tokens.len()) {
        (Some(Token::Int(n)), None, 3) => Value::Int(*n),
        (Some(Token::Real(n)), None, 3) => Value::Real(*n),
        (Some(Token::Minus), Some(Token::Int(n)), 4) => Value::Int(-*n),
        (Some(Token::Minus), Some(Token::Real(n)), 4) => Value::Real(-*n),
        (Some(Token::Str(s)), None, 3) => Value::Text(s.clone()),
        _ => return Ok(None),
    };
    let names = vec![name.clone()];
    check_declared(&names, declared)?;

    let f: NaryFn = Arc::new(move |slots| match slots.first().copied().flatten() {
        Some(v) => op.eval(v, &constant),
        None => true,
    });
    Ok(Some(ParsedConstraint::nary(names, f)))
}

/// Rule 6: `V1 + V2 + … == V` and `V1 * V2 * … == V`.
fn variable_equation_rule(
    _input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let Some(eq_pos) = tokens.iter().position(|t| t.as_cmp().is_some()) else {
        return Ok(None);
    };
    if tokens[eq_pos].as_cmp() != Some(CmpOp::Eq) || eq_pos + 2 != tokens.len() {
        return Ok(None);
    }
    let Some(Token::Ident(target)) = tokens.get(eq_pos + 1) else {
        return Ok(None);
    };

    let lhs = &tokens[..eq_pos];
    let (mut names, f) = if let Some(terms) = plain_sum(lhs) {
        if terms.len() < 2 {
            return Ok(None);
        }
        (terms, arithmetic::sum_equals_var())
    } else if let Some(terms) = plain_product(lhs) {
        (terms, arithmetic::product_equals_var())
    } else {
        return Ok(None);
    };

    names.push(target.clone());
    // Repeated variables (including the target among the terms) are left
    // to the generic evaluator, which shares slots by name.
    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    if unique.len() != names.len() {
        return Ok(None);
    }
    check_declared(&names, declared)?;
    Ok(Some(ParsedConstraint::nary(names, f)))
}

/// Rules 7 and 8: simple sums and products compared to a constant.
fn arithmetic_rule(
    _input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let Some(cmp_pos) = tokens.iter().position(|t| t.as_cmp().is_some()) else {
        return Ok(None);
    };
    let op = tokens[cmp_pos].as_cmp().unwrap();
    if op == CmpOp::Ne {
        return Ok(None);
    }
    let Some((target, end)) = parse_number(tokens, cmp_pos + 1) else {
        return Ok(None);
    };
    if end != tokens.len() {
        return Ok(None);
    }
    let lhs = &tokens[..cmp_pos];

    if let Some((names, weights)) = linear_sum(lhs) {
        check_declared(&names, declared)?;
        let uniform = weights.iter().all(|w| *w == 1.0);
        if names.len() == 2 {
            let mut names = names;
            let b = names.pop().unwrap();
            let a = names.pop().unwrap();
            let f = binary::weighted_sum(op, target, [weights[0], weights[1]]);
            return Ok(Some(ParsedConstraint::binary(a, b, f)));
        }
        let f = match (op, uniform) {
            (CmpOp::Eq, true) => arithmetic::exact_sum(target),
            (CmpOp::Eq, false) => arithmetic::exact_sum_weighted(target, weights),
            (CmpOp::Ge, true) => arithmetic::min_sum(target),
            (CmpOp::Ge, false) => arithmetic::min_sum_weighted(target, weights),
            (CmpOp::Le, true) => arithmetic::max_sum(target),
            (CmpOp::Le, false) => arithmetic::max_sum_weighted(target, weights),
            // Strict bounds lean on an epsilon offset of the bound.
            (CmpOp::Gt, true) => arithmetic::min_sum(target + EPSILON),
            (CmpOp::Gt, false) => arithmetic::min_sum_weighted(target + EPSILON, weights),
            (CmpOp::Lt, true) => arithmetic::max_sum(target - EPSILON),
            (CmpOp::Lt, false) => arithmetic::max_sum_weighted(target - EPSILON, weights),
            (CmpOp::Ne, _) => unreachable!("filtered above"),
        };
        return Ok(Some(ParsedConstraint::nary(names, f)));
    }

    if let Some(names) = plain_product(lhs) {
        check_declared(&names, declared)?;
        if names.len() == 2 {
            let mut names = names;
            let b = names.pop().unwrap();
            let a = names.pop().unwrap();
            return Ok(Some(ParsedConstraint::binary(a, b, binary::product(op, target))));
        }
        let f = match op {
            CmpOp::Eq => arithmetic::exact_product(target),
            CmpOp::Ge => arithmetic::min_product(target),
            CmpOp::Le => arithmetic::max_product(target),
            CmpOp::Gt => arithmetic::min_product(target + EPSILON),
            CmpOp::Lt => arithmetic::max_product(target - EPSILON),
            CmpOp::Ne => unreachable!("filtered above"),
        };
        return Ok(Some(ParsedConstraint::nary(names, f)));
    }

    Ok(None)
}

/// Rule 9: `V in [...]` / `V not in [...]`.
fn membership_rule(
    input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<Option<ParsedConstraint>> {
    let Some(Token::Ident(name)) = tokens.first() else {
        return Ok(None);
    };
    let (negated, bracket) = match (tokens.get(1), tokens.get(2)) {
        (Some(Token::KwIn), _) => (false, 2),
        (Some(Token::KwNot), Some(Token::KwIn)) => (true, 3),
        _ => return Ok(None),
    };
    if tokens.get(bracket) != Some(&Token::LBracket) || tokens.last() != Some(&Token::RBracket) {
        return Err(Error::parse(input, "membership needs a bracketed set"));
    }

    let mut members = Vec::new();
    let mut i = bracket + 1;
    let close = tokens.len() - 1;
    while i < close {
        let value = match &tokens[i] {
            Token::Int(n) => {
                i += 1;
                Value::Int(*n)
            }
            Token::Real(n) => {
                i += 1;
                Value::Real(*n)
            }
            Token::Minus => {
                let Some((n, next)) = parse_number(tokens, i) else {
                    return Err(Error::parse(input, "bad set member"));
                };
                i = next;
                if n.fract() == 0.0 && matches!(tokens[i - 1], Token::Int(_)) {
                    Value::Int(n as i64)
                } else {
                    Value::Real(n)
                }
            }
            Token::Ident(sym) => {
                i += 1;
                Value::Symbol(sym.clone())
            }
            Token::Str(s) => {
                i += 1;
                Value::Text(s.clone())
            }
            other => {
                return Err(Error::parse(input, format!("bad set member {other:?}")));
            }
        };
        members.push(value);
        match tokens.get(i) {
            Some(Token::Comma) => i += 1,
            _ if i == close => {}
            _ => return Err(Error::parse(input, "set members must be comma-separated")),
        }
    }

    let names = vec![name.clone()];
    check_declared(&names, declared)?;
    let f = if negated {
        constraints::not_in_set(members)
    } else {
        constraints::in_set(members)
    };
    Ok(Some(ParsedConstraint::nary(names, f)))
}

/// Rule 10: generic `lhs op rhs` with full arithmetic on both sides.
fn fallback_rule(
    input: &str,
    tokens: &[Token],
    declared: &HashMap<String, VarId>,
) -> Result<ParsedConstraint> {
    let cmp_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.as_cmp().map(|_| i))
        .collect();
    let [cmp_pos] = cmp_positions[..] else {
        return Err(Error::parse(input, "expected exactly one comparison"));
    };
    let op = tokens[cmp_pos].as_cmp().unwrap();

    // One slot per distinct variable, in order of first occurrence.
    let mut names: Vec<String> = Vec::new();
    for token in tokens {
        if let Token::Ident(name) = token {
            if !declared.contains_key(name) {
                return Err(Error::UnknownVariable(name.clone()));
            }
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    if names.is_empty() {
        return Err(Error::parse(input, "constraint references no variables"));
    }

    let slot_of = |name: &str| names.iter().position(|n| n == name);
    let lhs = parse_arith(input, &tokens[..cmp_pos], &slot_of)?;
    let rhs = parse_arith(input, &tokens[cmp_pos + 1..], &slot_of)?;

    let evaluate = move |slots: &[Option<&Value>]| match (lhs.eval(slots), rhs.eval(slots)) {
        (eval::Eval::Num(a), eval::Eval::Num(b)) => op.eval_num(a, b),
        (eval::Eval::Undefined, _) | (_, eval::Eval::Undefined) => false,
        _ => true,
    };

    if names.len() == 2 {
        let f: crate::solver::constraint::BinaryFn =
            Arc::new(move |a, b| evaluate(&[Some(a), Some(b)]));
        let mut names = names;
        let b = names.pop().unwrap();
        let a = names.pop().unwrap();
        Ok(ParsedConstraint::binary(a, b, f))
    } else {
        Ok(ParsedConstraint::nary(names, Arc::new(evaluate)))
    }
}
