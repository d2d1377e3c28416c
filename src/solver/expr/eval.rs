//! Generic arithmetic evaluator backing the parser's fallback rule.

use crate::error::{Error, Result};
use crate::solver::expr::lexer::Token;
use crate::solver::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// An arithmetic expression tree over constants and variable slots.
/// Variables are referenced by slot index into the constraint's variable
/// list, assigned in order of first occurrence in the source string.
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Const(f64),
    Slot(usize),
    Binary(Box<Expr>, ArithOp, Box<Expr>),
}

/// Evaluation outcome. `Missing` (an unassigned variable) keeps the
/// surrounding predicate optimistic; `Undefined` (non-numeric operand or
/// division by zero) fails it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Eval {
    Num(f64),
    Missing,
    Undefined,
}

impl Expr {
    pub fn eval(&self, slots: &[Option<&Value>]) -> Eval {
        match self {
            Expr::Const(n) => Eval::Num(*n),
            Expr::Slot(i) => match slots[*i] {
                Some(value) => match value.as_num() {
                    Some(n) => Eval::Num(n),
                    None => Eval::Undefined,
                },
                None => Eval::Missing,
            },
            Expr::Binary(lhs, op, rhs) => {
                let (a, b) = match (lhs.eval(slots), rhs.eval(slots)) {
                    (Eval::Undefined, _) | (_, Eval::Undefined) => return Eval::Undefined,
                    (Eval::Missing, _) | (_, Eval::Missing) => return Eval::Missing,
                    (Eval::Num(a), Eval::Num(b)) => (a, b),
                };
                match op {
                    ArithOp::Add => Eval::Num(a + b),
                    ArithOp::Sub => Eval::Num(a - b),
                    ArithOp::Mul => Eval::Num(a * b),
                    ArithOp::Div => {
                        if b == 0.0 {
                            Eval::Undefined
                        } else {
                            Eval::Num(a / b)
                        }
                    }
                }
            }
        }
    }
}

/// Recursive-descent parse of an arithmetic token run: `*`,`/` bind
/// tighter than `+`,`-`, application is left-associative, and a leading
/// `-` before a number literal is recognised in operand position.
pub(crate) fn parse_arith(
    input: &str,
    tokens: &[Token],
    slot_of: &dyn Fn(&str) -> Option<usize>,
) -> Result<Expr> {
    let mut pos = 0;
    let expr = parse_sum(input, tokens, &mut pos, slot_of)?;
    if pos != tokens.len() {
        return Err(Error::parse(input, "trailing tokens in expression"));
    }
    Ok(expr)
}

fn parse_sum(
    input: &str,
    tokens: &[Token],
    pos: &mut usize,
    slot_of: &dyn Fn(&str) -> Option<usize>,
) -> Result<Expr> {
    let mut lhs = parse_product(input, tokens, pos, slot_of)?;
    while let Some(op) = match tokens.get(*pos) {
        Some(Token::Plus) => Some(ArithOp::Add),
        Some(Token::Minus) => Some(ArithOp::Sub),
        _ => None,
    } {
        *pos += 1;
        let rhs = parse_product(input, tokens, pos, slot_of)?;
        lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_product(
    input: &str,
    tokens: &[Token],
    pos: &mut usize,
    slot_of: &dyn Fn(&str) -> Option<usize>,
) -> Result<Expr> {
    let mut lhs = parse_atom(input, tokens, pos, slot_of)?;
    while let Some(op) = match tokens.get(*pos) {
        Some(Token::Star) => Some(ArithOp::Mul),
        Some(Token::Slash) => Some(ArithOp::Div),
        _ => None,
    } {
        *pos += 1;
        let rhs = parse_atom(input, tokens, pos, slot_of)?;
        lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_atom(
    input: &str,
    tokens: &[Token],
    pos: &mut usize,
    slot_of: &dyn Fn(&str) -> Option<usize>,
) -> Result<Expr> {
    match tokens.get(*pos) {
        Some(Token::Int(n)) => {
            *pos += 1;
            Ok(Expr::Const(*n as f64))
        }
        Some(Token::Real(n)) => {
            *pos += 1;
            Ok(Expr::Const(*n))
        }
        Some(Token::Minus) => {
            *pos += 1;
            match tokens.get(*pos) {
                Some(Token::Int(n)) => {
                    *pos += 1;
                    Ok(Expr::Const(-(*n as f64)))
                }
                Some(Token::Real(n)) => {
                    *pos += 1;
                    Ok(Expr::Const(-n))
                }
                _ => Err(Error::parse(input, "`-` must precede a number literal")),
            }
        }
        Some(Token::Ident(name)) => {
            *pos += 1;
            match slot_of(name) {
                Some(slot) => Ok(Expr::Slot(slot)),
                None => Err(Error::UnknownVariable(name.clone())),
            }
        }
        Some(tok) => Err(Error::parse(input, format!("unexpected token {tok:?}"))),
        None => Err(Error::parse(input, "expression ends unexpectedly")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::expr::lexer::tokenize;

    fn eval_str(src: &str, slots: &[Option<&Value>]) -> Eval {
        let tokens = tokenize(src).unwrap();
        let names = ["A", "B"];
        let slot_of = |name: &str| names.iter().position(|n| *n == name);
        parse_arith(src, &tokens, &slot_of).unwrap().eval(slots)
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval_str("2 + 3 * 4", &[]), Eval::Num(14.0));
        assert_eq!(eval_str("20 / 2 / 5", &[]), Eval::Num(2.0));
        assert_eq!(eval_str("10 - 3 - 2", &[]), Eval::Num(5.0));
    }

    #[test]
    fn negative_literals_in_operand_position() {
        assert_eq!(eval_str("-5 + 8", &[]), Eval::Num(3.0));
        let a = Value::Int(7);
        assert_eq!(eval_str("A + -3", &[Some(&a), None]), Eval::Num(4.0));
    }

    #[test]
    fn division_by_zero_is_undefined() {
        assert_eq!(eval_str("5 / 0", &[]), Eval::Undefined);
    }

    #[test]
    fn missing_and_bad_operands() {
        let text = Value::text("x");
        assert_eq!(eval_str("A + 1", &[None, None]), Eval::Missing);
        assert_eq!(eval_str("A + 1", &[Some(&text), None]), Eval::Undefined);
    }
}
