//! Tokeniser for constraint expressions.

use crate::error::{Error, Result};
use crate::solver::value::CmpOp;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Int(i64),
    Real(f64),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Cmp(CmpOp),
    KwIn,
    KwNot,
    LBracket,
    RBracket,
    Comma,
}

impl Token {
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Token::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_cmp(&self) -> Option<CmpOp> {
        match self {
            Token::Cmp(op) => Some(*op),
            _ => None,
        }
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Eq));
                    i += 2;
                } else {
                    return Err(Error::parse(input, "single `=`; did you mean `==`?"));
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Ne));
                    i += 2;
                } else {
                    return Err(Error::parse(input, "stray `!`"));
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Le));
                    i += 2;
                } else {
                    tokens.push(Token::Cmp(CmpOp::Lt));
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Ge));
                    i += 2;
                } else {
                    tokens.push(Token::Cmp(CmpOp::Gt));
                    i += 1;
                }
            }
            '"' | '\'' => {
                let quote = c;
                let start = i + 1;
                let mut j = start;
                while j < bytes.len() && bytes[j] as char != quote {
                    j += 1;
                }
                if j == bytes.len() {
                    return Err(Error::parse(input, "unterminated string literal"));
                }
                tokens.push(Token::Str(input[start..j].to_string()));
                i = j + 1;
            }
            _ if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                let mut is_real = false;
                if i + 1 < bytes.len()
                    && bytes[i] as char == '.'
                    && (bytes[i + 1] as char).is_ascii_digit()
                {
                    is_real = true;
                    i += 1;
                    while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                        i += 1;
                    }
                }
                let text = &input[start..i];
                if is_real {
                    let n = text
                        .parse::<f64>()
                        .map_err(|_| Error::parse(input, format!("bad number `{text}`")))?;
                    tokens.push(Token::Real(n));
                } else {
                    let n = text
                        .parse::<i64>()
                        .map_err(|_| Error::parse(input, format!("bad number `{text}`")))?;
                    tokens.push(Token::Int(n));
                }
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_ascii_alphanumeric() || c == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                match &input[start..i] {
                    "in" => tokens.push(Token::KwIn),
                    "not" => tokens.push(Token::KwNot),
                    name => tokens.push(Token::Ident(name.to_string())),
                }
            }
            _ => {
                return Err(Error::parse(input, format!("unexpected character `{c}`")));
            }
        }
    }

    if tokens.is_empty() {
        return Err(Error::parse(input, "empty expression"));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lexes_operators_and_literals() {
        let toks = tokenize("A + 2.5 * B1 <= -7").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Ident("A".into()),
                Token::Plus,
                Token::Real(2.5),
                Token::Star,
                Token::Ident("B1".into()),
                Token::Cmp(CmpOp::Le),
                Token::Minus,
                Token::Int(7),
            ]
        );
    }

    #[test]
    fn lexes_set_syntax() {
        let toks = tokenize("A not in [1, red, \"x y\"]").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Ident("A".into()),
                Token::KwNot,
                Token::KwIn,
                Token::LBracket,
                Token::Int(1),
                Token::Comma,
                Token::Ident("red".into()),
                Token::Comma,
                Token::Str("x y".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(tokenize("A = 1").is_err());
        assert!(tokenize("A ? 1").is_err());
        assert!(tokenize("").is_err());
        assert!(tokenize("A == 'oops").is_err());
    }
}
