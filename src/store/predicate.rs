use std::cmp::Ordering;

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::filter_record_batch;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::core::TabulaError;

/// Boolean row condition over a frame: `column op literal` terms joined by
/// `AND`. Ops are `=`, `!=`, `<>`, `<`, `<=`, `>`, `>=`; literals are numbers
/// or single-quoted strings. This is the predicate dialect the directory
/// store understands; a warehouse-backed store would push the raw text down
/// as SQL instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq)]
struct Term {
    column: String,
    op: Op,
    value: Literal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn matches(self, ord: Ordering) -> bool {
        match self {
            Op::Eq => ord == Ordering::Equal,
            Op::Ne => ord != Ordering::Equal,
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
            Op::Gt => ord == Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Number(f64),
    Text(String),
}

fn parse_error(msg: impl Into<String>) -> TabulaError {
    TabulaError::StoreReadFailure(format!("predicate: {}", msg.into()))
}

impl Predicate {
    pub fn parse(text: &str) -> Result<Self, TabulaError> {
        let tokens = tokenize(text)?;
        let mut terms = Vec::new();
        let mut rest = tokens.as_slice();

        loop {
            let (term, remaining) = parse_term(rest)?;
            terms.push(term);
            match remaining {
                [] => break,
                [Token::And, tail @ ..] if !tail.is_empty() => rest = tail,
                [Token::And, ..] => return Err(parse_error("dangling AND")),
                [tok, ..] => return Err(parse_error(format!("unexpected {tok:?}"))),
            }
        }

        Ok(Predicate { terms })
    }

    /// Keep only the rows matching every term. Null cells never match.
    pub fn apply(&self, batch: &RecordBatch) -> Result<RecordBatch, TabulaError> {
        let mut mask = vec![true; batch.num_rows()];
        for term in &self.terms {
            term.evaluate(batch, &mut mask)?;
        }
        filter_record_batch(batch, &BooleanArray::from(mask)).map_err(TabulaError::from)
    }
}

impl Term {
    fn evaluate(&self, batch: &RecordBatch, mask: &mut [bool]) -> Result<(), TabulaError> {
        let schema = batch.schema();
        let (idx, field) = schema
            .fields()
            .iter()
            .enumerate()
            .find(|(_, f)| f.name().eq_ignore_ascii_case(&self.column))
            .ok_or_else(|| parse_error(format!("unknown column '{}'", self.column)))?;
        let array = batch.column(idx);

        match (field.data_type(), &self.value) {
            (DataType::Utf8, Literal::Text(want)) => {
                let arr = array.as_any().downcast_ref::<StringArray>().unwrap();
                for (i, m) in mask.iter_mut().enumerate() {
                    *m = *m && !arr.is_null(i) && self.op.matches(arr.value(i).cmp(want.as_str()));
                }
                Ok(())
            }
            (DataType::Int64, Literal::Number(want)) => {
                let arr = array.as_any().downcast_ref::<Int64Array>().unwrap();
                for (i, m) in mask.iter_mut().enumerate() {
                    *m = *m
                        && !arr.is_null(i)
                        && (arr.value(i) as f64)
                            .partial_cmp(want)
                            .is_some_and(|ord| self.op.matches(ord));
                }
                Ok(())
            }
            (DataType::Float64, Literal::Number(want)) => {
                let arr = array.as_any().downcast_ref::<Float64Array>().unwrap();
                for (i, m) in mask.iter_mut().enumerate() {
                    *m = *m
                        && !arr.is_null(i)
                        && arr
                            .value(i)
                            .partial_cmp(want)
                            .is_some_and(|ord| self.op.matches(ord));
                }
                Ok(())
            }
            (dtype, literal) => Err(parse_error(format!(
                "cannot compare column '{}' ({dtype:?}) with {literal:?}",
                self.column
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Op(Op),
    Number(f64),
    Text(String),
    And,
}

fn parse_term(tokens: &[Token]) -> Result<(Term, &[Token]), TabulaError> {
    match tokens {
        [Token::Ident(column), Token::Op(op), value, rest @ ..] => {
            let value = match value {
                Token::Number(n) => Literal::Number(*n),
                Token::Text(s) => Literal::Text(s.clone()),
                other => return Err(parse_error(format!("expected literal, got {other:?}"))),
            };
            Ok((
                Term {
                    column: column.clone(),
                    op: *op,
                    value,
                },
                rest,
            ))
        }
        _ => Err(parse_error("expected '<column> <op> <literal>'")),
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, TabulaError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => s.push(ch),
                        None => return Err(parse_error("unterminated string literal")),
                    }
                }
                tokens.push(Token::Text(s));
            }
            '=' => {
                chars.next();
                tokens.push(Token::Op(Op::Eq));
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::Op(Op::Ne)),
                    _ => return Err(parse_error("expected '=' after '!'")),
                }
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('=') => {
                        chars.next();
                        tokens.push(Token::Op(Op::Le));
                    }
                    Some('>') => {
                        chars.next();
                        tokens.push(Token::Op(Op::Ne));
                    }
                    _ => tokens.push(Token::Op(Op::Lt)),
                }
            }
            '>' => {
                chars.next();
                match chars.peek() {
                    Some('=') => {
                        chars.next();
                        tokens.push(Token::Op(Op::Ge));
                    }
                    _ => tokens.push(Token::Op(Op::Gt)),
                }
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut s = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == 'e' || ch == 'E' {
                        s.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n: f64 = s
                    .parse()
                    .map_err(|_| parse_error(format!("invalid number '{s}'")))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        s.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if s.eq_ignore_ascii_case("and") {
                    tokens.push(Token::And);
                } else {
                    tokens.push(Token::Ident(s));
                }
            }
            other => return Err(parse_error(format!("unexpected character '{other}'"))),
        }
    }

    if tokens.is_empty() {
        return Err(parse_error("empty predicate"));
    }
    Ok(tokens)
}
