//! SPDX license expressions as they show up in real package metadata.
//!
//! Registry fields are flat lists (`MIT OR Apache-2.0`,
//! `GPL-2.0-only WITH Classpath-exception-2.0 AND BSD-3-Clause`) with
//! inconsistent operator casing and the occasional `/` standing in for `OR`.
//! They are read with a forgiving tokenizer and a small state machine:
//!
//! ```text
//! expr := term ("AND" term)* | term ("OR" term)*
//! term := id ("WITH" exception)?
//! ```
//!
//! Anything that does not fit (parentheses, dangling operators, two ids in a
//! row) is kept whole as one opaque term. Mixing `AND` and `OR` without
//! parentheses is reported as ambiguous instead of picking a precedence.

use std::fmt;

use serde::Serialize;

use crate::error::ExpressionError;

/// One license in an expression, with its optional `WITH` exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseTerm {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl LicenseTerm {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exception: None,
        }
    }

    /// The id compatibility is decided on. Exceptions never change it.
    pub fn base_id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for LicenseTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exception {
            Some(exception) => write!(f, "{} WITH {}", self.id, exception),
            None => write!(f, "{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "terms", rename_all = "lowercase")]
pub enum LicenseExpression {
    Single(LicenseTerm),
    /// Conjunction: every term must hold.
    All(Vec<LicenseTerm>),
    /// Disjunction: any one term is enough.
    Any(Vec<LicenseTerm>),
}

impl LicenseExpression {
    pub fn terms(&self) -> &[LicenseTerm] {
        match self {
            Self::Single(term) => std::slice::from_ref(term),
            Self::All(terms) | Self::Any(terms) => terms,
        }
    }

    pub fn is_compound(&self) -> bool {
        !matches!(self, Self::Single(_))
    }

    /// Combine per-term outcomes, given in [`terms`](Self::terms) order,
    /// using AND/OR semantics.
    pub fn combine<I>(&self, outcomes: I) -> bool
    where
        I: IntoIterator<Item = bool>,
    {
        let mut outcomes = outcomes.into_iter();
        match self {
            Self::Single(_) => outcomes.next().unwrap_or(false),
            Self::All(_) => outcomes.all(|ok| ok),
            Self::Any(_) => outcomes.any(|ok| ok),
        }
    }
}

impl fmt::Display for LicenseExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (terms, op) = match self {
            Self::Single(term) => return write!(f, "{term}"),
            Self::All(terms) => (terms, " AND "),
            Self::Any(terms) => (terms, " OR "),
        };
        let joined: Vec<String> = terms.iter().map(ToString::to_string).collect();
        write!(f, "{}", joined.join(op))
    }
}

#[derive(Debug, PartialEq, Clone)]
enum Token {
    Id(String),
    And,
    Or,
    With,
}

/// Split on whitespace and `/`; keywords are case-insensitive.
fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for word in expr.split_whitespace() {
        for (i, part) in word.split('/').enumerate() {
            if i > 0 {
                tokens.push(Token::Or);
            }
            if part.is_empty() {
                continue;
            }
            let token = if part.eq_ignore_ascii_case("AND") {
                Token::And
            } else if part.eq_ignore_ascii_case("OR") {
                Token::Or
            } else if part.eq_ignore_ascii_case("WITH") {
                Token::With
            } else {
                Token::Id(part.to_string())
            };
            tokens.push(token);
        }
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    ExpectLicense,
    AfterLicense,
    ExpectException,
    AfterException,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operator {
    And,
    Or,
}

/// Parse a license field into a flat expression.
pub fn parse(input: &str) -> Result<LicenseExpression, ExpressionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ExpressionError::Empty);
    }
    // Nesting is not expected in package metadata; keep it whole.
    if trimmed.contains(['(', ')']) {
        return Ok(opaque(trimmed));
    }

    let mut state = State::ExpectLicense;
    let mut terms: Vec<LicenseTerm> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();

    for token in tokenize(trimmed) {
        state = match (state, token) {
            (State::ExpectLicense, Token::Id(id)) => {
                terms.push(LicenseTerm::new(id));
                State::AfterLicense
            }
            (State::AfterLicense, Token::With) => State::ExpectException,
            (State::ExpectException, Token::Id(exception)) => {
                if let Some(last) = terms.last_mut() {
                    last.exception = Some(exception);
                }
                State::AfterException
            }
            (State::AfterLicense | State::AfterException, Token::And) => {
                operators.push(Operator::And);
                State::ExpectLicense
            }
            (State::AfterLicense | State::AfterException, Token::Or) => {
                operators.push(Operator::Or);
                State::ExpectLicense
            }
            _ => return Ok(opaque(trimmed)),
        };
    }

    if !matches!(state, State::AfterLicense | State::AfterException) {
        return Ok(opaque(trimmed));
    }

    let has_and = operators.contains(&Operator::And);
    let has_or = operators.contains(&Operator::Or);
    match (has_and, has_or) {
        (true, true) => Err(ExpressionError::Ambiguous(trimmed.to_string())),
        (true, false) => Ok(LicenseExpression::All(terms)),
        (false, true) => Ok(LicenseExpression::Any(terms)),
        (false, false) => match terms.pop() {
            Some(term) => Ok(LicenseExpression::Single(term)),
            None => Err(ExpressionError::Empty),
        },
    }
}

fn opaque(raw: &str) -> LicenseExpression {
    tracing::debug!(expression = raw, "license expression kept as a single opaque id");
    LicenseExpression::Single(LicenseTerm::new(raw))
}
