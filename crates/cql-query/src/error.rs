//! Error types for CQL parsing and FQ reconstruction.
//!
//! Every failure is terminal for the call that produced it. The error value
//! carries enough context (query text, byte offset, lookahead token) to render
//! a caret-style diagnostic.

use std::{error::Error, fmt};

use thiserror::Error as ThisError;

use crate::lexer::{Token, TokenKind};

/// The specific kind of parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ErrorKind {
    /// The query string or FQ payload was absent or empty.
    #[error("query cannot be empty")]
    EmptyInput,
    /// Tokens remain after a complete top-level query.
    #[error("expected end of query")]
    UnexpectedTrailingInput,
    /// A `/` was not followed by a modifier name.
    #[error("invalid modifier")]
    InvalidModifier,
    /// A modifier relation was not followed by a value.
    #[error("invalid relation within modifier")]
    InvalidModifierRelation,
    /// An opening parenthesis has no matching closing one.
    #[error("missing closing parenthesis")]
    MissingClosingParen,
    /// A `>` prefix declaration is malformed.
    #[error("expecting string or quoted expression")]
    ExpectingStringOrQuotedExpression,
    /// The lookahead matches none of the search clause productions.
    #[error("invalid search clause")]
    InvalidSearchClause,
    /// An FQ value is neither a boolean node nor a search clause.
    #[error("malformed FQ structure")]
    MalformedFqStructure,
    /// FQ text is not valid JSON.
    #[error("invalid FQ JSON")]
    InvalidFqJson,
}

impl ErrorKind {
    /// Stable snake_case identifier for machine-readable reports.
    pub fn code(self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::UnexpectedTrailingInput => "unexpected_trailing_input",
            Self::InvalidModifier => "invalid_modifier",
            Self::InvalidModifierRelation => "invalid_modifier_relation",
            Self::MissingClosingParen => "missing_closing_paren",
            Self::ExpectingStringOrQuotedExpression => "expecting_string_or_quoted_expression",
            Self::InvalidSearchClause => "invalid_search_clause",
            Self::MalformedFqStructure => "malformed_fq_structure",
            Self::InvalidFqJson => "invalid_fq_json",
        }
    }
}

/// A parse failure with diagnostic context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlError {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// The original query text, `None` for FQ-sourced errors.
    pub query: Option<String>,
    /// Byte offset in the input where the error occurred.
    pub position: usize,
    /// Kind of the lookahead token at the point of failure.
    pub lookahead: TokenKind,
    /// Raw text of the lookahead token, if it carries any.
    pub token: Option<String>,
    /// Lowercased text of the lookahead token.
    pub token_lower: Option<String>,
}

impl CqlError {
    /// Creates an error with the default message for `kind`.
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            message: kind.to_string(),
            query: None,
            position,
            lookahead: TokenKind::End,
            token: None,
            token_lower: None,
        }
    }

    /// Creates an error positioned at a lookahead token.
    pub(crate) fn at_token(kind: ErrorKind, position: usize, token: &Token) -> Self {
        let mut err = Self::new(kind, position);
        err.lookahead = token.kind;
        if token.carries_text() {
            err.token = Some(token.text.clone());
            err.token_lower = Some(token.lower.clone());
        }
        err
    }

    /// Creates an FQ structure error with a detail message.
    pub(crate) fn malformed_fq(detail: impl fmt::Display) -> Self {
        let mut err = Self::new(ErrorKind::MalformedFqStructure, 0);
        err.message = format!("{}: {detail}", ErrorKind::MalformedFqStructure);
        err
    }

    /// Replaces the message, keeping the kind.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the error message without context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.kind {
            ErrorKind::MissingClosingParen => {
                Some("Add a closing parenthesis ) to match the opening one")
            }
            ErrorKind::InvalidSearchClause if self.lookahead == TokenKind::Unterminated => {
                Some("Add a closing quote to complete the quoted term")
            }
            ErrorKind::InvalidModifier => Some("Modifiers take the form /name or /name=value"),
            ErrorKind::InvalidModifierRelation => {
                Some("A modifier relation must be followed by a value, e.g. /distance<3")
            }
            ErrorKind::ExpectingStringOrQuotedExpression => {
                Some("Prefix declarations take the form > name = \"uri\" or > \"uri\"")
            }
            ErrorKind::UnexpectedTrailingInput => {
                Some("Join clauses with and, or, not or prox")
            }
            _ => None,
        }
    }

    /// Column of `position` in characters, for caret placement.
    fn column(&self, query: &str) -> usize {
        let clamped = self.position.min(query.len());
        query
            .char_indices()
            .take_while(|(idx, _)| *idx < clamped)
            .count()
    }
}

impl fmt::Display for CqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query syntax error: {}", self.message)?;

        if let Some(query) = &self.query {
            writeln!(f, "  {query}")?;
            writeln!(f, "  {}^", " ".repeat(self.column(query)))?;
        }

        if let Some(suggestion) = self.suggestion() {
            write!(f, "hint: {suggestion}")?;
        }

        Ok(())
    }
}

impl Error for CqlError {}
