//! Contextual Query Language (CQL) parsing.
//!
//! Parses CQL search expressions into a query tree and converts the tree to
//! and from three representations:
//!
//! - **XCQL**: the XML form (`CqlNode::to_xcql`)
//! - **FQ**: a compact JSON form (`CqlNode::to_fq`, `parse_from_fq`)
//! - **CQL**: a canonical redisplay string (`Display`, `CqlNode::to_cql`)
//!
//! The grammar covers search clauses (`title any "fish"`), the boolean
//! operators `and`, `or`, `not` and `prox` (one precedence level, chained to
//! the left), grouping, modifiers (`/distance<3`) and prefix declarations
//! (`> dc = "http://purl.org/dc"`).
//!
//! # Example
//!
//! ```
//! use cql_query::{BooleanOp, parse, parse_from_fq};
//!
//! let tree = parse("title any fish and date > 1990").unwrap();
//! assert_eq!(tree.as_boolean().unwrap().op, BooleanOp::And);
//!
//! let back = parse_from_fq(&tree.to_fq()).unwrap();
//! assert_eq!(back.to_cql(), "title any \"fish\" AND date > \"1990\"");
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod fq;
mod lexer;
mod parser;
mod prefix;
pub mod relation;
mod xcql;

pub use ast::{
    BooleanNode, BooleanOp, CqlNode, DEFAULT_SERVER_CHOICE_FIELD, DEFAULT_SERVER_CHOICE_RELATION,
    Modifier, SearchClause, ServerChoice,
};
pub use error::{CqlError, ErrorKind};
pub use fq::{parse_from_fq, parse_from_fq_value, parse_from_fq_with};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{parse, parse_with};
pub use prefix::{DEFAULT_PREFIX, PrefixTable, RELATION_PREFIX};
