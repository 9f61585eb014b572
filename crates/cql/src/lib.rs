//! cql: Contextual Query Language tool
//!
//! Parses CQL search expressions and converts them between the XCQL (XML), FQ (JSON) and
//! canonical CQL renderings. Defaults for the server-choice index and the output format come
//! from `.cql.toml` files discovered from the working directory.

#![warn(missing_docs)]

pub mod cli;
