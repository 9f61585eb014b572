//! CQL parser.
//!
//! Recursive descent over a pull-based lexer with one token of lookahead.
//!
//! # Grammar
//!
//! ```text
//! query         → clause (BOOLEAN modifiers clause)*
//! clause        → "(" query ")"
//!               | ">" WORD ("=" WORD)? query
//!               | WORD relation modifiers clause
//!               | WORD modifiers
//! relation      → WORD | COMPARISON
//! modifiers     → ("/" WORD (COMPARISON WORD)?)*
//! ```
//!
//! `WORD` is a bareword or quoted string, `BOOLEAN` a bareword spelling
//! `and`, `or`, `not` or `prox` in any case. All boolean operators share one
//! precedence level and chain to the left: `a and b or c` is
//! `(a and b) or c`.
//!
//! A word followed by another word (that is not a boolean keyword) or by a
//! comparison is an index name; otherwise it is a search term. Prefix
//! declarations apply to the rest of the production they start.

use std::mem;

use crate::{
    ast::{BooleanNode, BooleanOp, CqlNode, Modifier, SearchClause, ServerChoice},
    error::{CqlError, ErrorKind},
    lexer::{Lexer, Token, TokenKind},
    prefix::{DEFAULT_PREFIX, PrefixTable},
};

/// Index, relation and modifiers a clause takes from its enclosing production.
#[derive(Debug, Clone)]
struct Inherited {
    /// Index name, possibly prefixed.
    field: String,
    /// Relation symbol or word.
    relation: String,
    /// Relation modifiers.
    modifiers: Vec<Modifier>,
    /// Start of the index token, when one was written for this clause.
    start: Option<usize>,
    /// Start of the relation token, when one was written.
    relation_pos: Option<usize>,
}

/// Single-use parser state for one query.
struct Parser<'a> {
    /// Token source.
    lexer: Lexer<'a>,
    /// Current lookahead token.
    look: Token,
    /// Prefixes declared so far.
    prefixes: PrefixTable,
    /// Defaults for clauses that name no index or relation.
    server_choice: &'a ServerChoice,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned at the first token of `input`.
    fn new(input: &'a str, server_choice: &'a ServerChoice) -> Self {
        let mut lexer = Lexer::new(input);
        let look = lexer.next_token();
        Self {
            lexer,
            look,
            prefixes: PrefixTable::new(),
            server_choice,
        }
    }

    /// Parses a complete query, requiring all input to be consumed.
    fn parse(mut self) -> Result<CqlNode, CqlError> {
        if self.look.kind == TokenKind::End {
            return Err(self.error(ErrorKind::EmptyInput, 0));
        }

        let root = Inherited {
            field: self.server_choice.field.clone(),
            relation: self.server_choice.relation.clone(),
            modifiers: Vec::new(),
            start: None,
            relation_pos: None,
        };
        let tree = self.parse_query(&root)?;

        match self.look.kind {
            TokenKind::End => Ok(tree),
            TokenKind::Unterminated => Err(self
                .error(ErrorKind::InvalidSearchClause, self.look.start)
                .with_message("invalid search clause: unterminated quoted string")),
            _ => Err(self.error(ErrorKind::UnexpectedTrailingInput, self.look.start)),
        }
    }

    /// Parses: query → clause (BOOLEAN modifiers clause)*
    fn parse_query(&mut self, inherited: &Inherited) -> Result<CqlNode, CqlError> {
        let mut left = self.parse_search_clause(inherited)?;

        while let Some(op) = self.boolean_op() {
            let start = self.look.start;
            let mut end = self.look.end;
            self.advance();

            let modifiers = self.parse_modifiers()?;
            if let Some(last) = modifiers.last().and_then(|m| m.range.as_ref()) {
                end = last.end;
            }

            let right = self.parse_search_clause(inherited)?;
            left = CqlNode::Boolean(BooleanNode {
                op,
                modifiers,
                left: Box::new(left),
                right: Box::new(right),
                pos: Some(start),
                range: Some(start..end),
            });
        }

        Ok(left)
    }

    /// Parses one search clause, parenthesized query or prefix declaration.
    fn parse_search_clause(&mut self, inherited: &Inherited) -> Result<CqlNode, CqlError> {
        match self.look.kind {
            TokenKind::LParen => {
                let open = self.look.start;
                self.advance();
                let inner = Inherited {
                    start: None,
                    ..inherited.clone()
                };
                let node = self.parse_query(&inner)?;
                if self.look.kind != TokenKind::RParen {
                    return Err(self.error(ErrorKind::MissingClosingParen, open));
                }
                self.advance();
                Ok(node)
            }
            TokenKind::Bareword | TokenKind::Quoted => {
                let first = self.take();
                if self.at_relation() {
                    let relation = self.take();
                    let modifiers = self.parse_modifiers()?;
                    let next = Inherited {
                        field: first.text,
                        relation: relation.text,
                        modifiers,
                        start: Some(first.start),
                        relation_pos: Some(relation.start),
                    };
                    return self.parse_search_clause(&next);
                }
                self.finish_clause(first, inherited)
            }
            TokenKind::Comparison if self.look.text == ">" => self.parse_prefix(inherited),
            _ => Err(self.error(ErrorKind::InvalidSearchClause, self.look.start)),
        }
    }

    /// True if the lookahead, following a word, makes that word an index name.
    fn at_relation(&self) -> bool {
        match self.look.kind {
            TokenKind::Quoted | TokenKind::Comparison => true,
            TokenKind::Bareword => BooleanOp::from_keyword(&self.look.lower).is_none(),
            _ => false,
        }
    }

    /// Builds the clause for search term `term`.
    ///
    /// Modifiers written after the term join the inherited relation modifiers.
    fn finish_clause(&mut self, term: Token, inherited: &Inherited) -> Result<CqlNode, CqlError> {
        let mut modifiers = inherited.modifiers.clone();
        modifiers.extend(self.parse_modifiers()?);

        let (field, field_uri) = self.prefixes.resolve_field(&inherited.field);
        let (relation, relation_uri) = self.prefixes.resolve_relation(&inherited.relation);

        Ok(CqlNode::Clause(SearchClause {
            field,
            field_uri,
            relation,
            relation_uri,
            modifiers,
            server_choice_field: self.server_choice.field.clone(),
            server_choice_relation: self.server_choice.relation.clone(),
            pos: Some(inherited.start.unwrap_or(term.start)),
            range: Some(term.start..term.end),
            relation_pos: inherited.relation_pos,
            term: term.text,
        }))
    }

    /// Parses: ">" WORD ("=" WORD)? query
    fn parse_prefix(&mut self, inherited: &Inherited) -> Result<CqlNode, CqlError> {
        self.advance(); // consume >
        let first = self.expect_word(ErrorKind::ExpectingStringOrQuotedExpression)?;

        if self.look.is_comparison("=") {
            self.advance();
            let uri = self.expect_word(ErrorKind::ExpectingStringOrQuotedExpression)?;
            self.prefixes.insert(first.text, uri.text);
        } else {
            self.prefixes.insert(DEFAULT_PREFIX, first.text);
        }

        self.parse_query(inherited)
    }

    /// Parses: modifiers → ("/" WORD (COMPARISON WORD)?)*
    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>, CqlError> {
        let mut modifiers = Vec::new();

        while self.look.kind == TokenKind::Slash {
            let slash = self.look.start;
            self.advance();

            let name = self.expect_word(ErrorKind::InvalidModifier)?;
            let mut modifier = Modifier::flag(name.lower);
            modifier.pos = Some(name.start);
            let mut end = name.end;

            if self.look.kind == TokenKind::Comparison {
                let relation = self.take();
                let value = self.expect_word(ErrorKind::InvalidModifierRelation)?;
                end = value.end;
                modifier.relation = relation.text;
                modifier.value = value.text;
            }

            modifier.range = Some(slash..end);
            modifiers.push(modifier);
        }

        Ok(modifiers)
    }

    /// Returns the operator if the lookahead is a boolean keyword.
    fn boolean_op(&self) -> Option<BooleanOp> {
        if self.look.kind == TokenKind::Bareword {
            BooleanOp::from_keyword(&self.look.lower)
        } else {
            None
        }
    }

    /// Consumes a bareword or quoted string, failing with `kind` otherwise.
    fn expect_word(&mut self, kind: ErrorKind) -> Result<Token, CqlError> {
        if self.look.is_word() {
            Ok(self.take())
        } else {
            Err(self.error(kind, self.look.start))
        }
    }

    /// Consumes the lookahead and returns it.
    fn take(&mut self) -> Token {
        let next = self.lexer.next_token();
        mem::replace(&mut self.look, next)
    }

    /// Advances past the lookahead.
    fn advance(&mut self) {
        self.look = self.lexer.next_token();
    }

    /// Creates an error carrying the query and current lookahead.
    fn error(&self, kind: ErrorKind, position: usize) -> CqlError {
        CqlError::at_token(kind, position, &self.look).with_query(self.lexer.input())
    }
}

/// Parses a CQL query against the default server-choice field and relation.
pub fn parse(query: &str) -> Result<CqlNode, CqlError> {
    parse_with(query, &ServerChoice::default())
}

/// Parses a CQL query against the given server-choice defaults.
pub fn parse_with(query: &str, server_choice: &ServerChoice) -> Result<CqlNode, CqlError> {
    Parser::new(query, server_choice).parse()
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn clause(node: &CqlNode) -> &SearchClause {
        node.as_clause().expect("expected a search clause")
    }

    fn boolean(node: &CqlNode) -> &BooleanNode {
        node.as_boolean().expect("expected a boolean node")
    }

    fn kind(query: &str) -> ErrorKind {
        parse(query).unwrap_err().kind
    }

    #[test]
    fn empty_query() {
        assert_eq!(kind(""), ErrorKind::EmptyInput);
        assert_eq!(kind(" \t\n"), ErrorKind::EmptyInput);
    }

    #[test]
    fn single_term() {
        let tree = parse("fish").unwrap();
        let c = clause(&tree);
        assert_eq!(c.term, "fish");
        assert_eq!(c.field, "cql.serverChoice");
        assert_eq!(c.relation, "scr");
        assert_eq!(c.pos, Some(0));
        assert_eq!(c.range, Some(0..4));
        assert_eq!(c.relation_pos, None);
    }

    #[test]
    fn simple_and() {
        let tree = parse("computer and database").unwrap();
        let b = boolean(&tree);
        assert_eq!(b.op, BooleanOp::And);
        for (child, term) in [(&b.left, "computer"), (&b.right, "database")] {
            let c = clause(child);
            assert_eq!(c.term, term);
            assert_eq!(c.field, "cql.serverChoice");
            assert_eq!(c.relation, "scr");
        }
        assert_eq!(b.pos, Some(9));
        assert_eq!(b.range, Some(9..12));
    }

    #[test]
    fn index_relation_term() {
        let tree = parse("title any \"fish\"").unwrap();
        let c = clause(&tree);
        assert_eq!(c.field, "title");
        assert_eq!(c.relation, "any");
        assert_eq!(c.term, "fish");
        assert_eq!(c.pos, Some(0));
        assert_eq!(c.range, Some(10..16));
        assert_eq!(c.relation_pos, Some(6));
    }

    #[test]
    fn comparison_relation() {
        let tree = parse("date>=1990").unwrap();
        let c = clause(&tree);
        assert_eq!(c.field, "date");
        assert_eq!(c.relation, ">=");
        assert_eq!(c.term, "1990");
    }

    #[test]
    fn quoted_relation_word() {
        let tree = parse("title \"and\" fish").unwrap();
        let c = clause(&tree);
        assert_eq!(c.relation, "and");
        assert_eq!(c.term, "fish");
    }

    #[test]
    fn left_associative_chain() {
        let tree = parse("a and b and c").unwrap();
        let outer = boolean(&tree);
        assert_eq!(outer.op, BooleanOp::And);
        assert_eq!(clause(&outer.right).term, "c");
        let inner = boolean(&outer.left);
        assert_eq!(clause(&inner.left).term, "a");
        assert_eq!(clause(&inner.right).term, "b");
    }

    #[test]
    fn operators_share_precedence() {
        let tree = parse("a or b and c").unwrap();
        let outer = boolean(&tree);
        assert_eq!(outer.op, BooleanOp::And);
        assert_eq!(boolean(&outer.left).op, BooleanOp::Or);
    }

    #[test]
    fn keywords_ignore_case() {
        let tree = parse("a AND b Or c NOT d pRoX e").unwrap();
        assert_eq!(boolean(&tree).op, BooleanOp::Prox);
        assert_eq!(tree.to_cql(), "(((\"a\" AND \"b\") OR \"c\") NOT \"d\") PROX \"e\"");
    }

    #[test]
    fn term_case_preserved() {
        let tree = parse("Title ANY \"Fish Soup\"").unwrap();
        let c = clause(&tree);
        assert_eq!(c.field, "Title");
        assert_eq!(c.relation, "ANY");
        assert_eq!(c.term, "Fish Soup");
    }

    #[test]
    fn grouping() {
        let tree = parse("a and (b or c)").unwrap();
        let outer = boolean(&tree);
        assert_eq!(outer.op, BooleanOp::And);
        assert_eq!(boolean(&outer.right).op, BooleanOp::Or);
    }

    #[test]
    fn group_inherits_index() {
        let tree = parse("title any (a or b)").unwrap();
        let b = boolean(&tree);
        for child in [&b.left, &b.right] {
            let c = clause(child);
            assert_eq!(c.field, "title");
            assert_eq!(c.relation, "any");
            assert_eq!(c.relation_pos, Some(6));
        }
        assert_eq!(clause(&b.left).pos, Some(11));
    }

    #[test]
    fn group_inherits_modifiers() {
        let tree = parse("title =/stem (a or b)").unwrap();
        let b = boolean(&tree);
        assert_eq!(clause(&b.left).modifiers.len(), 1);
        assert_eq!(clause(&b.right).modifiers[0].name, "stem");
    }

    #[test]
    fn missing_closing_paren() {
        let err = parse("(a and b").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingClosingParen);
        assert_eq!(err.position, 0);
        assert_eq!(err.lookahead, TokenKind::End);
        assert_eq!(err.query.as_deref(), Some("(a and b"));
    }

    #[test]
    fn nested_missing_paren_anchored_at_inner_open() {
        let err = parse("x or ((a and b) or c").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingClosingParen);
        assert_eq!(err.position, 5);
    }

    #[test]
    fn relation_modifiers() {
        let tree = parse("title any/relevant/locale=fr fish").unwrap();
        let c = clause(&tree);
        assert_eq!(c.modifiers.len(), 2);
        assert_eq!(c.modifiers[0], Modifier {
            pos: Some(10),
            range: Some(9..18),
            ..Modifier::flag("relevant")
        });
        assert_eq!(c.modifiers[1].name, "locale");
        assert_eq!(c.modifiers[1].relation, "=");
        assert_eq!(c.modifiers[1].value, "fr");
        assert_eq!(c.modifiers[1].range, Some(18..28));
    }

    #[test]
    fn trailing_flag_modifier() {
        let tree = parse("title = \"x\" /relevant").unwrap();
        let c = clause(&tree);
        assert_eq!(c.term, "x");
        assert_eq!(c.modifiers.len(), 1);
        assert_eq!(c.modifiers[0].name, "relevant");
        assert_eq!(c.modifiers[0].relation, "");
        assert_eq!(c.modifiers[0].value, "");
    }

    #[test]
    fn modifier_names_lowercased_values_preserved() {
        let tree = parse("title any/Locale=FR fish").unwrap();
        let m = &clause(&tree).modifiers[0];
        assert_eq!(m.name, "locale");
        assert_eq!(m.value, "FR");
    }

    #[test]
    fn quoted_modifier_value() {
        let tree = parse("a prox/unit=\"word\" b").unwrap();
        let b = boolean(&tree);
        assert_eq!(b.modifiers[0].value, "word");
        assert_eq!(b.range, Some(2..18));
    }

    #[test]
    fn proximity_modifiers() {
        let tree = parse("a prox/distance<3/unit=word b").unwrap();
        let b = boolean(&tree);
        assert_eq!(b.op, BooleanOp::Prox);
        assert_eq!(b.modifiers.len(), 2);
        assert_eq!(b.modifiers[0].name, "distance");
        assert_eq!(b.modifiers[0].relation, "<");
        assert_eq!(b.modifiers[0].value, "3");
    }

    #[test]
    fn invalid_modifier() {
        let err = parse("title any/(x) fish").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidModifier);
        assert_eq!(err.position, 10);
        assert_eq!(kind("a and/) b"), ErrorKind::InvalidModifier);
        assert_eq!(kind("title any/"), ErrorKind::InvalidModifier);
    }

    #[test]
    fn invalid_modifier_relation() {
        let err = parse("title any/distance< (fish)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidModifierRelation);
        assert_eq!(err.position, 20);
        assert_eq!(err.lookahead, TokenKind::LParen);
    }

    #[test]
    fn prefix_declaration() {
        let tree = parse("> dc = \"http://purl.org/dc\" dc.title any \"fish\"").unwrap();
        let c = clause(&tree);
        assert_eq!(c.field, "title");
        assert_eq!(c.field_uri, "http://purl.org/dc");
        assert_eq!(c.relation, "any");
        assert_eq!(c.term, "fish");
    }

    #[test]
    fn unregistered_prefix_left_untouched() {
        let tree = parse("bath.title any fish").unwrap();
        let c = clause(&tree);
        assert_eq!(c.field, "bath.title");
        assert_eq!(c.field_uri, "");
    }

    #[test]
    fn prefix_overwrites() {
        let tree = parse("> dc = a > dc = b dc.title = x").unwrap();
        assert_eq!(clause(&tree).field_uri, "b");
    }

    #[test]
    fn default_prefix_does_not_apply_to_plain_fields() {
        let tree = parse("> \"http://example.org/set\" title any fish").unwrap();
        let c = clause(&tree);
        assert_eq!(c.field, "title");
        assert_eq!(c.field_uri, "");
    }

    #[test]
    fn prefix_scoped_to_one_parse() {
        parse("> dc = u dc.title = x").unwrap();
        let tree = parse("dc.title = x").unwrap();
        assert_eq!(clause(&tree).field, "dc.title");
    }

    #[test]
    fn prefix_inside_group() {
        let tree = parse("a and (> x = u x.f = b)").unwrap();
        let b = boolean(&tree);
        assert_eq!(clause(&b.right).field_uri, "u");
    }

    #[test]
    fn relation_prefix_not_substituted() {
        let tree = parse("> cql = info:cql > x = u title x.near fish").unwrap();
        let c = clause(&tree);
        assert_eq!(c.relation, "x.near");
        assert_eq!(c.relation_uri, "");
    }

    #[test]
    fn malformed_prefix() {
        assert_eq!(kind("> (a)"), ErrorKind::ExpectingStringOrQuotedExpression);
        assert_eq!(kind("> dc = / x"), ErrorKind::ExpectingStringOrQuotedExpression);
    }

    #[test]
    fn invalid_search_clause() {
        let err = parse("title any )").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSearchClause);
        assert_eq!(err.position, 10);
        assert_eq!(err.lookahead, TokenKind::RParen);

        assert_eq!(kind("a and"), ErrorKind::InvalidSearchClause);
        assert_eq!(kind("= x"), ErrorKind::InvalidSearchClause);
        assert_eq!(kind("title any"), ErrorKind::InvalidSearchClause);
    }

    #[test]
    fn two_words_is_incomplete_clause() {
        assert_eq!(kind("a b"), ErrorKind::InvalidSearchClause);
    }

    #[test]
    fn unterminated_quote() {
        let err = parse("\"abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSearchClause);
        assert_eq!(err.lookahead, TokenKind::Unterminated);

        assert_eq!(kind("title = \"abc"), ErrorKind::InvalidSearchClause);
        assert_eq!(kind("a \"abc"), ErrorKind::InvalidSearchClause);
    }

    #[test]
    fn trailing_input() {
        let err = parse("a and b ) c").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedTrailingInput);
        assert_eq!(err.position, 8);
        assert_eq!(err.token.as_deref(), Some(")"));
    }

    #[test]
    fn error_token_text() {
        let err = parse("title any/Foo< ) fish").unwrap_err();
        assert_eq!(err.token.as_deref(), Some(")"));
        let err = parse("a OR").unwrap_err();
        assert_eq!(err.lookahead, TokenKind::End);
        assert_eq!(err.token, None);
    }

    #[test]
    fn custom_server_choice() {
        let sc = ServerChoice::new("dc.anywhere", "all");
        let tree = parse_with("fish and title any cat", &sc).unwrap();
        let b = boolean(&tree);
        let left = clause(&b.left);
        assert_eq!(left.field, "dc.anywhere");
        assert_eq!(left.relation, "all");
        assert_eq!(left.server_choice_field, "dc.anywhere");
        assert_eq!(clause(&b.right).server_choice_relation, "all");
        assert_eq!(tree.to_cql(), "\"fish\" AND title any \"cat\"");
    }

    #[test]
    fn canonical_round_trip() {
        for query in [
            "computer and database",
            "title any \"fish\" or (a not b)",
            "a and b and c",
            "a and (b and c)",
            "date <= 1990 prox/distance<3/unit=word title = \"x y\"",
            "title any/relevant/locale=fr \"it's \\\"quoted\\\"\"",
            "fish /relevant",
        ] {
            let mut tree = parse(query).unwrap();
            let mut again = parse(&tree.to_cql()).unwrap();
            tree.strip_positions();
            again.strip_positions();
            assert_eq!(again, tree, "{query}");
        }
    }

    #[test]
    fn long_chain_is_iterative() {
        let query = vec!["x"; 2000].join(" and ");
        let tree = parse(&query).unwrap();
        let mut depth = 0;
        let mut node = &tree;
        while let Some(b) = node.as_boolean() {
            depth += 1;
            node = &b.left;
        }
        assert_eq!(depth, 1999);
    }

    #[test]
    fn performance_many_queries() {
        let queries = [
            "fish",
            "title any fish",
            "a and b or c not d",
            "> dc = \"http://purl.org/dc\" dc.title any/relevant \"fish soup\"",
            "(a or b) prox/distance<=2/unit=word (c or d)",
        ];

        let start = Instant::now();
        for _ in 0..1000 {
            for query in &queries {
                parse(query).unwrap();
            }
        }
        let elapsed = start.elapsed();

        assert!(
            elapsed.as_millis() < 2000,
            "Parsing 5,000 queries took {elapsed:?}, expected < 2s"
        );
    }
}
