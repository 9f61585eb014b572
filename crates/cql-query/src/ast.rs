//! CQL query tree.
//!
//! A parsed query is a binary tree: search clauses at the leaves, boolean
//! nodes combining two operands inside. The `Display` impl renders the
//! canonical CQL string.

use std::{fmt, mem, ops::Range};

use crate::{fq, xcql};

/// Index used when a clause names no field.
pub const DEFAULT_SERVER_CHOICE_FIELD: &str = "cql.serverChoice";

/// Relation used when a clause names no relation.
pub const DEFAULT_SERVER_CHOICE_RELATION: &str = "scr";

/// Characters that cannot appear in an unquoted word.
const WORD_BREAKS: &[char] = &['(', ')', '/', '<', '>', '=', ' ', '\t', '\r', '\n'];

/// The server-choice defaults a query is parsed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerChoice {
    /// Default index name.
    pub field: String,
    /// Default relation.
    pub relation: String,
}

impl ServerChoice {
    /// Creates server-choice defaults.
    pub fn new(field: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            relation: relation.into(),
        }
    }
}

impl Default for ServerChoice {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_CHOICE_FIELD, DEFAULT_SERVER_CHOICE_RELATION)
    }
}

/// Boolean and proximity operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `prox`
    Prox,
}

impl BooleanOp {
    /// Matches an operator keyword, ignoring case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        [Self::And, Self::Or, Self::Not, Self::Prox]
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(word))
    }

    /// Lowercase keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Prox => "prox",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `/name[relation value]` qualifier on a relation or boolean operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    /// Lowercased name.
    pub name: String,
    /// Comparison symbol, empty for a flag.
    pub relation: String,
    /// Value, empty for a flag.
    pub value: String,
    /// Byte offset of the name.
    pub pos: Option<usize>,
    /// Span from the `/` to the end of the name or value.
    pub range: Option<Range<usize>>,
}

impl Modifier {
    /// Creates a modifier with a relation and value. The name is lowercased.
    pub fn new(
        name: impl Into<String>,
        relation: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_lowercase(),
            relation: relation.into(),
            value: value.into(),
            pos: None,
            range: None,
        }
    }

    /// Creates a flag modifier with no relation or value.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, "", "")
    }

    /// True if this modifier carries no relation.
    pub fn is_flag(&self) -> bool {
        self.relation.is_empty()
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", Word(&self.name))?;
        if !self.is_flag() {
            write!(f, "{}{}", self.relation, Word(&self.value))?;
        }
        Ok(())
    }
}

/// A leaf: one index/relation/term triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClause {
    /// Index name, prefix stripped when the prefix resolved.
    pub field: String,
    /// URI of the field's resolved prefix, empty if none.
    pub field_uri: String,
    /// Relation symbol or word.
    pub relation: String,
    /// Always empty; relation prefixes are never substituted.
    pub relation_uri: String,
    /// Relation modifiers.
    pub modifiers: Vec<Modifier>,
    /// The search value.
    pub term: String,
    /// Server-choice field this clause was parsed against.
    pub server_choice_field: String,
    /// Server-choice relation this clause was parsed against.
    pub server_choice_relation: String,
    /// Byte offset where the clause starts.
    pub pos: Option<usize>,
    /// Span of the term token.
    pub range: Option<Range<usize>>,
    /// Byte offset of the relation token, when one was written.
    pub relation_pos: Option<usize>,
}

impl SearchClause {
    /// Creates a clause for `term` using the server-choice field and relation.
    pub fn new(term: impl Into<String>, server_choice: &ServerChoice) -> Self {
        Self {
            field: server_choice.field.clone(),
            field_uri: String::new(),
            relation: server_choice.relation.clone(),
            relation_uri: String::new(),
            modifiers: Vec::new(),
            term: term.into(),
            server_choice_field: server_choice.field.clone(),
            server_choice_relation: server_choice.relation.clone(),
            pos: None,
            range: None,
            relation_pos: None,
        }
    }

    /// Sets an explicit field and relation.
    pub fn with_index(mut self, field: impl Into<String>, relation: impl Into<String>) -> Self {
        self.field = field.into();
        self.relation = relation.into();
        self
    }

    /// Appends a modifier.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// True if the field differs from the server-choice field.
    pub fn has_explicit_field(&self) -> bool {
        self.field != self.server_choice_field
    }

    /// True if the relation differs from the server-choice relation.
    pub fn has_explicit_relation(&self) -> bool {
        self.relation != self.server_choice_relation
    }
}

/// An internal node combining two operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanNode {
    /// The operator.
    pub op: BooleanOp,
    /// Operator modifiers (proximity parameters).
    pub modifiers: Vec<Modifier>,
    /// Left operand.
    pub left: Box<CqlNode>,
    /// Right operand.
    pub right: Box<CqlNode>,
    /// Byte offset of the operator.
    pub pos: Option<usize>,
    /// Span of the operator and its modifiers.
    pub range: Option<Range<usize>>,
}

impl BooleanNode {
    /// Creates a node without modifiers.
    pub fn new(op: BooleanOp, left: CqlNode, right: CqlNode) -> Self {
        Self {
            op,
            modifiers: Vec::new(),
            left: Box::new(left),
            right: Box::new(right),
            pos: None,
            range: None,
        }
    }

    /// Appends a modifier.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

/// Drops the subtree with an explicit stack, so long chains do not recurse.
impl Drop for BooleanNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_boolean_children(self, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_boolean_children(&mut node, &mut pending);
        }
    }
}

/// Moves the boolean operands of `node` onto `pending`, leaving empty clauses.
fn detach_boolean_children(node: &mut BooleanNode, pending: &mut Vec<BooleanNode>) {
    for child in [&mut node.left, &mut node.right] {
        if !matches!(**child, CqlNode::Boolean(_)) {
            continue;
        }
        let detached = mem::replace(&mut **child, CqlNode::Clause(empty_clause()));
        if let CqlNode::Boolean(inner) = detached {
            pending.push(inner);
        }
    }
}

/// A clause with no content, used as a placeholder while dropping.
fn empty_clause() -> SearchClause {
    SearchClause {
        field: String::new(),
        field_uri: String::new(),
        relation: String::new(),
        relation_uri: String::new(),
        modifiers: Vec::new(),
        term: String::new(),
        server_choice_field: String::new(),
        server_choice_relation: String::new(),
        pos: None,
        range: None,
        relation_pos: None,
    }
}

/// A node of the query tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlNode {
    /// A search clause leaf.
    Clause(SearchClause),
    /// A boolean node.
    Boolean(BooleanNode),
}

impl CqlNode {
    /// Returns the clause if this is a leaf.
    pub fn as_clause(&self) -> Option<&SearchClause> {
        match self {
            Self::Clause(clause) => Some(clause),
            Self::Boolean(_) => None,
        }
    }

    /// Returns the boolean node if this is an internal node.
    pub fn as_boolean(&self) -> Option<&BooleanNode> {
        match self {
            Self::Boolean(node) => Some(node),
            Self::Clause(_) => None,
        }
    }

    /// Byte offset recorded for this node.
    pub fn pos(&self) -> Option<usize> {
        match self {
            Self::Clause(clause) => clause.pos,
            Self::Boolean(node) => node.pos,
        }
    }

    /// Clears every position and range in the tree.
    pub fn strip_positions(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            let modifiers = match node {
                Self::Clause(clause) => {
                    clause.pos = None;
                    clause.range = None;
                    clause.relation_pos = None;
                    &mut clause.modifiers
                }
                Self::Boolean(boolean) => {
                    boolean.pos = None;
                    boolean.range = None;
                    stack.push(&mut boolean.left);
                    stack.push(&mut boolean.right);
                    &mut boolean.modifiers
                }
            };
            for modifier in modifiers {
                modifier.pos = None;
                modifier.range = None;
            }
        }
    }

    /// Renders XCQL indented with spaces.
    pub fn to_xcql(&self) -> String {
        self.to_xcql_with(' ')
    }

    /// Renders XCQL, one `indent_char` per nesting level.
    pub fn to_xcql_with(&self, indent_char: char) -> String {
        xcql::render(self, indent_char)
    }

    /// Renders FQ with two-space indentation and `\n` newlines.
    pub fn to_fq(&self) -> String {
        self.to_fq_with(fq::DEFAULT_INDENT, fq::DEFAULT_NEWLINE)
    }

    /// Renders FQ with the given indent unit and newline strings.
    pub fn to_fq_with(&self, indent: &str, newline: &str) -> String {
        fq::render(self, indent, newline)
    }

    /// Renders the canonical CQL string.
    pub fn to_cql(&self) -> String {
        self.to_string()
    }

    /// Writes one operand of a boolean node, parenthesized if it is itself boolean.
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(_) => write!(f, "({self})"),
            Self::Clause(_) => write!(f, "{self}"),
        }
    }
}

impl From<SearchClause> for CqlNode {
    fn from(clause: SearchClause) -> Self {
        Self::Clause(clause)
    }
}

impl From<BooleanNode> for CqlNode {
    fn from(node: BooleanNode) -> Self {
        Self::Boolean(node)
    }
}

impl fmt::Display for CqlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clause(clause) => {
                if clause.has_explicit_field()
                    || clause.has_explicit_relation()
                    || !clause.modifiers.is_empty()
                {
                    write!(f, "{} ", Word(&clause.field))?;
                    if is_symbol(&clause.relation) {
                        f.write_str(&clause.relation)?;
                    } else {
                        write!(f, "{}", Word(&clause.relation))?;
                    }
                    for modifier in &clause.modifiers {
                        write!(f, "{modifier}")?;
                    }
                    f.write_str(" ")?;
                }
                write_quoted(f, &clause.term)
            }
            Self::Boolean(node) => {
                // Walk the left spine in a loop, opening its parentheses up front.
                let mut spine = vec![node];
                let mut leftmost: &Self = &node.left;
                while let Self::Boolean(inner) = leftmost {
                    spine.push(inner);
                    leftmost = &inner.left;
                }
                for _ in 1..spine.len() {
                    f.write_str("(")?;
                }
                write!(f, "{leftmost}")?;
                for (depth, boolean) in spine.iter().enumerate().rev() {
                    write!(f, " {}", boolean.op.as_str().to_uppercase())?;
                    for modifier in &boolean.modifiers {
                        write!(f, "{modifier}")?;
                    }
                    f.write_str(" ")?;
                    boolean.right.fmt_operand(f)?;
                    if depth > 0 {
                        f.write_str(")")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Displays a word bare when it re-tokenizes as one bareword, quoted otherwise.
struct Word<'a>(&'a str);

impl fmt::Display for Word<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.0;
        let needs_quotes = word.is_empty()
            || word.starts_with(['"', '\''])
            || word.contains(WORD_BREAKS)
            || BooleanOp::from_keyword(word).is_some();
        if needs_quotes {
            write_quoted(f, word)
        } else {
            f.write_str(word)
        }
    }
}

/// True if `relation` is a run of comparison characters.
fn is_symbol(relation: &str) -> bool {
    !relation.is_empty() && relation.chars().all(|c| matches!(c, '<' | '>' | '='))
}

/// Writes `text` in double quotes, escaping quotes and backslashes.
fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{ch}")?;
    }
    f.write_str("\"")
}
