//! XCQL rendering: the XML form of a query tree.

use std::iter;

use crate::ast::{BooleanNode, CqlNode, Modifier, SearchClause};

/// Renders `node` as XCQL with one `indent_char` per nesting level.
pub(crate) fn render(node: &CqlNode, indent_char: char) -> String {
    let mut out = Writer {
        out: String::new(),
        indent_char,
    };
    out.node(node, 0);
    out.out
}

/// Accumulates XCQL output.
struct Writer {
    /// Rendered text.
    out: String,
    /// Character repeated once per indent level.
    indent_char: char,
}

impl Writer {
    /// Writes one indented line.
    fn line(&mut self, level: usize, text: &str) {
        self.out.extend(iter::repeat_n(self.indent_char, level));
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Writes `<tag>text</tag>` on one line, escaping the text.
    fn element(&mut self, level: usize, tag: &str, text: &str) {
        self.line(level, &format!("<{tag}>{}</{tag}>", escape(text)));
    }

    /// Writes a node at `level`.
    ///
    /// Left operands are followed in a loop, so long chains do not recurse.
    fn node(&mut self, node: &CqlNode, level: usize) {
        let mut spine: Vec<&BooleanNode> = Vec::new();
        let mut current = node;
        while let CqlNode::Boolean(boolean) = current {
            self.open_triple(boolean, level + 2 * spine.len());
            spine.push(boolean);
            current = &boolean.left;
        }
        if let CqlNode::Clause(clause) = current {
            self.clause(clause, level + 2 * spine.len());
        }
        for (depth, boolean) in spine.iter().enumerate().rev() {
            self.close_triple(boolean, level + 2 * depth);
        }
    }

    /// Writes a `<searchClause>`.
    fn clause(&mut self, clause: &SearchClause, level: usize) {
        self.line(level, "<searchClause>");
        if !clause.field_uri.is_empty() {
            self.line(level + 1, "<prefixes>");
            self.line(level + 2, "<prefix>");
            self.element(level + 3, "identifier", &clause.field_uri);
            self.line(level + 2, "</prefix>");
            self.line(level + 1, "</prefixes>");
        }
        self.element(level + 1, "index", &clause.field);
        self.line(level + 1, "<relation>");
        if !clause.relation_uri.is_empty() {
            self.element(level + 2, "identifier", &clause.relation_uri);
        }
        self.element(level + 2, "value", &clause.relation);
        self.modifiers(&clause.modifiers, level + 2);
        self.line(level + 1, "</relation>");
        self.element(level + 1, "term", &clause.term);
        self.line(level, "</searchClause>");
    }

    /// Opens a `<triple>` up to the start of its left operand.
    fn open_triple(&mut self, node: &BooleanNode, level: usize) {
        self.line(level, "<triple>");
        self.line(level + 1, "<boolean>");
        self.element(level + 2, "value", node.op.as_str());
        self.modifiers(&node.modifiers, level + 2);
        self.line(level + 1, "</boolean>");
        self.line(level + 1, "<leftOperand>");
    }

    /// Closes a `<triple>` after its left operand, writing the right one.
    fn close_triple(&mut self, node: &BooleanNode, level: usize) {
        self.line(level + 1, "</leftOperand>");
        self.line(level + 1, "<rightOperand>");
        self.node(&node.right, level + 2);
        self.line(level + 1, "</rightOperand>");
        self.line(level, "</triple>");
    }

    /// Writes a `<modifiers>` block, or nothing when empty.
    fn modifiers(&mut self, modifiers: &[Modifier], level: usize) {
        if modifiers.is_empty() {
            return;
        }
        self.line(level, "<modifiers>");
        for modifier in modifiers {
            self.line(level + 1, "<modifier>");
            self.element(level + 2, "name", &modifier.name);
            if !modifier.relation.is_empty() {
                self.element(level + 2, "relation", &modifier.relation);
            }
            if !modifier.value.is_empty() {
                self.element(level + 2, "value", &modifier.value);
            }
            self.line(level + 1, "</modifier>");
        }
        self.line(level, "</modifiers>");
    }
}

/// Escapes XML text content.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
