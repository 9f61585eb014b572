//! CQL lexer (tokenizer).
//!
//! Pull-based: the parser asks for one token at a time and keeps a single
//! token of lookahead.

/// Characters skipped between tokens.
const WHITESPACE: &[char] = &[' ', '\t', '\r', '\n'];

/// Characters that combine into a comparison token.
const COMPARISON_CHARS: &[char] = &['<', '>', '='];

/// Characters that end a bareword.
const BAREWORD_TERMINATORS: &[char] = &['(', ')', '/', '<', '>', '=', ' ', '\t', '\r', '\n'];

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `/`, introduces a modifier.
    Slash,
    /// One or more of `<`, `>`, `=`.
    Comparison,
    /// An unquoted word.
    Bareword,
    /// A quoted string, quotes stripped and escapes resolved.
    Quoted,
    /// End of input.
    End,
    /// A quoted string that reached end of input before its closing quote.
    Unterminated,
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical category.
    pub kind: TokenKind,
    /// Raw text, preserving case.
    pub text: String,
    /// Lowercased text for case-insensitive matching.
    pub lower: String,
    /// Byte offset where the token starts.
    pub start: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

impl Token {
    /// Creates a token, deriving the lowercase form.
    fn new(kind: TokenKind, text: String, start: usize, end: usize) -> Self {
        let lower = text.to_lowercase();
        Self {
            kind,
            text,
            lower,
            start,
            end,
        }
    }

    /// True for barewords and quoted strings, the tokens that can name things.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Bareword | TokenKind::Quoted)
    }

    /// True if this is a comparison token with exactly the given symbol.
    pub fn is_comparison(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Comparison && self.text == symbol
    }

    /// True unless this is the end-of-input marker.
    pub(crate) fn carries_text(&self) -> bool {
        self.kind != TokenKind::End
    }
}

/// Scans a query string into tokens.
pub struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Returns the original input.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Current byte position in the input.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Scans and returns the next token. Returns `End` repeatedly once the
    /// input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::End, String::new(), start, start);
        };

        match ch {
            '(' | ')' | '/' => {
                self.advance();
                let kind = match ch {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    _ => TokenKind::Slash,
                };
                Token::new(kind, ch.to_string(), start, self.position)
            }
            '<' | '>' | '=' => self.read_comparison(start),
            '"' | '\'' => self.read_quoted(ch, start),
            _ => self.read_bareword(start),
        }
    }

    /// Reads a run of comparison characters as one token.
    fn read_comparison(&mut self, start: usize) -> Token {
        while self.peek().is_some_and(|c| COMPARISON_CHARS.contains(&c)) {
            self.advance();
        }
        let text = self.input[start..self.position].to_string();
        Token::new(TokenKind::Comparison, text, start, self.position)
    }

    /// Reads a quoted string closed by `mark`, resolving backslash escapes.
    fn read_quoted(&mut self, mark: char, start: usize) -> Token {
        self.advance(); // opening quote

        let mut content = String::new();
        loop {
            match self.peek() {
                Some(c) if c == mark => {
                    self.advance();
                    return Token::new(TokenKind::Quoted, content, start, self.position);
                }
                Some('\\') => {
                    self.advance();
                    // A trailing backslash stays literal.
                    match self.peek() {
                        Some(escaped) => {
                            content.push(escaped);
                            self.advance();
                        }
                        None => content.push('\\'),
                    }
                }
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
                None => {
                    return Token::new(TokenKind::Unterminated, content, start, self.position);
                }
            }
        }
    }

    /// Reads an unquoted word.
    fn read_bareword(&mut self, start: usize) -> Token {
        while self
            .peek()
            .is_some_and(|c| !BAREWORD_TERMINATORS.contains(&c))
        {
            self.advance();
        }
        let text = self.input[start..self.position].to_string();
        Token::new(TokenKind::Bareword, text, start, self.position)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| WHITESPACE.contains(&c)) {
            self.advance();
        }
    }

    /// Returns the character at the current position.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Advances past the current character.
    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a whole query string, excluding the end-of-input marker.
///
/// An unterminated quoted string is returned as the final token.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::End => break,
            TokenKind::Unterminated => {
                tokens.push(token);
                break;
            }
            _ => tokens.push(token),
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t\r\n ").is_empty());
    }

    #[test]
    fn end_is_sticky() {
        let mut lexer = Lexer::new("a");
        assert_eq!(lexer.next_token().kind, TokenKind::Bareword);
        assert_eq!(lexer.next_token().kind, TokenKind::End);
        assert_eq!(lexer.next_token().kind, TokenKind::End);
    }

    #[test]
    fn separators() {
        assert_eq!(
            kinds("( ) /"),
            vec![TokenKind::LParen, TokenKind::RParen, TokenKind::Slash]
        );
    }

    #[test]
    fn comparison_runs() {
        assert_eq!(texts("a<=b"), vec!["a", "<=", "b"]);
        assert_eq!(
            kinds("a<=b"),
            vec![
                TokenKind::Bareword,
                TokenKind::Comparison,
                TokenKind::Bareword
            ]
        );
        assert_eq!(texts("<> >= == ="), vec!["<>", ">=", "==", "="]);
    }

    #[test]
    fn bareword_stops_at_terminators() {
        assert_eq!(
            texts("dc.title=x/y(z)"),
            vec!["dc.title", "=", "x", "/", "y", "(", "z", ")"]
        );
    }

    #[test]
    fn quote_inside_bareword_is_literal() {
        assert_eq!(texts("it's"), vec!["it's"]);
    }

    #[test]
    fn double_and_single_quotes() {
        let tokens = tokenize("\"fish soup\" 'it\"s'");
        assert_eq!(tokens[0].kind, TokenKind::Quoted);
        assert_eq!(tokens[0].text, "fish soup");
        assert_eq!(tokens[1].kind, TokenKind::Quoted);
        assert_eq!(tokens[1].text, "it\"s");
    }

    #[test]
    fn backslash_escape() {
        let tokens = tokenize(r#""say \"hi\" \\ now""#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, r#"say "hi" \ now"#);
    }

    #[test]
    fn unterminated_quote() {
        let tokens = tokenize("title = \"fish");
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Unterminated);
        assert_eq!(last.text, "fish");
        assert_eq!(last.start, 8);
    }

    #[test]
    fn trailing_backslash_kept() {
        let tokens = tokenize("\"abc\\");
        assert_eq!(tokens[0].kind, TokenKind::Unterminated);
        assert_eq!(tokens[0].text, "abc\\");
    }

    #[test]
    fn lowercase_form() {
        let tokens = tokenize("AND \"Mixed Case\"");
        assert_eq!(tokens[0].text, "AND");
        assert_eq!(tokens[0].lower, "and");
        assert_eq!(tokens[1].lower, "mixed case");
    }

    #[test]
    fn spans() {
        let tokens = tokenize("  title any \"x\"");
        assert_eq!((tokens[0].start, tokens[0].end), (2, 7));
        assert_eq!((tokens[1].start, tokens[1].end), (8, 11));
        assert_eq!((tokens[2].start, tokens[2].end), (12, 15));
    }

    #[test]
    fn multibyte_words() {
        assert_eq!(texts("café = naïve"), vec!["café", "=", "naïve"]);
    }
}
