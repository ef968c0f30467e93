//! Tokenizer for nginx configuration files.
//!
//! Converts source text into a stream of [`Token`]s. Use [`Lexer::new`] to
//! create a lexer and call [`scan`](Lexer::scan) repeatedly; after the input
//! is exhausted every call returns an [`Eof`](TokenKind::Eof) token.
//!
//! The lexer is context sensitive in one place: scanning a keyword ending in
//! `_by_lua_block` arms a capture mode, and the block that follows is
//! consumed verbatim (brace-counted) into a single [`LuaCode`](TokenKind::LuaCode)
//! token instead of being tokenized as nginx syntax. The capture has to be
//! armed here rather than by the parser because the parser keeps a two-token
//! lookahead: by the time it recognizes the directive name, the lexer has
//! already scanned past the opening brace.

use crate::error::LexerError;

/// Token types for nginx configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: directive name or unquoted parameter.
    Keyword,
    /// Single- or double-quoted string; the literal keeps the quotes and
    /// escape sequences exactly as written.
    QuotedString,
    /// Comment; the literal includes the leading `#`.
    Comment,
    /// Semicolon `;`.
    Semicolon,
    /// Opening brace `{`.
    BlockStart,
    /// Closing brace `}`.
    BlockEnd,
    /// Newline.
    EndOfLine,
    /// End of file.
    Eof,
    /// A token the lexer could not finish scanning (see the sticky error).
    Illegal,
    /// Verbatim Lua code captured from a `*_by_lua_block` body.
    LuaCode,
}

impl TokenKind {
    /// Whether a token of this kind may appear in parameter position.
    ///
    /// `BlockEnd` is included: nginx tolerates a dangling `}` in parameter
    /// position, and the parser records it as a literal `}` parameter.
    pub fn is_parameter_eligible(&self) -> bool {
        matches!(
            self,
            TokenKind::Keyword | TokenKind::QuotedString | TokenKind::BlockEnd
        )
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "Keyword",
            TokenKind::QuotedString => "QuotedString",
            TokenKind::Comment => "Comment",
            TokenKind::Semicolon => "Semicolon",
            TokenKind::BlockStart => "BlockStart",
            TokenKind::BlockEnd => "BlockEnd",
            TokenKind::EndOfLine => "EndOfLine",
            TokenKind::Eof => "Eof",
            TokenKind::Illegal => "Illegal",
            TokenKind::LuaCode => "LuaCode",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A token with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of this token.
    pub kind: TokenKind,
    /// Source text of the token (quotes and escapes preserved).
    pub literal: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub column: usize,
}

impl Token {
    pub(crate) fn is(&self, kind: &TokenKind) -> bool {
        self.kind == *kind
    }
}

/// Streaming lexer for nginx configuration files.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    /// Last scanned keyword ended with `_by_lua_block`.
    lua_pending: bool,
    /// The next scan consumes the block body verbatim.
    lua_capture: bool,
    error: Option<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            lua_pending: false,
            lua_capture: false,
            error: None,
        }
    }

    /// The sticky lexer error, if any.
    pub fn error(&self) -> Option<&LexerError> {
        self.error.as_ref()
    }

    /// Takes the sticky lexer error, leaving `None` behind.
    pub fn take_error(&mut self) -> Option<LexerError> {
        self.error.take()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn advance(&mut self) -> Option<char> {
        let (idx, ch) = self.chars.next()?;
        self.offset = idx + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
    }

    /// Scans the next token.
    pub fn scan(&mut self) -> Token {
        if self.lua_capture {
            return self.scan_lua_code();
        }

        self.skip_inline_whitespace();

        let line = self.line;
        let column = self.column;
        let start = self.offset;

        let Some(ch) = self.peek() else {
            return Token {
                kind: TokenKind::Eof,
                literal: String::new(),
                line,
                column,
            };
        };

        let token = match ch {
            '\n' => {
                self.advance();
                self.token(TokenKind::EndOfLine, start, line, column)
            }
            ';' => {
                self.advance();
                self.token(TokenKind::Semicolon, start, line, column)
            }
            '{' => {
                self.advance();
                self.token(TokenKind::BlockStart, start, line, column)
            }
            '}' => {
                self.advance();
                self.token(TokenKind::BlockEnd, start, line, column)
            }
            '#' => self.scan_comment(start, line, column),
            '"' | '\'' => self.scan_quoted(ch, start, line, column),
            _ => self.scan_keyword(start, line, column),
        };

        match token.kind {
            TokenKind::Keyword => {
                // Parameters between the name and the brace (e.g.
                // `set_by_lua_block $res { … }`) keep the capture armed.
                if token.literal.ends_with("_by_lua_block") {
                    self.lua_pending = true;
                }
            }
            TokenKind::BlockStart => {
                if self.lua_pending {
                    self.lua_capture = true;
                    self.lua_pending = false;
                }
            }
            TokenKind::Semicolon | TokenKind::BlockEnd => self.lua_pending = false,
            _ => {}
        }

        token
    }

    fn token(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        Token {
            kind,
            literal: self.source[start..self.offset].to_string(),
            line,
            column,
        }
    }

    fn scan_comment(&mut self, start: usize, line: usize, column: usize) -> Token {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Comment, start, line, column)
    }

    fn scan_quoted(&mut self, quote: char, start: usize, line: usize, column: usize) -> Token {
        self.advance(); // opening quote
        loop {
            match self.peek() {
                None => {
                    self.error = Some(LexerError::UnterminatedString { line, column });
                    return self.token(TokenKind::Illegal, start, line, column);
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return self.token(TokenKind::QuotedString, start, line, column);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn scan_keyword(&mut self, start: usize, line: usize, column: usize) -> Token {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' | '\n' | ';' | '{' | '}' | '"' | '\'' => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::Keyword, start, line, column)
    }

    /// Consumes the body of a `*_by_lua_block` verbatim.
    ///
    /// Braces are counted so nested Lua tables and blocks survive; the
    /// balancing `}` is left in the stream and scanned as a normal
    /// [`BlockEnd`](TokenKind::BlockEnd). Braces inside Lua string literals
    /// are counted too, matching nginx's own block scanning.
    fn scan_lua_code(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let start = self.offset;
        let mut depth = 1usize;

        loop {
            match self.peek() {
                Some('{') => {
                    depth += 1;
                    self.advance();
                }
                Some('}') => {
                    if depth == 1 {
                        break;
                    }
                    depth -= 1;
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
                None => break,
            }
        }

        self.lua_capture = false;
        self.token(TokenKind::LuaCode, start, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.scan();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push((token.kind, token.literal));
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_simple_directive() {
        assert_eq!(
            tokenize("listen 80;"),
            vec![
                (TokenKind::Keyword, "listen".to_string()),
                (TokenKind::Keyword, "80".to_string()),
                (TokenKind::Semicolon, ";".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_block() {
        assert_eq!(
            kinds("http { }"),
            vec![
                TokenKind::Keyword,
                TokenKind::BlockStart,
                TokenKind::BlockEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_strings_keep_quotes() {
        assert_eq!(
            tokenize(r#"return 200 "hello world";"#),
            vec![
                (TokenKind::Keyword, "return".to_string()),
                (TokenKind::Keyword, "200".to_string()),
                (TokenKind::QuotedString, "\"hello world\"".to_string()),
                (TokenKind::Semicolon, ";".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );

        assert_eq!(
            tokenize("log_format main '$remote_addr';"),
            vec![
                (TokenKind::Keyword, "log_format".to_string()),
                (TokenKind::Keyword, "main".to_string()),
                (TokenKind::QuotedString, "'$remote_addr'".to_string()),
                (TokenKind::Semicolon, ";".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_escape_sequences_preserved() {
        assert_eq!(
            tokenize(r#"add_header X "a \"b\"";"#)[2],
            (TokenKind::QuotedString, r#""a \"b\"""#.to_string())
        );
    }

    #[test]
    fn test_comment_includes_hash() {
        assert_eq!(
            tokenize("# this is a comment\nlisten 80;")[0],
            (TokenKind::Comment, "# this is a comment".to_string())
        );
    }

    #[test]
    fn test_inline_comment_after_semicolon() {
        assert_eq!(
            tokenize("listen 80; # keep")[3],
            (TokenKind::Comment, "# keep".to_string())
        );
    }

    #[test]
    fn test_hash_inside_word_is_not_a_comment() {
        assert_eq!(
            tokenize("location ~* foo#bar {")[2],
            (TokenKind::Keyword, "foo#bar".to_string())
        );
    }

    #[test]
    fn test_glob_pattern_argument() {
        assert_eq!(
            tokenize("include /etc/nginx/conf.d/*.conf;")[1],
            (TokenKind::Keyword, "/etc/nginx/conf.d/*.conf".to_string())
        );
    }

    #[test]
    fn test_utf8_comment() {
        assert_eq!(
            tokenize("# これは日本語コメント\nlisten 80;")[0],
            (TokenKind::Comment, "# これは日本語コメント".to_string())
        );
    }

    #[test]
    fn test_newlines_emit_end_of_line() {
        assert_eq!(
            kinds("a;\nb;"),
            vec![
                TokenKind::Keyword,
                TokenKind::Semicolon,
                TokenKind::EndOfLine,
                TokenKind::Keyword,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_position_tracking() {
        let mut lexer = Lexer::new("http {\n    listen 80;\n}");
        let http = lexer.scan();
        assert_eq!((http.line, http.column), (1, 1));
        let brace = lexer.scan();
        assert_eq!((brace.line, brace.column), (1, 6));
        let eol = lexer.scan();
        assert_eq!(eol.kind, TokenKind::EndOfLine);
        let listen = lexer.scan();
        assert_eq!((listen.line, listen.column), (2, 5));
    }

    #[test]
    fn test_unterminated_string_is_sticky() {
        let mut lexer = Lexer::new("return \"unclosed");
        assert_eq!(lexer.scan().kind, TokenKind::Keyword);
        assert_eq!(lexer.scan().kind, TokenKind::Illegal);
        assert_eq!(
            lexer.error(),
            Some(&LexerError::UnterminatedString { line: 1, column: 8 })
        );
        assert_eq!(lexer.scan().kind, TokenKind::Eof);
    }

    #[test]
    fn test_eof_is_repeatable() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.scan().kind, TokenKind::Eof);
        assert_eq!(lexer.scan().kind, TokenKind::Eof);
    }

    #[test]
    fn test_lua_block_captured_verbatim() {
        let source = "content_by_lua_block {\n    ngx.say({1, 2})\n}";
        let tokens = tokenize(source);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Keyword, "content_by_lua_block".to_string()),
                (TokenKind::BlockStart, "{".to_string()),
                (TokenKind::LuaCode, "\n    ngx.say({1, 2})\n".to_string()),
                (TokenKind::BlockEnd, "}".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_lua_capture_only_for_lua_suffix() {
        let tokens = tokenize("server { listen 80; }");
        assert!(tokens.iter().all(|(k, _)| *k != TokenKind::LuaCode));
    }

    #[test]
    fn test_lua_capture_unterminated() {
        let tokens = tokenize("content_by_lua_block { ngx.say(1)");
        assert_eq!(tokens[2].0, TokenKind::LuaCode);
        assert_eq!(tokens[3].0, TokenKind::Eof);
    }

    #[test]
    fn test_lua_capture_survives_parameter_before_brace() {
        let tokens = tokenize("set_by_lua_block $res { return 1 }");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Keyword, "set_by_lua_block".to_string()),
                (TokenKind::Keyword, "$res".to_string()),
                (TokenKind::BlockStart, "{".to_string()),
                (TokenKind::LuaCode, " return 1 ".to_string()),
                (TokenKind::BlockEnd, "}".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_lua_capture_disarmed_by_semicolon() {
        let tokens = tokenize("content_by_lua_block;\nserver { listen 80; }");
        assert!(tokens.iter().all(|(k, _)| *k != TokenKind::LuaCode));
    }

    #[test]
    fn test_lua_capture_survives_newline_before_brace() {
        let tokens = tokenize("init_by_lua_block\n{ x = 1 }");
        assert_eq!(tokens[0].0, TokenKind::Keyword);
        assert_eq!(tokens[1].0, TokenKind::EndOfLine);
        assert_eq!(tokens[2].0, TokenKind::BlockStart);
        assert_eq!(tokens[3], (TokenKind::LuaCode, " x = 1 ".to_string()));
    }
}
