use crate::error::{byte_offset_to_line, LangError, LangResult, Location};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: std::ops::Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Digits with an optional leading minus, kept as written.
    Number(String),
    Symbol(String),
    /// The literal including its quotes, escapes untouched.
    String(String),
    Comment(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Eof,
}

pub fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '_' | '+' | '-' | '*' | '/' | '\\' | '=' | '<' | '>' | '!' | '&' | '%' | '^'
        )
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    input: &'a str,
    current_index: usize,
    file_path: PathBuf,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_file(input, PathBuf::from("<stdin>"))
    }

    pub fn with_file(input: &'a str, file_path: PathBuf) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            input,
            current_index: 0,
            file_path,
        }
    }

    fn error_with_location(&self, msg: String, byte_offset: usize) -> LangError {
        let line = byte_offset_to_line(self.input, byte_offset);
        let location = Some(Location::new(self.file_path.clone(), line));
        LangError::Lexer(msg, location)
    }

    pub fn lex(mut self) -> LangResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
                continue;
            }

            let start = self.current_index;
            let kind = match ch {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ';' => self.read_comment(),
                '"' => self.read_string(start)?,
                c if c.is_ascii_digit() || (c == '-' && self.next_is_digit()) => {
                    self.read_number()
                }
                c if is_symbol_char(c) => self.read_symbol(),
                other => {
                    return Err(self.error_with_location(
                        format!("Unexpected character '{}' at {}", other, start),
                        start,
                    ))
                }
            };
            tokens.push(Token {
                kind,
                span: start..self.current_index,
            });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: self.current_index..self.current_index,
        });
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_char();
        kind
    }

    fn read_number(&mut self) -> TokenKind {
        let mut text = String::new();
        if self.peek_char() == Some('-') {
            self.advance_char();
            text.push('-');
        }
        while let Some(ch) = self.peek_char().filter(char::is_ascii_digit) {
            self.advance_char();
            text.push(ch);
        }
        TokenKind::Number(text)
    }

    fn read_symbol(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(ch) = self.peek_char().filter(|c| is_symbol_char(*c)) {
            self.advance_char();
            text.push(ch);
        }
        TokenKind::Symbol(text)
    }

    fn read_comment(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(ch) = self.peek_char().filter(|c| *c != '\n' && *c != '\r') {
            self.advance_char();
            text.push(ch);
        }
        TokenKind::Comment(text)
    }

    fn read_string(&mut self, start: usize) -> LangResult<TokenKind> {
        let mut text = String::new();
        // Opening quote
        self.advance_char();
        text.push('"');
        loop {
            match self.advance_char() {
                Some('"') => {
                    text.push('"');
                    return Ok(TokenKind::String(text));
                }
                Some('\\') => {
                    text.push('\\');
                    match self.advance_char() {
                        Some(escaped) => text.push(escaped),
                        None => break,
                    }
                }
                Some(ch) => text.push(ch),
                None => break,
            }
        }
        Err(self.error_with_location(format!("Unterminated string starting at {}", start), start))
    }

    fn next_is_digit(&self) -> bool {
        self.input[self.current_index..]
            .chars()
            .nth(1)
            .map_or(false, |c| c.is_ascii_digit())
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn advance_char(&mut self) -> Option<char> {
        let (index, ch) = self.chars.next()?;
        self.current_index = index + ch.len_utf8();
        Some(ch)
    }
}
