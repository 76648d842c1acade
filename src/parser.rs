use crate::{
    error::{byte_offset_to_line, LangError, LangResult, Location},
    lexer::{Lexer, Token, TokenKind},
};
use std::path::{Path, PathBuf};

/// A node of the generic syntax tree. `tag` names the grammar rules that
/// produced the node, joined with `|` (for example `expr|number|regex`), so
/// consumers match on substrings rather than on a closed set of kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    pub contents: String,
    pub span: std::ops::Range<usize>,
    pub children: Vec<Node>,
}

impl Node {
    fn leaf(tag: &str, contents: String, span: std::ops::Range<usize>) -> Self {
        Self {
            tag: tag.to_string(),
            contents,
            span,
            children: Vec::new(),
        }
    }
}

/// Parses a whole program held in memory.
pub fn parse(source: &str) -> LangResult<Node> {
    parse_named(source, PathBuf::from("<stdin>"))
}

pub fn parse_named(source: &str, file_path: PathBuf) -> LangResult<Node> {
    let tokens = Lexer::with_file(source, file_path.clone()).lex()?;
    Parser::with_source_and_file(tokens, source.to_string(), file_path).parse_program()
}

/// Reads `path` and parses its contents.
pub fn parse_file(path: &Path) -> LangResult<Node> {
    let source = std::fs::read_to_string(path)?;
    parse_named(&source, path.to_path_buf())
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    source: String,
    file_path: PathBuf,
}

impl Parser {
    pub fn with_source_and_file(tokens: Vec<Token>, source: String, file_path: PathBuf) -> Self {
        Self {
            tokens,
            current: 0,
            source,
            file_path,
        }
    }

    fn error_with_location(&self, msg: String) -> LangError {
        let location = if self.current < self.tokens.len() {
            let token = &self.tokens[self.current];
            let line = byte_offset_to_line(&self.source, token.span.start);
            Some(Location::new(self.file_path.clone(), line))
        } else if !self.tokens.is_empty() {
            let last_token = &self.tokens[self.tokens.len() - 1];
            let line = byte_offset_to_line(&self.source, last_token.span.end);
            Some(Location::new(self.file_path.clone(), line))
        } else {
            None
        };
        LangError::Parser(msg, location)
    }

    /// Parses every top-level expression into a root node tagged `>`,
    /// framed by the start and end anchors.
    pub fn parse_program(&mut self) -> LangResult<Node> {
        let end = self.tokens.last().map_or(0, |t| t.span.end);
        let mut children = vec![Node::leaf("regex", String::new(), 0..0)];

        while !self.is_at_end() {
            if matches!(
                self.current_token().kind,
                TokenKind::RParen | TokenKind::RBrace
            ) {
                return Err(
                    self.error_with_location(format!("Unexpected '{}'", self.current_text()))
                );
            }
            children.push(self.parse_expr()?);
        }

        children.push(Node::leaf("regex", String::new(), end..end));
        Ok(Node {
            tag: ">".to_string(),
            contents: String::new(),
            span: 0..end,
            children,
        })
    }

    fn parse_expr(&mut self) -> LangResult<Node> {
        let token = self.advance();
        let span = token.span.clone();
        let node = match token.kind {
            TokenKind::Number(text) => Node::leaf("expr|number|regex", text, span),
            TokenKind::Symbol(text) => Node::leaf("expr|symbol|regex", text, span),
            TokenKind::String(text) => Node::leaf("expr|string|regex", text, span),
            TokenKind::Comment(text) => Node::leaf("expr|comment|regex", text, span),
            TokenKind::LParen => self.parse_compound("expr|sexpr|>", "(", ")", span)?,
            TokenKind::LBrace => self.parse_compound("expr|qexpr|>", "{", "}", span)?,
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => {
                return Err(self.error_with_location("Expected expression".to_string()));
            }
        };
        Ok(node)
    }

    fn parse_compound(
        &mut self,
        tag: &str,
        open: &str,
        close: &str,
        open_span: std::ops::Range<usize>,
    ) -> LangResult<Node> {
        let start = open_span.start;
        let mut children = vec![Node::leaf("char", open.to_string(), open_span)];

        loop {
            if self.is_at_end() {
                return Err(self.error_with_location(format!(
                    "Unclosed '{}', expected '{}'",
                    open, close
                )));
            }
            let closing = matches!(
                (&self.current_token().kind, close),
                (TokenKind::RParen, ")") | (TokenKind::RBrace, "}")
            );
            if closing {
                let token = self.advance();
                children.push(Node::leaf("char", close.to_string(), token.span.clone()));
                return Ok(Node {
                    tag: tag.to_string(),
                    contents: String::new(),
                    span: start..token.span.end,
                    children,
                });
            }
            if matches!(
                self.current_token().kind,
                TokenKind::RParen | TokenKind::RBrace
            ) {
                return Err(self.error_with_location(format!(
                    "Unexpected '{}', expected '{}'",
                    self.current_text(),
                    close
                )));
            }
            children.push(self.parse_expr()?);
        }
    }

    fn current_text(&self) -> &str {
        let span = &self.current_token().span;
        self.source.get(span.clone()).unwrap_or("")
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        self.tokens.is_empty() || matches!(self.current_token().kind, TokenKind::Eof)
    }
}
