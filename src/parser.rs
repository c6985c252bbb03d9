// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! SpQL Parser - Recursive descent parser for SpQL queries.
//!
//! Grammar:
//!   query      = clause { connective clause } ;
//!   clause     = [ field_part ] operator value_part ;
//!   field_part = field_list | "all" ;
//!   field_list = ident { "," ident } ;
//!   value_part = literal { "," literal } ;
//!   operator   = "==" | "!=" | "<" | "<=" | ">" | ">="
//!              | "re" | "re.IGNORECASE" | "nre" | "nre.IGNORECASE" ;
//!   connective = "and" | "or" ;
//!
//! The parser is purely a text-to-AST translator: it performs no column or
//! schema validation. A clause naming a column that does not exist simply
//! matches nothing at execution time.

use crate::ast::{Clause, Connective, FieldSelector, Operator, Position, Query, SyntaxError};

/// Token types for the lexer.
#[derive(Debug, Clone, PartialEq)]
enum TokenType {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Comma,
    /// Bare word: any run of characters outside whitespace, `,`, quotes and
    /// the operator symbols `= ! < >`.
    Word(String),
    /// Single- or double-quoted string literal.
    Quoted(String),
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    token_type: TokenType,
    position: Position,
}

impl Token {
    /// Token text as it should appear in error messages.
    fn text(&self) -> String {
        match &self.token_type {
            TokenType::Eq => "==".into(),
            TokenType::Ne => "!=".into(),
            TokenType::Lt => "<".into(),
            TokenType::Lte => "<=".into(),
            TokenType::Gt => ">".into(),
            TokenType::Gte => ">=".into(),
            TokenType::Comma => ",".into(),
            TokenType::Word(w) => w.clone(),
            TokenType::Quoted(s) => format!("\"{s}\""),
            TokenType::Eof => "<end of query>".into(),
        }
    }
}

/// Lexer for SpQL queries.
struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_quoted(&mut self, quote: char) -> Result<Token, SyntaxError> {
        let start_pos = self.current_position();
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(SyntaxError {
                        message: format!(
                            "Unterminated string starting at line {}, column {}",
                            start_pos.line, start_pos.column
                        ),
                        position: Some(start_pos),
                        token: Some(value),
                    });
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some(ch) => value.push(ch),
                        None => {
                            return Err(SyntaxError {
                                message: "Unterminated escape sequence".into(),
                                position: Some(self.current_position()),
                                token: None,
                            });
                        }
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Ok(Token {
            token_type: TokenType::Quoted(value),
            position: start_pos,
        })
    }

    fn is_word_char(ch: char) -> bool {
        !ch.is_whitespace() && !matches!(ch, ',' | '=' | '!' | '<' | '>' | '"' | '\'')
    }

    fn read_word(&mut self) -> Token {
        let start_pos = self.current_position();
        let mut value = String::new();

        while let Some(ch) = self.peek() {
            if Self::is_word_char(ch) {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token {
            token_type: TokenType::Word(value),
            position: start_pos,
        }
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();

        let start_pos = self.current_position();

        let token_type = match self.peek() {
            None => TokenType::Eof,
            Some('"') => return self.read_quoted('"'),
            Some('\'') => return self.read_quoted('\''),
            Some(',') => {
                self.advance();
                TokenType::Comma
            }
            Some('=') => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::Eq
                } else {
                    return Err(SyntaxError {
                        message: format!(
                            "Expected '=' after '=' at line {}, column {}",
                            start_pos.line, start_pos.column
                        ),
                        position: Some(start_pos),
                        token: Some("=".into()),
                    });
                }
            }
            Some('!') => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::Ne
                } else {
                    return Err(SyntaxError {
                        message: format!(
                            "Expected '=' after '!' at line {}, column {}",
                            start_pos.line, start_pos.column
                        ),
                        position: Some(start_pos),
                        token: Some("!".into()),
                    });
                }
            }
            Some('<') => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::Lte
                } else {
                    TokenType::Lt
                }
            }
            Some('>') => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::Gte
                } else {
                    TokenType::Gt
                }
            }
            Some(_) => return Ok(self.read_word()),
        };

        Ok(Token {
            token_type,
            position: start_pos,
        })
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Parser for SpQL queries.
#[derive(Default)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> &Token {
        // tokenize() always terminates the stream with Eof and advance()
        // never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !matches!(token.token_type, TokenType::Eof) {
            self.pos += 1;
        }
        token
    }

    fn match_token(&mut self, expected: &TokenType) -> bool {
        if std::mem::discriminant(&self.current().token_type) == std::mem::discriminant(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn parse(&mut self, input: &str) -> Result<Query, SyntaxError> {
        let mut lexer = Lexer::new(input);
        self.tokens = lexer.tokenize()?;
        self.pos = 0;

        if matches!(self.current().token_type, TokenType::Eof) {
            return Err(SyntaxError {
                message: "Empty query".into(),
                position: Some(self.current().position),
                token: None,
            });
        }

        let mut clauses = Vec::new();
        let mut connective = Connective::And;

        loop {
            clauses.push(self.parse_clause(connective)?);

            let next = self.current().clone();
            match &next.token_type {
                TokenType::Eof => break,
                TokenType::Word(w) if w == "and" => {
                    connective = Connective::And;
                    self.advance();
                }
                TokenType::Word(w) if w == "or" => {
                    connective = Connective::Or;
                    self.advance();
                }
                _ => {
                    return Err(SyntaxError {
                        message: format!(
                            "Expected 'and', 'or', or end of query, found '{}'",
                            next.text()
                        ),
                        position: Some(next.position),
                        token: Some(next.text()),
                    });
                }
            }
        }

        Ok(Query {
            raw: input.to_string(),
            clauses,
        })
    }

    fn parse_clause(&mut self, connective: Connective) -> Result<Clause, SyntaxError> {
        let selector = if self.at_operator() {
            FieldSelector::All
        } else {
            self.parse_field_part()?
        };

        let operator = self.parse_operator()?;
        let values = self.parse_value_part()?;

        Ok(Clause {
            selector,
            operator,
            values,
            connective,
        })
    }

    /// Whether the current token can only be an operator. Bare words are
    /// operators here only when they spell one of the regex forms, so a
    /// clause like `re error` selects every column while `status re error`
    /// treats `status` as a field name.
    fn at_operator(&self) -> bool {
        match &self.current().token_type {
            TokenType::Eq
            | TokenType::Ne
            | TokenType::Lt
            | TokenType::Lte
            | TokenType::Gt
            | TokenType::Gte => true,
            TokenType::Word(w) => {
                matches!(w.as_str(), "re" | "nre")
                    || w.starts_with("re.")
                    || w.starts_with("nre.")
            }
            _ => false,
        }
    }

    fn parse_field_part(&mut self) -> Result<FieldSelector, SyntaxError> {
        let mut patterns = vec![self.parse_ident()?];
        while self.match_token(&TokenType::Comma) {
            patterns.push(self.parse_ident()?);
        }

        if patterns.len() == 1 && patterns[0] == "all" {
            return Ok(FieldSelector::All);
        }

        Ok(FieldSelector::Named {
            patterns,
            match_mode: Operator::Eq,
        })
    }

    fn parse_ident(&mut self) -> Result<String, SyntaxError> {
        let token = self.current().clone();
        match &token.token_type {
            TokenType::Word(w) => {
                self.advance();
                Ok(w.clone())
            }
            TokenType::Quoted(s) => {
                self.advance();
                Ok(s.clone())
            }
            _ => Err(SyntaxError {
                message: format!("Expected field name, found '{}'", token.text()),
                position: Some(token.position),
                token: Some(token.text()),
            }),
        }
    }

    fn parse_operator(&mut self) -> Result<Operator, SyntaxError> {
        let token = self.current().clone();
        let operator = match &token.token_type {
            TokenType::Eq => Operator::Eq,
            TokenType::Ne => Operator::Ne,
            TokenType::Lt => Operator::Lt,
            TokenType::Lte => Operator::Lte,
            TokenType::Gt => Operator::Gt,
            TokenType::Gte => Operator::Gte,
            TokenType::Word(w) => match w.as_str() {
                "re" => Operator::Regex,
                "re.IGNORECASE" => Operator::RegexIgnoreCase,
                "nre" => Operator::NotRegex,
                "nre.IGNORECASE" => Operator::NotRegexIgnoreCase,
                _ if w.starts_with("re.") || w.starts_with("nre.") => {
                    return Err(SyntaxError {
                        message: format!("Unknown operator suffix in '{w}'"),
                        position: Some(token.position),
                        token: Some(w.clone()),
                    });
                }
                _ => {
                    return Err(SyntaxError {
                        message: format!("Expected operator, found '{w}'"),
                        position: Some(token.position),
                        token: Some(w.clone()),
                    });
                }
            },
            _ => {
                return Err(SyntaxError {
                    message: format!("Expected operator, found '{}'", token.text()),
                    position: Some(token.position),
                    token: Some(token.text()),
                });
            }
        };
        self.advance();
        Ok(operator)
    }

    fn parse_value_part(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut values = vec![self.parse_value()?];
        while self.match_token(&TokenType::Comma) {
            values.push(self.parse_value()?);
        }
        Ok(values)
    }

    fn parse_value(&mut self) -> Result<String, SyntaxError> {
        let token = self.current().clone();
        match &token.token_type {
            // Bare `and`/`or` are always connectives; quote them to use as
            // values.
            TokenType::Word(w) if w != "and" && w != "or" => {
                self.advance();
                Ok(w.clone())
            }
            TokenType::Quoted(s) => {
                self.advance();
                Ok(s.clone())
            }
            _ => Err(SyntaxError {
                message: format!("Expected value, found '{}'", token.text()),
                position: Some(token.position),
                token: Some(token.text()),
            }),
        }
    }
}

/// Parse a SpQL query string into an AST.
pub fn parse(input: &str) -> Result<Query, SyntaxError> {
    let mut parser = Parser::new();
    parser.parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_eq() {
        let query = parse("status == running").unwrap();
        assert_eq!(query.raw, "status == running");
        assert_eq!(query.clauses.len(), 1);

        let clause = &query.clauses[0];
        assert_eq!(
            clause.selector,
            FieldSelector::Named {
                patterns: vec!["status".into()],
                match_mode: Operator::Eq,
            }
        );
        assert_eq!(clause.operator, Operator::Eq);
        assert_eq!(clause.values, vec!["running".to_string()]);
        assert_eq!(clause.connective, Connective::And);
    }

    #[test]
    fn test_multi_value_clause() {
        let query = parse("status == running, failed").unwrap();
        assert_eq!(
            query.clauses[0].values,
            vec!["running".to_string(), "failed".to_string()]
        );
    }

    #[test]
    fn test_multi_field_clause() {
        let query = parse("name, state == active").unwrap();
        match &query.clauses[0].selector {
            FieldSelector::Named { patterns, match_mode } => {
                assert_eq!(patterns, &vec!["name".to_string(), "state".to_string()]);
                assert_eq!(*match_mode, Operator::Eq);
            }
            _ => panic!("expected Named selector"),
        }
    }

    #[test]
    fn test_all_keyword() {
        let query = parse("all re error").unwrap();
        assert_eq!(query.clauses[0].selector, FieldSelector::All);
        assert_eq!(query.clauses[0].operator, Operator::Regex);
    }

    #[test]
    fn test_implicit_all() {
        let query = parse("re error").unwrap();
        assert_eq!(query.clauses[0].selector, FieldSelector::All);
        assert_eq!(query.clauses[0].values, vec!["error".to_string()]);
    }

    #[test]
    fn test_symbol_operators() {
        for (text, op) in [
            ("frames == 10", Operator::Eq),
            ("frames != 10", Operator::Ne),
            ("frames < 10", Operator::Lt),
            ("frames <= 10", Operator::Lte),
            ("frames > 10", Operator::Gt),
            ("frames >= 10", Operator::Gte),
        ] {
            let query = parse(text).unwrap();
            assert_eq!(query.clauses[0].operator, op, "{text}");
        }
    }

    #[test]
    fn test_ignore_case_operators() {
        let query = parse("name re.IGNORECASE ERR").unwrap();
        assert_eq!(query.clauses[0].operator, Operator::RegexIgnoreCase);

        let query = parse("name nre.IGNORECASE ERR").unwrap();
        assert_eq!(query.clauses[0].operator, Operator::NotRegexIgnoreCase);
    }

    #[test]
    fn test_connectives_preserved() {
        let query = parse("status == running and frames > 10 or name re x").unwrap();
        assert_eq!(query.clauses.len(), 3);
        assert_eq!(query.clauses[0].connective, Connective::And);
        assert_eq!(query.clauses[1].connective, Connective::And);
        assert_eq!(query.clauses[2].connective, Connective::Or);
    }

    #[test]
    fn test_quoted_values() {
        let query = parse(r#"title == "a long title", 'another one'"#).unwrap();
        assert_eq!(
            query.clauses[0].values,
            vec!["a long title".to_string(), "another one".to_string()]
        );
    }

    #[test]
    fn test_regex_value_characters() {
        let query = parse(r"path re ^/jobs/.*\.log$").unwrap();
        assert_eq!(query.clauses[0].values, vec![r"^/jobs/.*\.log$".to_string()]);
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse("status ~~ running").unwrap_err();
        assert_eq!(err.token.as_deref(), Some("~~"));
        assert!(err.position.is_some());
    }

    #[test]
    fn test_unknown_ignore_case_suffix() {
        let err = parse("status re.LOUDLY running").unwrap_err();
        assert_eq!(err.token.as_deref(), Some("re.LOUDLY"));
    }

    #[test]
    fn test_empty_value_list() {
        assert!(parse("status ==").is_err());
        assert!(parse("status == and name == x").is_err());
    }

    #[test]
    fn test_empty_query() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn test_missing_connective() {
        let err = parse("status == running name == x").unwrap_err();
        assert_eq!(err.token.as_deref(), Some("name"));
    }

    #[test]
    fn test_single_equals_rejected() {
        let err = parse("status = running").unwrap_err();
        assert_eq!(err.token.as_deref(), Some("="));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(parse(r#"title == "oops"#).is_err());
    }

    #[test]
    fn test_error_position() {
        let err = parse("status ~~ running").unwrap_err();
        let pos = err.position.unwrap();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 8);
        assert_eq!(pos.offset, 7);
    }
}
