use unicode_segmentation::UnicodeSegmentation;

use std::error::Error;
use std::fmt;

use crate::token::{Literal, Token, TokenType};

pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Single-pass scanner over one immutable source string.
///
/// The cursor walks grapheme clusters, so `\r\n` counts as one newline and
/// multi-byte input never gets sliced mid-character. `line` is 1-based,
/// `column` 0-based and reset after every newline, including newlines inside
/// string literals.
pub struct Scanner {
    source: String,
    tokens: Vec<Token>,
    length: usize,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    start_line: u32,
    start_column: u32,
}

impl Scanner {
    pub fn new(source: String) -> Self {
        let length = source.graphemes(true).count();
        Scanner {
            source,
            tokens: Vec::new(),
            length,
            start: 0,
            current: 0,
            line: 1,
            column: 0,
            start_line: 1,
            start_column: 0,
        }
    }

    /// Scan the whole source, failing fast at the first malformed construct.
    ///
    /// Tokens appended before a failure stay observable through `tokens()`.
    pub fn scan_tokens(&mut self) -> ScanResult<&[Token]> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            None,
            self.line,
            self.column,
        ));

        Ok(self.tokens())
    }

    pub fn tokens(&self) -> &[Token] {
        self.tokens.as_slice()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.length
    }

    fn scan_token(&mut self) -> ScanResult<()> {
        match self.advance() {
            // Single character tokens
            "(" => self.add_token(TokenType::LeftParen, None),
            ")" => self.add_token(TokenType::RightParen, None),
            "{" => self.add_token(TokenType::LeftBrace, None),
            "}" => self.add_token(TokenType::RightBrace, None),
            "," => self.add_token(TokenType::Comma, None),
            "." => self.add_token(TokenType::Dot, None),
            "-" => self.add_token(TokenType::Minus, None),
            "+" => self.add_token(TokenType::Plus, None),
            ";" => self.add_token(TokenType::Semicolon, None),
            "*" => self.add_token(TokenType::Star, None),

            // One or two character tokens
            "!" => {
                if self.matches("=") {
                    self.add_token(TokenType::BangEqual, None)
                } else {
                    self.add_token(TokenType::Bang, None)
                }
            }
            "=" => {
                if self.matches("=") {
                    self.add_token(TokenType::EqualEqual, None)
                } else {
                    self.add_token(TokenType::Equal, None)
                }
            }
            ">" => {
                if self.matches("=") {
                    self.add_token(TokenType::GreaterEqual, None)
                } else {
                    self.add_token(TokenType::Greater, None)
                }
            }
            "<" => {
                if self.matches("=") {
                    self.add_token(TokenType::LessEqual, None)
                } else {
                    self.add_token(TokenType::Less, None)
                }
            }

            // Comments
            "/" => {
                if self.matches("/") {
                    // A comment goes until the end of the line; the newline
                    // itself is left for the main loop.
                    while let Some(str) = self.peek() {
                        if str == "\n" || str == "\r\n" {
                            break;
                        }
                        self.advance();
                    }
                    Ok(())
                } else {
                    self.add_token(TokenType::Slash, None)
                }
            }

            // Ignore whitespace
            " " | "\r" | "\t" => Ok(()),

            // Newline
            "\n" | "\r\n" => {
                self.line += 1;
                self.column = 0;
                Ok(())
            }

            r#"""# => self.string(),

            str => {
                if Scanner::is_digit(str) {
                    self.number()
                } else {
                    let kind = ScanErrorKind::UnknownToken(str.to_string());
                    Err(ScanError::new(self.start_line, self.start_column, kind))
                }
            }
        }
    }

    fn number(&mut self) -> ScanResult<()> {
        while let Some(str) = self.peek() {
            if !Scanner::is_digit(str) {
                break;
            }
            self.advance();
        }

        // Look for a fractional part; a trailing "." without a digit after it
        // is left for the next iteration to classify.
        if let Some(".") = self.peek() {
            if let Some(str) = self.peek_next() {
                if Scanner::is_digit(str) {
                    // Consume the .
                    self.advance();

                    while let Some(str) = self.peek() {
                        if !Scanner::is_digit(str) {
                            break;
                        }
                        self.advance();
                    }
                }
            }
        }

        let literal_length = self.current - self.start;
        let text: String = self
            .source
            .graphemes(true)
            .skip(self.start)
            .take(literal_length)
            .collect();
        self.add_token(TokenType::Number, Some(Literal::Number(text)))
    }

    fn string(&mut self) -> ScanResult<()> {
        while let Some(str) = self.peek() {
            match str {
                r#"""# => break,
                "\n" | "\r\n" => {
                    self.advance();
                    self.line += 1;
                    self.column = 0;
                }
                _ => {
                    self.advance();
                }
            }
        }

        if self.is_at_end() {
            return Err(ScanError::new(
                self.line,
                self.column,
                ScanErrorKind::UnterminatedString,
            ));
        }

        // Consume the closing "
        self.advance();

        // Trim the surrounding quotes; escape sequences are not interpreted
        let literal_length = (self.current - 1) - (self.start + 1);
        let contents = self
            .source
            .graphemes(true)
            .skip(self.start + 1)
            .take(literal_length)
            .collect();
        self.add_token(TokenType::String, Some(Literal::String(contents)))
    }

    fn is_digit(str: &str) -> bool {
        !str.is_empty() && str.bytes().all(|c| c.is_ascii_digit())
    }

    fn peek(&self) -> Option<&str> {
        self.source.graphemes(true).nth(self.current)
    }

    fn peek_next(&self) -> Option<&str> {
        self.source.graphemes(true).nth(self.current + 1)
    }

    fn matches(&mut self, expected: &str) -> bool {
        match self.peek() {
            Some(str) if str == expected => {
                self.current += 1;
                self.column += 1;
                true
            }
            _ => false,
        }
    }

    fn advance(&mut self) -> &str {
        // SAFETY: By construction advance() is only called after checking if is_at_end()
        let grapheme = unsafe {
            self.source
                .graphemes(true)
                .nth(self.current)
                .unwrap_unchecked()
        };
        self.current += 1;
        self.column += 1;
        grapheme
    }

    fn add_token(&mut self, token_type: TokenType, literal: Option<Literal>) -> ScanResult<()> {
        let lexeme_length = self.current - self.start;
        let lexeme = self
            .source
            .graphemes(true)
            .skip(self.start)
            .take(lexeme_length)
            .collect();
        self.tokens.push(Token::new(
            token_type,
            lexeme,
            literal,
            self.start_line,
            self.start_column,
        ));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    line: u32,
    column: u32,
    kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(line: u32, column: u32, kind: ScanErrorKind) -> Self {
        ScanError { line, column, kind }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn kind(&self) -> &ScanErrorKind {
        &self.kind
    }
}

impl Error for ScanError {}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}:{}] Error: {}", self.line, self.column, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    UnknownToken(String),
    UnterminatedString,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Self::UnknownToken(str) => write!(f, "Unknown token '{}'.", str),
            Self::UnterminatedString => write!(f, "Unterminated string."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> ScanResult<Vec<Token>> {
        let mut scanner = Scanner::new(source.to_string());
        scanner.scan_tokens().map(<[Token]>::to_vec)
    }

    fn token_types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn punctuation_yields_one_token_per_character() {
        let source = "(){},.-+;*";
        let tokens = scan(source).unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![
                TokenType::LeftParen,
                TokenType::RightParen,
                TokenType::LeftBrace,
                TokenType::RightBrace,
                TokenType::Comma,
                TokenType::Dot,
                TokenType::Minus,
                TokenType::Plus,
                TokenType::Semicolon,
                TokenType::Star,
                TokenType::Eof,
            ]
        );
        for (i, token) in tokens.iter().take(source.len()).enumerate() {
            assert_eq!(token.lexeme, source[i..i + 1]);
            assert_eq!(token.line, 1);
            assert_eq!(token.column, i as u32);
        }
    }

    #[test]
    fn lookahead_only_fires_on_equals() {
        let tokens = scan("!=").unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![TokenType::BangEqual, TokenType::Eof]
        );
        assert_eq!(tokens[0].lexeme, "!=");

        let tokens = scan("!").unwrap();
        assert_eq!(token_types(&tokens), vec![TokenType::Bang, TokenType::Eof]);
        assert_eq!(tokens[0].lexeme, "!");

        let tokens = scan("=<>=").unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![
                TokenType::Equal,
                TokenType::Less,
                TokenType::GreaterEqual,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let tokens = scan("// comment\n+").unwrap();
        assert_eq!(token_types(&tokens), vec![TokenType::Plus, TokenType::Eof]);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[0].column, 0);
    }

    #[test]
    fn comment_at_end_of_input_produces_nothing() {
        let tokens = scan("+// trailing").unwrap();
        assert_eq!(token_types(&tokens), vec![TokenType::Plus, TokenType::Eof]);
    }

    #[test]
    fn slash_alone_is_a_token() {
        let tokens = scan("/").unwrap();
        assert_eq!(token_types(&tokens), vec![TokenType::Slash, TokenType::Eof]);
    }

    #[test]
    fn whitespace_produces_no_tokens() {
        let tokens = scan(" \r\t").unwrap();
        assert_eq!(token_types(&tokens), vec![TokenType::Eof]);
    }

    #[test]
    fn string_literal_excludes_quotes() {
        let tokens = scan("\"hi\" 1").unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![TokenType::String, TokenType::Number, TokenType::Eof]
        );
        assert_eq!(tokens[0].lexeme, "\"hi\"");
        assert_eq!(tokens[0].literal, Some(Literal::String("hi".to_string())));
        assert_eq!(tokens[1].column, 5);
    }

    #[test]
    fn multiline_string_counts_lines() {
        let tokens = scan("\"ab\ncd\"").unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![TokenType::String, TokenType::Eof]
        );
        assert_eq!(
            tokens[0].literal,
            Some(Literal::String("ab\ncd".to_string()))
        );
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].column, 0);
        // The cursor ends up on line 2, past the closing quote
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn unterminated_string_fails_at_end_of_input() {
        let err = scan("\"unterminated").unwrap_err();
        assert_eq!(err, ScanError::new(1, 13, ScanErrorKind::UnterminatedString));
        assert_eq!(err.to_string(), "[line 1:13] Error: Unterminated string.");
    }

    #[test]
    fn number_consumes_fractional_part() {
        let tokens = scan("123.45").unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![TokenType::Number, TokenType::Eof]
        );
        assert_eq!(tokens[0].lexeme, "123.45");
        assert_eq!(
            tokens[0].literal,
            Some(Literal::Number("123.45".to_string()))
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_the_number() {
        let tokens = scan("123.").unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![TokenType::Number, TokenType::Dot, TokenType::Eof]
        );
        assert_eq!(tokens[0].lexeme, "123");
        assert_eq!(tokens[1].lexeme, ".");
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn unknown_token_reports_character_and_position() {
        let err = scan("@").unwrap_err();
        assert_eq!(
            err,
            ScanError::new(1, 0, ScanErrorKind::UnknownToken("@".to_string()))
        );

        let err = scan("+ @").unwrap_err();
        assert_eq!(err.line(), 1);
        assert_eq!(err.column(), 2);
    }

    #[test]
    fn tokens_before_a_failure_remain_observable() {
        let mut scanner = Scanner::new("+@".to_string());
        assert!(scanner.scan_tokens().is_err());
        assert_eq!(token_types(scanner.tokens()), vec![TokenType::Plus]);
    }

    #[test]
    fn columns_reset_on_every_newline() {
        let tokens = scan("+\n- -").unwrap();
        assert_eq!(
            token_types(&tokens),
            vec![
                TokenType::Plus,
                TokenType::Minus,
                TokenType::Minus,
                TokenType::Eof,
            ]
        );
        assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 0));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 2));
    }

    #[test]
    fn crlf_is_a_single_newline() {
        let tokens = scan("+\r\n+").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 0));
    }

    #[test]
    fn multibyte_graphemes_are_not_split() {
        let err = scan("é").unwrap_err();
        assert_eq!(
            err,
            ScanError::new(1, 0, ScanErrorKind::UnknownToken("é".to_string()))
        );
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let tokens = scan("").unwrap();
        assert_eq!(token_types(&tokens), vec![TokenType::Eof]);
        assert_eq!(tokens[0].lexeme, "");
        assert_eq!(tokens[0].literal, None);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
    }
}
