//! Lex a GPR string into a series of tokens for later parsing

use thiserror::Error;

use crate::io::gpr_parse::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Convert the source into tokens, always terminated by [`Token::Eof`]
    pub fn lex(&mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::Eof);
        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single Character Tokens
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            // Identifiers and Operators
            c if Lexer::is_identifier_start(c) => self.read_identifier(),
            // Whitespace
            c if c.is_whitespace() => {}
            _ => {
                return Err(LexerError::InvalidCharacter {
                    character: c,
                    position: self.start,
                })
            }
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_identifier(&mut self) {
        while Lexer::is_identifier_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        match text.to_lowercase().as_str() {
            "and" => self.add_token(Token::And),
            "or" => self.add_token(Token::Or),
            _ => self.add_token(Token::Identifier(text)),
        }
    }

    fn is_identifier_start(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    /// Gene ids in published models contain dots (`abcD.2`), dashes and colons as well
    fn is_identifier_char(c: char) -> bool {
        Lexer::is_identifier_start(c) || matches!(c, '.' | '-' | ':')
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum LexerError {
    #[error("Invalid character `{character}` at position {position}")]
    InvalidCharacter { character: char, position: usize },
}

#[cfg(test)]
mod tests {
    use crate::io::gpr_parse::lexer::{Lexer, LexerError};
    use crate::io::gpr_parse::token::Token;

    #[test]
    fn test_single_gene() {
        let mut lexer = Lexer::new("Rv0023");
        let tokens = lexer.lex().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], Token::Identifier(String::from("Rv0023")));
    }

    #[test]
    fn test_grouping() {
        let mut lexer = Lexer::new("(Rv0023 OR Rv0123)");
        let tokens = lexer.lex().unwrap();
        let expected_tokens = vec![
            Token::LeftParen,
            Token::Identifier(String::from("Rv0023")),
            Token::Or,
            Token::Identifier(String::from("Rv0123")),
            Token::RightParen,
            Token::Eof,
        ];
        assert_eq!(tokens, expected_tokens);
    }

    #[test]
    fn test_dotted_identifiers() {
        let mut lexer = Lexer::new("G_abcD_2 and abcD.2");
        let tokens = lexer.lex().unwrap();
        assert_eq!(tokens[0], Token::Identifier(String::from("G_abcD_2")));
        assert_eq!(tokens[1], Token::And);
        assert_eq!(tokens[2], Token::Identifier(String::from("abcD.2")));
    }

    #[test]
    fn test_keywords_are_whole_words() {
        let mut lexer = Lexer::new("orf1 and andX");
        let tokens = lexer.lex().unwrap();
        assert_eq!(tokens[0], Token::Identifier(String::from("orf1")));
        assert_eq!(tokens[2], Token::Identifier(String::from("andX")));
    }

    #[test]
    fn test_invalid_character() {
        let mut lexer = Lexer::new("b0001 & b0002");
        assert_eq!(
            lexer.lex(),
            Err(LexerError::InvalidCharacter {
                character: '&',
                position: 6
            })
        );
    }
}
