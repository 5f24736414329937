use indexmap::IndexMap;
use thiserror::Error;

use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::{Gene, Gpr, GprError, GprOperatorType};
/*
GPR Grammar:
expression  -> disjunction
disjunction -> conjunction ( "OR" conjunction )* ;
conjunction -> primary ( "AND" primary )* ;
primary     -> GENE | "(" expression ")" ;

e.g. ( Gene1 AND Gene2 ) OR Gene3 AND Gene4
 */

static EOF: Token = Token::Eof;

/// GPR Parser
pub struct GPRParser<'gm> {
    /// Vector of tokens from the GPR string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// Map containing the Genes
    pub(crate) gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'gm> GPRParser<'gm> {
    /// Create a new GPRParser
    pub fn new(tokens: Vec<Token>, gene_map: &'gm mut IndexMap<String, Gene>) -> GPRParser<'gm> {
        GPRParser {
            tokens,
            current: 0,
            gene_map,
        }
    }

    // region Parsing Functions

    /// Parse the token vector into a GPR AST
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.disjunction()?;
        if !self.is_at_end() {
            // If entire expression has not been parsed, and error has occured
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn disjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut operands = vec![self.conjunction()?];
        while self.match_token(Token::Or) {
            operands.push(self.conjunction()?);
        }
        Ok(Gpr::new_operation(GprOperatorType::Or, operands)?)
    }

    fn conjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut operands = vec![self.primary()?];
        while self.match_token(Token::And) {
            operands.push(self.primary()?);
        }
        Ok(Gpr::new_operation(GprOperatorType::And, operands)?)
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        if let Some(identifier) = self.match_identifier() {
            self.insert_if_needed(&identifier);
            return Ok(Gpr::new_gene_node(&identifier));
        }

        if self.match_token(Token::LeftParen) {
            let expr = self.disjunction()?;
            self.consume(Token::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(ParseError::ExpectedExpression)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches `token`,
    /// if it does advance [`self.current`] and return true, otherwise return false
    fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            return true;
        }
        false
    }

    /// Similar to [`match_token`], but for matching an identifier token. If the current
    /// token is an identifier return `Some(GeneId)`, where GeneId is the gene's string identifier,
    /// otherwise return None
    fn match_identifier(&mut self) -> Option<String> {
        if let Token::Identifier(id) = self.peek() {
            let id = id.clone();
            self.advance();
            return Some(id);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek() == token
    }

    /// Advance `self.current` one position unless at end of GPR Vec
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    /// Check whether the parser is at the end of the source Vec
    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    /// The current token, a missing terminator reads as [`Token::Eof`]
    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&EOF)
    }

    /// Check whether the current token matches an input token, if it matches advance to the
    /// next token, and if it doesn't return an error. Used mainly for matching parenthesis in
    /// source GPR vec.
    fn consume(&mut self, token: Token, msg: &str) -> Result<(), ParseError> {
        if self.check(&token) {
            self.advance();
            return Ok(());
        }

        Err(ParseError::MissingToken(msg.to_string()))
    }

    // endregion parsing helper functions

    // region Gene Map Functions

    /// Check if a gene_id exists as a key in gene_map, if it doesn't insert a new gene with that id
    fn insert_if_needed(&mut self, gene_id: &str) {
        if !self.gene_map.contains_key(gene_id) {
            self.gene_map
                .insert(gene_id.to_string(), Gene::new(gene_id));
        }
    }

    // endregion Gene Map Functions
}

/// Enum representing possible parse errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the GPR string is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for two gene identifiers without an operator between them")]
    EarlyTermination,
    /// The parsed operation could not be built
    #[error("Invalid operation: {0}")]
    InvalidOperation(#[from] GprError),
}
