// ABOUTME: Recursive descent parser for "NdS+M" dice notation.
// ABOUTME: Converts token streams into a DiceDescriptor.

use crate::dice::DiceDescriptor;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, SyntaxError, Token};

/// Parser for dice notation: `[count] "d" sides [("+" | "-") modifier]`.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str) -> std::result::Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the input into a descriptor.
    pub fn parse(&mut self) -> std::result::Result<DiceDescriptor, SyntaxError> {
        // Optional count, defaulting to a single die
        let count = if let Token::Number(n) = self.current {
            self.advance()?;
            n
        } else {
            1
        };

        // A bare number is not dice notation; callers handle literals themselves.
        self.expect(Token::D, "'d'")?;

        let sides = match self.current {
            Token::Number(n) => {
                self.advance()?;
                n
            }
            _ => return Err(self.unexpected("dice sides")),
        };

        let modifier = self.modifier()?;

        if self.current != Token::Eof {
            return Err(self.unexpected("end of input"));
        }

        if count == 0 {
            return Err(SyntaxError::Expected {
                expected: "at least one die".to_string(),
                found: "0".to_string(),
            });
        }
        if sides == 0 {
            return Err(SyntaxError::Expected {
                expected: "at least one side".to_string(),
                found: "0".to_string(),
            });
        }

        Ok(DiceDescriptor {
            count,
            sides,
            modifier,
        })
    }

    fn advance(&mut self) -> std::result::Result<Token, SyntaxError> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        Ok(prev)
    }

    fn expect(&mut self, expected: Token, what: &str) -> std::result::Result<(), SyntaxError> {
        if self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        SyntaxError::Expected {
            expected: expected.to_string(),
            found: match self.current {
                Token::Eof => "end of input".to_string(),
                ref token => format!("{:?} at position {}", token, self.lexer.pos()),
            },
        }
    }

    /// Parse the optional signed flat modifier.
    fn modifier(&mut self) -> std::result::Result<i64, SyntaxError> {
        let sign = match self.current {
            Token::Plus => 1,
            Token::Minus => -1,
            _ => return Ok(0),
        };
        self.advance()?;

        match self.current {
            Token::Number(n) => {
                self.advance()?;
                Ok(sign * i64::from(n))
            }
            _ => Err(self.unexpected("modifier value")),
        }
    }
}

/// Parse a dice notation string into a descriptor.
pub fn parse(input: &str) -> Result<DiceDescriptor> {
    Parser::new(input)
        .and_then(|mut parser| parser.parse())
        .map_err(|e| Error::InvalidNotation {
            notation: input.to_string(),
            reason: e.to_string(),
        })
}
