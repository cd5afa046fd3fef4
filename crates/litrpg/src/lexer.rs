// ABOUTME: Lexer for dice notation.
// ABOUTME: Tokenizes strings like "2d6+3" or "d20 - 1" into a stream of tokens.

use thiserror::Error;

/// Low-level syntax failures, folded into `Error::InvalidNotation` by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("number too large at position {0}")]
    Overflow(usize),
}

/// A token in the dice notation language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A numeric literal.
    Number(u32),
    /// The 'd' or 'D' dice separator.
    D,
    /// Positive modifier sign.
    Plus,
    /// Negative modifier sign.
    Minus,
    /// End of input.
    Eof,
}

/// A lexer for dice notation.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            pos: 0,
        }
    }

    /// Get the position of the most recently lexed token.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the next token from the input.
    ///
    /// Whitespace anywhere in the input is insignificant, so "2 d 6 + 3"
    /// lexes the same as "2d6+3".
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();

        let Some(&(pos, ch)) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        self.pos = pos;

        match ch {
            '0'..='9' => self.number(),
            'd' | 'D' => {
                self.chars.next();
                Ok(Token::D)
            }
            '+' => {
                self.chars.next();
                Ok(Token::Plus)
            }
            '-' => {
                self.chars.next();
                Ok(Token::Minus)
            }
            _ => Err(SyntaxError::UnexpectedChar(ch, pos)),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> Result<Token, SyntaxError> {
        let start = self.pos;
        let mut value: u32 = 0;

        while let Some(&(_, ch)) = self.chars.peek() {
            if let Some(digit) = ch.to_digit(10) {
                self.chars.next();
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or(SyntaxError::Overflow(start))?;
            } else {
                break;
            }
        }

        Ok(Token::Number(value))
    }
}
