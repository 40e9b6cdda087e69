// Token cursor stream: an immutable position over the lexed input.

use caret_core::Token;

/// A position in a token sequence. Advancing returns a new view and leaves
/// this one untouched, so branches of the walk can hold their own positions.
///
/// Reading past the last token yields an end-of-input token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    position: usize,
}

impl<'t> TokenCursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// The token at this position, or end-of-input past the end.
    #[inline]
    pub fn current(&self) -> Token {
        match self.tokens.get(self.position) {
            Some(token) => *token,
            None => Token::eof(self.tokens.last().map_or(0, Token::end)),
        }
    }

    /// Whether the current token is the cursor marker (not plain end-of-input).
    #[inline]
    pub fn at_cursor(&self) -> bool {
        self.current().is_cursor()
    }

    /// A view one token further on. Legal past the end.
    #[inline]
    pub fn advance(&self) -> Self {
        Self {
            tokens: self.tokens,
            position: self.position + 1,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Tokens before this position.
    pub fn preceding(&self) -> &'t [Token] {
        &self.tokens[..self.position.min(self.tokens.len())]
    }
}
