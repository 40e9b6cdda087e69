// Token record shared by lexers, the token cursor stream and callers.

use crate::category::{CURSOR, Category, DEFAULT_CHANNEL, EOF};

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A lexed token.
///
/// Offsets are byte offsets into the source text. The engine only looks at
/// `category`; offsets and channel are kept so callers can map proposals back
/// to the text (for example, to find the word being completed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// Category of this token.
    pub category: Category,

    /// Byte offset of the first character of the token.
    pub start: usize,

    /// Length of the token in bytes.
    pub len: usize,

    /// Channel the lexer put this token on.
    pub channel: u32,
}

impl Token {
    /// Create a token on the default channel.
    pub fn new(category: Category, start: usize, len: usize) -> Self {
        Self {
            category,
            start,
            len,
            channel: DEFAULT_CHANNEL,
        }
    }

    /// Create a token on the given channel.
    pub fn on_channel(category: Category, start: usize, len: usize, channel: u32) -> Self {
        Self {
            category,
            start,
            len,
            channel,
        }
    }

    /// The zero-width cursor marker at byte offset `at`.
    pub fn cursor(at: usize) -> Self {
        Self::new(CURSOR, at, 0)
    }

    /// The zero-width end-of-input sentinel at byte offset `at`.
    pub fn eof(at: usize) -> Self {
        Self::new(EOF, at, 0)
    }

    /// Byte offset one past the last character of the token.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    #[inline]
    pub fn is_cursor(&self) -> bool {
        self.category == CURSOR
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.category == EOF
    }

    /// Whether the parser sees this token (default channel).
    #[inline]
    pub fn is_default_channel(&self) -> bool {
        self.channel == DEFAULT_CHANNEL
    }

    /// The source text covered by this token, if the offsets are valid for `source`.
    pub fn text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start..self.end())
    }
}
