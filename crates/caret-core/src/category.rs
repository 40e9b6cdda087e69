// Token categories, reserved sentinel categories and token channels.

/// Integer id of a class of tokens (identifier, `+`, keyword `if`, ...).
///
/// Grammar vocabularies number real categories from 1. Negative values are
/// reserved for the synthetic tokens below.
pub type Category = i32;

/// End-of-input: yielded when a token stream is read past its last token,
/// and used by grammars that require the input to end (`prog: stmt* EOF`).
pub const EOF: Category = -1;

/// Synthetic cursor marker inserted at the editing position.
///
/// Distinct from [`EOF`]: reaching the cursor means "collect what may come
/// next", reaching end-of-input means nothing more can be consumed.
pub const CURSOR: Category = -10;

/// Channel of tokens that take part in parsing.
pub const DEFAULT_CHANNEL: u32 = 0;

/// Conventional channel for comments and other tokens the parser never sees.
pub const HIDDEN_CHANNEL: u32 = 1;

/// Whether `category` is one of the reserved synthetic categories.
#[inline]
pub fn is_synthetic(category: Category) -> bool {
    category < 0
}
