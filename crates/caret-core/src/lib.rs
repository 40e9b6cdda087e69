//! Shared types for the caret code-completion engine.
//!
//! - [`category`] -- token category ids, reserved sentinels and channels
//! - [`token`] -- the token record exchanged with lexers and the engine

pub mod category;
pub mod token;

pub use category::{CURSOR, Category, DEFAULT_CHANNEL, EOF, HIDDEN_CHANNEL};
pub use token::Token;
