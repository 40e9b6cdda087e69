//! Code completion by walking a grammar state network.
//!
//! Given the tokens in front of an editing position, the suggester predicts
//! which token categories may legally come next. It simulates the parser's
//! rule-call stack while walking the network, consumes the tokens it is
//! given and, once it reaches the cursor, harvests the labels of every
//! transition that could be taken there.
//!
//! No parse tree is built and the input need not be complete or valid past
//! the cursor.
//!
//! # Architecture
//!
//! - [`stream`] -- Immutable token cursor over the lexed input
//! - [`stack`] -- Persistent construct stack (rules, blocks, loops)
//! - [`collector`] -- Set of proposed categories
//! - [`walker`] -- Work-list traversal of the network, incl. the stack
//!   compatibility check
//! - [`suggester`] -- Request facade and proposition rendering
//! - [`lexer`] -- Lexer collaborator interface and a regex-based lexer
//! - [`config`] -- Resource limits
//! - [`cancel`] -- Cooperative cancellation

pub mod cancel;
pub mod collector;
pub mod config;
pub mod lexer;
pub mod stack;
pub mod stream;
pub mod suggester;
pub mod walker;

pub use cancel::CancelToken;
pub use collector::Collector;
pub use config::SuggestOptions;
pub use lexer::{Lexer, PatternLexer, cursor_tokens};
pub use suggester::{Suggester, Suggestions, suggest};

use caret_net::StateId;

/// Error type for suggestion requests.
///
/// Structural dead ends (a branch the stack rejects, a token that does not
/// match) are normal and never surface here. These are faults in the
/// network, bad input from the caller, or an exhausted resource guard; in
/// each case the request yields no partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestError {
    #[error("state {state} is a {kind} state, which the suggester cannot walk")]
    UnsupportedState { state: StateId, kind: &'static str },
    #[error("state {state} has a {label} transition, which the suggester cannot walk")]
    UnsupportedTransition { state: StateId, label: &'static str },
    #[error("state {0} does not exist in the network")]
    UnknownState(StateId),
    #[error("token stream has no cursor marker")]
    MissingCursor,
    #[error("cursor offset {offset} is not a character boundary of the {len}-byte text")]
    CursorOutOfBounds { offset: usize, len: usize },
    #[error("step budget of {0} exhausted")]
    StepBudgetExhausted(usize),
    #[error("more than {0} nested constructs")]
    NestingTooDeep(usize),
    #[error("suggestion request was cancelled")]
    Cancelled,
}
