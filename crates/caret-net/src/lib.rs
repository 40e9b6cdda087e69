//! Grammar state networks for caret.
//!
//! A grammar state network is the compiled form of a parser grammar: rules,
//! blocks and loops laid out as states joined by labeled transitions. This
//! crate holds the read-only data model plus the ways to obtain one.
//!
//! # Architecture
//!
//! - [`state`] -- States and their structural roles
//! - [`transition`] -- Transitions, labels and interval sets
//! - [`network`] -- The immutable [`GrammarNetwork`]
//! - [`builder`] -- Programmatic construction with link derivation and validation
//! - [`serialized`] -- ANTLR 4 serialized networks (integer word form)
//! - [`interp`] -- ANTLR `.interp` files
//! - [`bundle`] -- The compact `.cnet` binary container
//! - [`vocabulary`] -- Category names and proposition text
//! - [`grammar`] -- Network, vocabulary and rule names bundled together

pub mod builder;
pub mod bundle;
pub mod grammar;
pub mod interp;
pub mod network;
pub mod serialized;
pub mod state;
pub mod transition;
pub mod vocabulary;

#[cfg(feature = "test-support")]
pub mod sketch;

pub use builder::{NetworkBuilder, Shape};
pub use grammar::Grammar;
pub use network::GrammarNetwork;
pub use state::{BlockKind, LoopKind, State, StateKind};
pub use transition::{IntervalSet, Label, Transition};
pub use vocabulary::Vocabulary;

/// Index of a state inside its network.
pub type StateId = u32;

/// Error type for building, loading and decoding grammar networks.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("invalid magic number in bundle header")]
    InvalidMagic,
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("unsupported bundle version {0}")]
    UnsupportedBundleVersion(u16),
    #[error("invalid string table: {0}")]
    InvalidStringTable(String),
    #[error("serialized network ended while reading {0}")]
    Truncated(&'static str),
    #[error("unsupported serialized network version {found}, expected {expected}")]
    UnsupportedVersion { found: i32, expected: i32 },
    #[error("grammar type {0} is not supported, only parser networks can be loaded")]
    UnsupportedGrammarType(i32),
    #[error("unknown state type {code} for state {state}")]
    UnknownStateType { state: usize, code: i32 },
    #[error("unknown transition type {code} on edge from state {from}")]
    UnknownTransitionType { from: StateId, code: i32 },
    #[error("state {0} is referenced but not defined")]
    DanglingState(i64),
    #[error("set index {0} is out of range")]
    UnknownSet(i32),
    #[error("rule {0} is not defined")]
    UnknownRule(String),
    #[error("broken network structure: {0}")]
    BrokenPairing(String),
    #[error("rule {0} can call itself before consuming a token")]
    LeftRecursion(u32),
    #[error("malformed interp file: {0}")]
    InvalidInterp(String),
}
