// Network states and their structural roles.

use crate::StateId;
use crate::transition::Transition;

/// Which loop flavour a block start or loop end belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockKind {
    /// A plain `( ... | ... )` block, optional or not.
    Basic,
    /// The body of a `( ... )*` loop.
    Star,
    /// The body of a `( ... )+` loop.
    Plus,
}

/// The loop closed by a [`StateKind::LoopEnd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopKind {
    Star,
    Plus,
}

/// Structural role of a state.
///
/// Paired variants carry the id of their partner. The links are resolved when
/// a network is built, so a `GrammarNetwork` never holds a dangling pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateKind {
    Basic,
    RuleStart { stop: StateId },
    RuleStop { start: StateId },
    BlockStart { kind: BlockKind, end: StateId },
    BlockEnd { start: StateId },
    /// Decision state in front of a `*` loop; `loopback` is its back edge.
    StarLoopEntry { loopback: StateId },
    StarLoopback,
    PlusLoopback,
    /// Exit of a `*` or `+` loop. `loopback` is the loop's back-edge state.
    LoopEnd { loopback: StateId, kind: LoopKind },
    /// Lexer-only state.
    TokenStart,
    /// Placeholder for a slot removed from the network.
    Invalid,
}

impl StateKind {
    /// Name of the variant, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            StateKind::Basic => "basic",
            StateKind::RuleStart { .. } => "rule-start",
            StateKind::RuleStop { .. } => "rule-stop",
            StateKind::BlockStart {
                kind: BlockKind::Basic,
                ..
            } => "block-start",
            StateKind::BlockStart {
                kind: BlockKind::Star,
                ..
            } => "star-block-start",
            StateKind::BlockStart {
                kind: BlockKind::Plus,
                ..
            } => "plus-block-start",
            StateKind::BlockEnd { .. } => "block-end",
            StateKind::StarLoopEntry { .. } => "star-loop-entry",
            StateKind::StarLoopback => "star-loopback",
            StateKind::PlusLoopback => "plus-loopback",
            StateKind::LoopEnd { .. } => "loop-end",
            StateKind::TokenStart => "token-start",
            StateKind::Invalid => "invalid",
        }
    }

    /// Whether entering this state opens a construct.
    #[inline]
    pub fn opens_construct(&self) -> bool {
        matches!(
            self,
            StateKind::RuleStart { .. }
                | StateKind::BlockStart { .. }
                | StateKind::StarLoopEntry { .. }
        )
    }
}

/// One node of a grammar state network.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    pub id: StateId,
    /// Index of the rule this state belongs to.
    pub rule: u32,
    pub kind: StateKind,
    /// Outgoing transitions in declaration order.
    pub transitions: Vec<Transition>,
}

impl State {
    /// Whether every outgoing transition consumes no token.
    ///
    /// A state without transitions is not epsilon-only.
    pub fn is_epsilon_only(&self) -> bool {
        !self.transitions.is_empty() && self.transitions.iter().all(Transition::is_epsilon)
    }
}
