// The immutable grammar state network.

use caret_core::Category;

use crate::state::State;
use crate::{NetError, StateId};

/// A compiled parser grammar: indexed states with their transitions.
///
/// Built once (by [`NetworkBuilder`](crate::NetworkBuilder) or one of the
/// loaders) and then only read. All pairing links between states are resolved
/// and validated at build time, so traversal code can rely on them.
///
/// The network owns all of its data and is `Send + Sync`; share it behind a
/// reference or an `Arc` between concurrent requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarNetwork {
    pub(crate) states: Vec<State>,
    pub(crate) rule_starts: Vec<StateId>,
    pub(crate) start_state: StateId,
    pub(crate) max_token_type: Category,
}

impl GrammarNetwork {
    /// Look up a state by id.
    #[inline]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id as usize)
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Number of states, including placeholder slots.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Entry state of a suggestion walk (the start rule's `RuleStart`).
    #[inline]
    pub fn start_state(&self) -> StateId {
        self.start_state
    }

    /// `RuleStart` state of every rule, indexed by rule.
    pub fn rule_starts(&self) -> &[StateId] {
        &self.rule_starts
    }

    pub fn rule_count(&self) -> usize {
        self.rule_starts.len()
    }

    pub fn rule_start(&self, rule: u32) -> Option<StateId> {
        self.rule_starts.get(rule as usize).copied()
    }

    /// Largest category the grammar's vocabulary defines.
    pub fn max_token_type(&self) -> Category {
        self.max_token_type
    }

    /// Index of the rule walks start from.
    pub fn start_rule(&self) -> Option<u32> {
        self.state(self.start_state).map(|s| s.rule)
    }

    /// Return a copy of this network that starts walks at `rule`.
    pub fn with_start_rule(mut self, rule: u32) -> Result<Self, NetError> {
        self.start_state = self
            .rule_start(rule)
            .ok_or_else(|| NetError::UnknownRule(format!("#{rule}")))?;
        Ok(self)
    }

    /// Number of transitions over all states.
    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }
}
