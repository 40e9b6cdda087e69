// Construct stack: the open rules, blocks and loops of one walk branch.
//
// The stack is persistent. Frames are reference-counted and shared between
// branches; pushing or popping returns a new stack and never touches the
// frames another branch can see.

use std::rc::Rc;

use caret_net::{LoopKind, State, StateId, StateKind};

use crate::SuggestError;

#[derive(Debug)]
struct Frame {
    state: StateId,
    kind: StateKind,
    /// Caller's follow state, for frames opened by a rule call.
    return_state: Option<StateId>,
    below: Option<Rc<Frame>>,
}

/// Ordered collection of open construct-entry states; the top is the most
/// recently opened.
#[derive(Debug, Clone, Default)]
pub struct ConstructStack {
    top: Option<Rc<Frame>>,
    depth: usize,
}

/// Outcome of entering a state with a given stack.
#[derive(Debug, Clone)]
pub enum StackEffect {
    /// The state cannot be entered with this stack; the branch is dead.
    Rejected,
    /// The state was entered; continue with the given stack.
    Accepted(ConstructStack),
    /// A rule was exited. `to` is the follow state recorded when the rule
    /// was called, `None` for the outermost rule.
    Returned {
        stack: ConstructStack,
        to: Option<StateId>,
    },
}

impl ConstructStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// State id and kind of the top frame.
    pub fn peek(&self) -> Option<(StateId, StateKind)> {
        self.top.as_ref().map(|f| (f.state, f.kind))
    }

    /// Open-construct states from top to bottom.
    pub fn states(&self) -> Vec<StateId> {
        let mut out = Vec::with_capacity(self.depth);
        let mut frame = self.top.as_deref();
        while let Some(f) = frame {
            out.push(f.state);
            frame = f.below.as_deref();
        }
        out
    }

    /// Whether this stack is `base` with zero or more frames pushed on top,
    /// comparing frames by content.
    pub fn extends(&self, base: &ConstructStack) -> bool {
        if base.depth > self.depth {
            return false;
        }
        let mut frame = self.top.as_ref();
        for _ in base.depth..self.depth {
            frame = frame.and_then(|f| f.below.as_ref());
        }
        same_frames(frame, base.top.as_ref())
    }

    fn push(&self, state: &State, return_state: Option<StateId>) -> Self {
        Self {
            top: Some(Rc::new(Frame {
                state: state.id,
                kind: state.kind,
                return_state,
                below: self.top.clone(),
            })),
            depth: self.depth + 1,
        }
    }

    fn below(&self, frame: &Frame) -> Self {
        Self {
            top: frame.below.clone(),
            depth: self.depth - 1,
        }
    }

    // Pop if the top frame satisfies `closes`; reject otherwise.
    fn pop_if(&self, closes: impl Fn(&Frame) -> bool) -> StackEffect {
        match self.top.as_deref() {
            Some(frame) if closes(frame) => StackEffect::Accepted(self.below(frame)),
            _ => StackEffect::Rejected,
        }
    }

    /// Apply the effect of entering `state`.
    ///
    /// `call_return` is the follow state of the rule transition that led to
    /// `state`, if any; a rule frame keeps it until the rule is exited.
    pub fn process(
        &self,
        state: &State,
        call_return: Option<StateId>,
    ) -> Result<StackEffect, SuggestError> {
        let effect = match state.kind {
            StateKind::RuleStart { .. } => StackEffect::Accepted(self.push(state, call_return)),
            StateKind::BlockStart { .. } | StateKind::StarLoopEntry { .. } => {
                StackEffect::Accepted(self.push(state, None))
            }
            StateKind::BlockEnd { start } => self.pop_if(|f| f.state == start),
            StateKind::LoopEnd {
                loopback,
                kind: LoopKind::Star,
            } => self.pop_if(|f| {
                matches!(f.kind, StateKind::StarLoopEntry { loopback: lb } if lb == loopback)
            }),
            // The plus block was closed by its block end already.
            StateKind::LoopEnd {
                kind: LoopKind::Plus,
                ..
            } => StackEffect::Accepted(self.clone()),
            StateKind::StarLoopback => self.pop_if(|f| {
                matches!(f.kind, StateKind::StarLoopEntry { loopback } if loopback == state.id)
            }),
            StateKind::RuleStop { .. } => match self.top.as_deref() {
                Some(frame)
                    if matches!(frame.kind, StateKind::RuleStart { stop } if stop == state.id) =>
                {
                    StackEffect::Returned {
                        stack: self.below(frame),
                        to: frame.return_state,
                    }
                }
                _ => StackEffect::Rejected,
            },
            StateKind::Basic | StateKind::PlusLoopback => StackEffect::Accepted(self.clone()),
            StateKind::TokenStart | StateKind::Invalid => {
                return Err(SuggestError::UnsupportedState {
                    state: state.id,
                    kind: state.kind.name(),
                });
            }
        };
        Ok(effect)
    }
}

fn same_frames(mut a: Option<&Rc<Frame>>, mut b: Option<&Rc<Frame>>) -> bool {
    loop {
        match (a, b) {
            (None, None) => return true,
            (Some(x), Some(y)) => {
                if Rc::ptr_eq(x, y) {
                    return true;
                }
                if x.state != y.state || x.return_state != y.return_state {
                    return false;
                }
                a = x.below.as_ref();
                b = y.below.as_ref();
            }
            _ => return false,
        }
    }
}
