// State-network walker: depth-first traversal with an explicit work list.
//
// Each work item is one branch of the walk at one state: where it stands in
// the token stream, its construct stack, the epsilon moves it already took
// at this stream position, and (for a rule entry) the caller's follow state.

use std::rc::Rc;

use caret_core::{Category, EOF};
use caret_net::{GrammarNetwork, Label, State, StateId};
use tracing::trace;

use crate::cancel::CancelToken;
use crate::collector::Collector;
use crate::config::{CANCEL_CHECK_INTERVAL, SuggestOptions};
use crate::stack::{ConstructStack, StackEffect};
use crate::stream::TokenCursor;
use crate::SuggestError;

/// Epsilon moves taken by one branch since its last consumed token, newest
/// first. Each entry is a state with the stack and call return it was
/// entered with.
#[derive(Clone, Default)]
struct Passed(Option<Rc<Entry>>);

struct Entry {
    state: StateId,
    stack: ConstructStack,
    call_return: Option<StateId>,
    prev: Option<Rc<Entry>>,
}

impl Passed {
    /// Whether entering `state` repeats an earlier move of this branch: the
    /// same state and call return, with the earlier stack still underneath.
    fn repeats(
        &self,
        state: StateId,
        stack: &ConstructStack,
        call_return: Option<StateId>,
    ) -> bool {
        let mut entry = self.0.as_deref();
        while let Some(e) = entry {
            if e.state == state && e.call_return == call_return && stack.extends(&e.stack) {
                return true;
            }
            entry = e.prev.as_deref();
        }
        false
    }

    fn with(&self, state: StateId, stack: &ConstructStack, call_return: Option<StateId>) -> Self {
        Passed(Some(Rc::new(Entry {
            state,
            stack: stack.clone(),
            call_return,
            prev: self.0.clone(),
        })))
    }
}

struct Visit<'t> {
    state: StateId,
    tokens: TokenCursor<'t>,
    stack: ConstructStack,
    passed: Passed,
    call_return: Option<StateId>,
}

/// Counters of a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// States visited, including compatibility checks.
    pub steps: usize,
    /// Whether any branch consumed every token in front of the cursor.
    pub cursor_reached: bool,
}

/// Walks one network for one request.
pub struct Walker<'n, 'c> {
    network: &'n GrammarNetwork,
    options: SuggestOptions,
    cancel: Option<&'c CancelToken>,
    steps: usize,
}

impl<'n, 'c> Walker<'n, 'c> {
    pub fn new(network: &'n GrammarNetwork, options: SuggestOptions) -> Self {
        Self {
            network,
            options,
            cancel: None,
            steps: 0,
        }
    }

    pub fn with_cancel(mut self, cancel: &'c CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Walk from `start` over `tokens`, collecting proposals at the cursor.
    ///
    /// Rejected branches are dropped silently. A fault in the network or an
    /// exhausted guard aborts the whole walk.
    pub fn walk(
        &mut self,
        start: StateId,
        tokens: TokenCursor<'_>,
        collector: &mut Collector,
    ) -> Result<WalkStats, SuggestError> {
        let mut cursor_reached = false;
        let mut work = vec![Visit {
            state: start,
            tokens,
            stack: ConstructStack::new(),
            passed: Passed::default(),
            call_return: None,
        }];

        while let Some(visit) = work.pop() {
            self.tick()?;
            let state = self.state(visit.state)?;
            trace!(
                state = state.id,
                kind = state.kind.name(),
                position = visit.tokens.position(),
                depth = visit.stack.depth(),
                "visit"
            );

            let stack = match visit.stack.process(state, visit.call_return)? {
                StackEffect::Rejected => {
                    trace!(state = state.id, "rejected by construct stack");
                    continue;
                }
                StackEffect::Accepted(stack) => stack,
                StackEffect::Returned { stack, to } => {
                    // Without a recorded caller the start rule is complete.
                    if let Some(follow) = to {
                        if visit.passed.repeats(follow, &stack, None) {
                            continue;
                        }
                        let passed = visit.passed.with(follow, &stack, None);
                        work.push(Visit {
                            state: follow,
                            tokens: visit.tokens,
                            stack,
                            passed,
                            call_return: None,
                        });
                    }
                    continue;
                }
            };
            if stack.depth() > self.options.max_nesting {
                return Err(SuggestError::NestingTooDeep(self.options.max_nesting));
            }

            let at_cursor = visit.tokens.at_cursor();
            cursor_reached |= at_cursor;

            // Reverse so the first transition is explored first.
            for transition in state.transitions.iter().rev() {
                let label = &transition.label;
                match label {
                    _ if label.is_epsilon() => {
                        let call_return = label.call_return();
                        if visit.passed.repeats(transition.target, &stack, call_return) {
                            continue;
                        }
                        work.push(Visit {
                            state: transition.target,
                            tokens: visit.tokens,
                            stack: stack.clone(),
                            passed: visit.passed.with(transition.target, &stack, call_return),
                            call_return,
                        });
                    }
                    Label::Atom(_) | Label::Set(_) | Label::Range { .. } => {
                        if at_cursor {
                            if self.compatible(transition.target, &visit.stack)? {
                                self.collect_label(label, collector);
                            }
                        } else if label.matches(visit.tokens.current().category) {
                            work.push(Visit {
                                state: transition.target,
                                tokens: visit.tokens.advance(),
                                stack: stack.clone(),
                                passed: Passed::default(),
                                call_return: None,
                            });
                        }
                    }
                    _ => {
                        return Err(SuggestError::UnsupportedTransition {
                            state: state.id,
                            label: label.kind_name(),
                        });
                    }
                }
            }
        }

        Ok(WalkStats {
            steps: self.steps,
            cursor_reached,
        })
    }

    /// Whether `target` can be entered with `stack` and leads, through
    /// epsilon moves only, to a state that consumes a token or to the end of
    /// the start rule.
    ///
    /// `stack` is the stack the source state was entered with, before that
    /// state's own effect was applied.
    fn compatible(
        &mut self,
        target: StateId,
        stack: &ConstructStack,
    ) -> Result<bool, SuggestError> {
        let mut work = vec![(target, stack.clone(), None, Passed::default())];

        while let Some((id, stack, call_return, passed)) = work.pop() {
            self.tick()?;
            let state = self.state(id)?;
            let stack = match stack.process(state, call_return)? {
                StackEffect::Rejected => continue,
                StackEffect::Accepted(stack) => stack,
                StackEffect::Returned { to: None, .. } => return Ok(true),
                StackEffect::Returned {
                    stack,
                    to: Some(follow),
                } => {
                    if !passed.repeats(follow, &stack, None) {
                        let passed = passed.with(follow, &stack, None);
                        work.push((follow, stack, None, passed));
                    }
                    continue;
                }
            };
            if stack.depth() > self.options.max_nesting {
                return Err(SuggestError::NestingTooDeep(self.options.max_nesting));
            }
            if !state.is_epsilon_only() {
                return Ok(true);
            }
            for transition in state.transitions.iter().rev() {
                let call_return = transition.label.call_return();
                if passed.repeats(transition.target, &stack, call_return) {
                    continue;
                }
                let next = passed.with(transition.target, &stack, call_return);
                work.push((transition.target, stack.clone(), call_return, next));
            }
        }
        Ok(false)
    }

    /// Collect the categories of a labeled edge that a lexer for this
    /// network can produce: `EOF` and `1..=max_token_type`.
    fn collect_label(&self, label: &Label, collector: &mut Collector) {
        let max = self.network.max_token_type();
        let mut collect = |start: Category, end: Category| {
            if start <= EOF && EOF <= end {
                collector.collect(EOF);
            }
            for category in start.max(1)..=end.min(max) {
                collector.collect(category);
            }
        };
        match label {
            Label::Atom(category) => collect(*category, *category),
            Label::Range { start, end } => collect(*start, *end),
            Label::Set(set) => {
                for &(start, end) in set.intervals() {
                    collect(start, end);
                }
            }
            _ => {}
        }
    }

    #[inline]
    fn state(&self, id: StateId) -> Result<&'n State, SuggestError> {
        self.network.state(id).ok_or(SuggestError::UnknownState(id))
    }

    fn tick(&mut self) -> Result<(), SuggestError> {
        self.steps += 1;
        if self.steps > self.options.max_steps {
            return Err(SuggestError::StepBudgetExhausted(self.options.max_steps));
        }
        if self.steps % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(cancel) = self.cancel {
                if cancel.is_cancelled() {
                    return Err(SuggestError::Cancelled);
                }
            }
        }
        Ok(())
    }
}
