// Programmatic network construction, link derivation and validation.

use caret_core::Category;
use hashbrown::{HashMap, HashSet};

use crate::network::GrammarNetwork;
use crate::state::{BlockKind, LoopKind, State, StateKind};
use crate::transition::{Label, Transition};
use crate::{NetError, StateId};

/// Structural role of a state as declared to the builder.
///
/// Only links that a declaration must name itself are given here (a block
/// start names its end, a loop end names its loopback). All other links are
/// derived by [`NetworkBuilder::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Basic,
    RuleStart,
    RuleStop,
    BlockStart { kind: BlockKind, end: StateId },
    BlockEnd,
    StarLoopEntry,
    StarLoopback,
    PlusLoopback,
    LoopEnd { loopback: StateId },
    TokenStart,
    Invalid,
}

/// Collects states and transitions, then links and validates them into a
/// [`GrammarNetwork`].
///
/// States get consecutive ids in the order they are added. Transitions may
/// reference states that are added later; references are only checked in
/// [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    max_token_type: Category,
    shapes: Vec<(u32, Shape)>,
    edges: Vec<(StateId, Transition)>,
}

impl NetworkBuilder {
    pub fn new(max_token_type: Category) -> Self {
        Self {
            max_token_type,
            shapes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a state belonging to `rule` and return its id.
    pub fn add_state(&mut self, rule: u32, shape: Shape) -> StateId {
        let id = self.shapes.len() as StateId;
        self.shapes.push((rule, shape));
        id
    }

    /// Append a transition to the outgoing list of `from`.
    pub fn add_transition(&mut self, from: StateId, transition: Transition) {
        self.edges.push((from, transition));
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Resolve all pairing links and produce the network.
    ///
    /// Besides checking that every referenced state exists, this derives
    /// - the stop state of every rule start and the start of every rule stop,
    /// - the start of every block end (each must be claimed by exactly one block start),
    /// - the loopback of every star loop entry (from the star loopback edges),
    /// - the loop kind of every loop end,
    /// - epsilon edges from each rule stop to the follow state of every call.
    ///
    /// Rules that can reach a call of themselves without consuming a token
    /// (directly, or through other rules that may match nothing) are
    /// rejected with [`NetError::LeftRecursion`].
    ///
    /// Walks start at the `RuleStart` of `start_rule`.
    pub fn build(self, start_rule: u32) -> Result<GrammarNetwork, NetError> {
        let count = self.shapes.len();
        let check = |id: StateId| -> Result<(), NetError> {
            if (id as usize) < count {
                Ok(())
            } else {
                Err(NetError::DanglingState(id as i64))
            }
        };

        let mut outgoing: Vec<Vec<Transition>> = vec![Vec::new(); count];
        for (from, transition) in self.edges {
            check(from)?;
            check(transition.target)?;
            if let Label::Rule { follow, .. } = transition.label {
                check(follow)?;
            }
            outgoing[from as usize].push(transition);
        }

        // Rules: exactly one start and one stop per rule index.
        let mut starts: HashMap<u32, StateId> = HashMap::new();
        let mut stops: HashMap<u32, StateId> = HashMap::new();
        for (id, &(rule, shape)) in self.shapes.iter().enumerate() {
            let slot = match shape {
                Shape::RuleStart => &mut starts,
                Shape::RuleStop => &mut stops,
                _ => continue,
            };
            if slot.insert(rule, id as StateId).is_some() {
                return Err(NetError::BrokenPairing(format!(
                    "rule {rule} has more than one {}",
                    if matches!(shape, Shape::RuleStart) { "start" } else { "stop" }
                )));
            }
        }
        let rule_count = starts.keys().chain(stops.keys()).map(|&r| r + 1).max().unwrap_or(0);
        let mut rule_starts = Vec::with_capacity(rule_count as usize);
        let mut rule_stops = Vec::with_capacity(rule_count as usize);
        for rule in 0..rule_count {
            match (starts.get(&rule), stops.get(&rule)) {
                (Some(&start), Some(&stop)) => {
                    rule_starts.push(start);
                    rule_stops.push(stop);
                }
                _ => {
                    return Err(NetError::BrokenPairing(format!(
                        "rule {rule} lacks a start or stop state"
                    )));
                }
            }
        }

        // Rule calls must target the start state of the rule they name.
        for (from, transitions) in outgoing.iter().enumerate() {
            for t in transitions {
                if let Label::Rule { rule, .. } = t.label {
                    if rule_starts.get(rule as usize) != Some(&t.target) {
                        return Err(NetError::BrokenPairing(format!(
                            "call from state {from} to rule {rule} does not target its start state"
                        )));
                    }
                }
            }
        }

        // Blocks: every end claimed by exactly one start.
        let mut block_owner: Vec<Option<StateId>> = vec![None; count];
        for (id, &(_, shape)) in self.shapes.iter().enumerate() {
            if let Shape::BlockStart { end, .. } = shape {
                check(end)?;
                if !matches!(self.shapes[end as usize].1, Shape::BlockEnd) {
                    return Err(NetError::BrokenPairing(format!(
                        "block start {id} names {end}, which is not a block end"
                    )));
                }
                if block_owner[end as usize].replace(id as StateId).is_some() {
                    return Err(NetError::BrokenPairing(format!(
                        "block end {end} is claimed by more than one block start"
                    )));
                }
            }
        }

        // Star loops: each loopback returns to exactly one entry and each entry
        // has exactly one loopback.
        let mut entry_loopback: Vec<Option<StateId>> = vec![None; count];
        for (id, &(_, shape)) in self.shapes.iter().enumerate() {
            if !matches!(shape, Shape::StarLoopback) {
                continue;
            }
            let mut claimed = 0;
            for t in &outgoing[id] {
                if matches!(self.shapes[t.target as usize].1, Shape::StarLoopEntry) {
                    if entry_loopback[t.target as usize].replace(id as StateId).is_some() {
                        return Err(NetError::BrokenPairing(format!(
                            "star loop entry {} has more than one loopback",
                            t.target
                        )));
                    }
                    claimed += 1;
                }
            }
            if claimed != 1 {
                return Err(NetError::BrokenPairing(format!(
                    "star loopback {id} returns to {claimed} loop entries"
                )));
            }
        }

        let mut states = Vec::with_capacity(count);
        for (id, ((rule, shape), transitions)) in self.shapes.iter().zip(outgoing).enumerate() {
            let kind = match *shape {
                Shape::Basic => StateKind::Basic,
                Shape::RuleStart => StateKind::RuleStart {
                    stop: rule_stops[*rule as usize],
                },
                Shape::RuleStop => StateKind::RuleStop {
                    start: rule_starts[*rule as usize],
                },
                Shape::BlockStart { kind, end } => StateKind::BlockStart { kind, end },
                Shape::BlockEnd => StateKind::BlockEnd {
                    start: block_owner[id].ok_or_else(|| {
                        NetError::BrokenPairing(format!("block end {id} has no block start"))
                    })?,
                },
                Shape::StarLoopEntry => StateKind::StarLoopEntry {
                    loopback: entry_loopback[id].ok_or_else(|| {
                        NetError::BrokenPairing(format!("star loop entry {id} has no loopback"))
                    })?,
                },
                Shape::StarLoopback => StateKind::StarLoopback,
                Shape::PlusLoopback => StateKind::PlusLoopback,
                Shape::LoopEnd { loopback } => {
                    check(loopback)?;
                    let kind = match self.shapes[loopback as usize].1 {
                        Shape::StarLoopback => LoopKind::Star,
                        Shape::PlusLoopback => LoopKind::Plus,
                        _ => {
                            return Err(NetError::BrokenPairing(format!(
                                "loop end {id} names {loopback}, which is not a loopback"
                            )));
                        }
                    };
                    StateKind::LoopEnd { loopback, kind }
                }
                Shape::TokenStart => StateKind::TokenStart,
                Shape::Invalid => StateKind::Invalid,
            };
            states.push(State {
                id: id as StateId,
                rule: *rule,
                kind,
                transitions,
            });
        }

        check_left_recursion(&states, &rule_starts, &rule_stops)?;

        // Return edges: rule stop -> follow state of each call.
        let mut returns: Vec<(StateId, StateId)> = Vec::new();
        for state in &states {
            for t in &state.transitions {
                if let Label::Rule { follow, rule, .. } = t.label {
                    returns.push((rule_stops[rule as usize], follow));
                }
            }
        }
        for (stop, follow) in returns {
            let transitions = &mut states[stop as usize].transitions;
            if !transitions.iter().any(|t| t.target == follow) {
                transitions.push(Transition::epsilon(follow));
            }
        }

        let start_state = rule_starts
            .get(start_rule as usize)
            .copied()
            .ok_or_else(|| NetError::UnknownRule(format!("#{start_rule}")))?;

        Ok(GrammarNetwork {
            states,
            rule_starts,
            start_state,
            max_token_type: self.max_token_type,
        })
    }
}

/// Reject rules that can call themselves, directly or through other rules,
/// before consuming a token. Walks cannot follow such rules.
fn check_left_recursion(
    states: &[State],
    starts: &[StateId],
    stops: &[StateId],
) -> Result<(), NetError> {
    let rules = starts.len();

    let mut nullable = vec![false; rules];
    loop {
        let mut changed = false;
        for rule in 0..rules {
            if !nullable[rule] && left_edge(states, starts[rule], stops[rule], &nullable).0 {
                nullable[rule] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let calls: Vec<Vec<u32>> = (0..rules)
        .map(|rule| left_edge(states, starts[rule], stops[rule], &nullable).1)
        .collect();

    // Depth-first search for a cycle in the "calls before consuming" graph.
    const OPEN: u8 = 1;
    const DONE: u8 = 2;
    let mut mark = vec![0u8; rules];
    for root in 0..rules {
        if mark[root] != 0 {
            continue;
        }
        mark[root] = OPEN;
        let mut path = vec![(root, 0usize)];
        while let Some((rule, next)) = path.last_mut() {
            let rule = *rule;
            match calls[rule].get(*next) {
                Some(&callee) => {
                    *next += 1;
                    let callee = callee as usize;
                    match mark[callee] {
                        0 => {
                            mark[callee] = OPEN;
                            path.push((callee, 0));
                        }
                        OPEN => return Err(NetError::LeftRecursion(callee as u32)),
                        _ => {}
                    }
                }
                None => {
                    mark[rule] = DONE;
                    path.pop();
                }
            }
        }
    }
    Ok(())
}

/// Follow the moves of one rule that consume no token, stepping over calls
/// to nullable rules. Returns whether the rule's stop is reached and the
/// rules called on the way.
fn left_edge(
    states: &[State],
    start: StateId,
    stop: StateId,
    nullable: &[bool],
) -> (bool, Vec<u32>) {
    let mut seen: HashSet<StateId> = HashSet::new();
    let mut work = vec![start];
    let mut reaches_stop = false;
    let mut calls = Vec::new();
    seen.insert(start);

    while let Some(id) = work.pop() {
        if id == stop {
            reaches_stop = true;
            continue;
        }
        for t in &states[id as usize].transitions {
            let next = match &t.label {
                Label::Rule { rule, follow, .. } => {
                    if !calls.contains(rule) {
                        calls.push(*rule);
                    }
                    if !nullable[*rule as usize] {
                        continue;
                    }
                    *follow
                }
                label if label.is_epsilon() => t.target,
                _ => continue,
            };
            if seen.insert(next) {
                work.push(next);
            }
        }
    }
    (reaches_stop, calls)
}
