// ANTLR 4 serialized networks: the integer word sequence emitted by the
// ANTLR tool (the `atn:` section of `.interp` files, `_serializedATN` in
// generated parsers).

use caret_core::{Category, EOF};

use crate::builder::{NetworkBuilder, Shape};
use crate::network::GrammarNetwork;
use crate::state::{BlockKind, StateKind};
use crate::transition::{IntervalSet, Label, Transition};
use crate::{NetError, StateId};

/// The only serialization version this crate reads and writes.
pub const SERIALIZED_VERSION: i32 = 4;

const GRAMMAR_PARSER: i32 = 1;

// State type codes.
const INVALID: i32 = 0;
const BASIC: i32 = 1;
const RULE_START: i32 = 2;
const BLOCK_START: i32 = 3;
const PLUS_BLOCK_START: i32 = 4;
const STAR_BLOCK_START: i32 = 5;
const TOKEN_START: i32 = 6;
const RULE_STOP: i32 = 7;
const BLOCK_END: i32 = 8;
const STAR_LOOP_BACK: i32 = 9;
const STAR_LOOP_ENTRY: i32 = 10;
const PLUS_LOOP_BACK: i32 = 11;
const LOOP_END: i32 = 12;

// Transition type codes.
const EPSILON: i32 = 1;
const RANGE: i32 = 2;
const RULE: i32 = 3;
const PREDICATE: i32 = 4;
const ATOM: i32 = 5;
const ACTION: i32 = 6;
const SET: i32 = 7;
const NOT_SET: i32 = 8;
const WILDCARD: i32 = 9;
const PRECEDENCE: i32 = 10;

struct Words<'a> {
    data: &'a [i32],
    pos: usize,
}

impl<'a> Words<'a> {
    fn next(&mut self, what: &'static str) -> Result<i32, NetError> {
        let word = *self.data.get(self.pos).ok_or(NetError::Truncated(what))?;
        self.pos += 1;
        Ok(word)
    }

    fn count(&mut self, what: &'static str) -> Result<usize, NetError> {
        let n = self.next(what)?;
        usize::try_from(n).map_err(|_| NetError::Truncated(what))
    }

    fn state(&mut self, what: &'static str, nstates: usize) -> Result<StateId, NetError> {
        let id = self.next(what)?;
        state_ref(id, nstates)
    }
}

fn state_ref(id: i32, nstates: usize) -> Result<StateId, NetError> {
    if id >= 0 && (id as usize) < nstates {
        Ok(id as StateId)
    } else {
        Err(NetError::DanglingState(id as i64))
    }
}

/// Decode a parser network from serialized words. Walks start at rule 0.
///
/// Lexer networks are rejected with [`NetError::UnsupportedGrammarType`].
/// Non-greedy and precedence markers and the decision list are read and
/// skipped; the suggestion walk does not use them.
pub fn deserialize(data: &[i32]) -> Result<GrammarNetwork, NetError> {
    let mut words = Words { data, pos: 0 };

    let version = words.next("version")?;
    if version != SERIALIZED_VERSION {
        return Err(NetError::UnsupportedVersion {
            found: version,
            expected: SERIALIZED_VERSION,
        });
    }
    let grammar_type = words.next("grammar type")?;
    if grammar_type != GRAMMAR_PARSER {
        return Err(NetError::UnsupportedGrammarType(grammar_type));
    }
    let max_token_type = words.next("max token type")?;

    // States. Links to later states are checked once the count is known.
    let nstates = words.count("state count")?;
    let mut builder = NetworkBuilder::new(max_token_type);
    for index in 0..nstates {
        let code = words.next("state type")?;
        if code == INVALID {
            builder.add_state(0, Shape::Invalid);
            continue;
        }
        let rule = words.next("state rule index")?;
        let rule = u32::try_from(rule).map_err(|_| NetError::UnknownRule(rule.to_string()))?;
        let shape = match code {
            BASIC => Shape::Basic,
            RULE_START => Shape::RuleStart,
            BLOCK_START | PLUS_BLOCK_START | STAR_BLOCK_START => {
                let kind = match code {
                    BLOCK_START => BlockKind::Basic,
                    PLUS_BLOCK_START => BlockKind::Plus,
                    _ => BlockKind::Star,
                };
                let end = words.state("block end", nstates)?;
                Shape::BlockStart { kind, end }
            }
            TOKEN_START => Shape::TokenStart,
            RULE_STOP => Shape::RuleStop,
            BLOCK_END => Shape::BlockEnd,
            STAR_LOOP_BACK => Shape::StarLoopback,
            STAR_LOOP_ENTRY => Shape::StarLoopEntry,
            PLUS_LOOP_BACK => Shape::PlusLoopback,
            LOOP_END => Shape::LoopEnd {
                loopback: words.state("loop end loopback", nstates)?,
            },
            _ => return Err(NetError::UnknownStateType { state: index, code }),
        };
        builder.add_state(rule, shape);
    }

    for what in ["non-greedy states", "precedence states"] {
        let n = words.count(what)?;
        for _ in 0..n {
            words.state(what, nstates)?;
        }
    }

    let nrules = words.count("rule count")?;
    let mut listed_starts = Vec::with_capacity(nrules);
    for _ in 0..nrules {
        listed_starts.push(words.state("rule start", nstates)?);
    }

    let nmodes = words.count("mode count")?;
    for _ in 0..nmodes {
        words.state("mode start", nstates)?;
    }

    let nsets = words.count("set count")?;
    let mut sets = Vec::with_capacity(nsets);
    for _ in 0..nsets {
        let nintervals = words.count("set interval count")?;
        let mut set = IntervalSet::new();
        if words.next("set eof flag")? != 0 {
            set.add(EOF);
        }
        for _ in 0..nintervals {
            let lo = words.next("set interval")?;
            let hi = words.next("set interval")?;
            set.add_range(lo, hi);
        }
        sets.push(set);
    }
    let set_at = |index: i32| -> Result<IntervalSet, NetError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| sets.get(i))
            .cloned()
            .ok_or(NetError::UnknownSet(index))
    };

    let nedges = words.count("edge count")?;
    for _ in 0..nedges {
        let src = words.state("edge source", nstates)?;
        let trg = words.state("edge target", nstates)?;
        let code = words.next("edge type")?;
        let a1 = words.next("edge argument")?;
        let a2 = words.next("edge argument")?;
        let a3 = words.next("edge argument")?;
        let transition = match code {
            EPSILON => Transition::epsilon(trg),
            RANGE => Transition::new(
                trg,
                Label::Range {
                    start: if a3 != 0 { EOF } else { a1 },
                    end: a2,
                },
            ),
            RULE => Transition::new(
                state_ref(a1, nstates)?,
                Label::Rule {
                    follow: trg,
                    rule: u32::try_from(a2).map_err(|_| NetError::UnknownRule(a2.to_string()))?,
                    precedence: a3,
                },
            ),
            PREDICATE => Transition::new(
                trg,
                Label::Predicate {
                    rule: a1 as u32,
                    predicate: a2 as u32,
                    context_dependent: a3 != 0,
                },
            ),
            ATOM => Transition::atom(trg, if a3 != 0 { EOF } else { a1 }),
            ACTION => Transition::new(
                trg,
                Label::Action {
                    rule: a1 as u32,
                    action: a2,
                    context_dependent: a3 != 0,
                },
            ),
            SET => Transition::new(trg, Label::Set(set_at(a1)?)),
            NOT_SET => Transition::new(trg, Label::NotSet(set_at(a1)?)),
            WILDCARD => Transition::new(trg, Label::Wildcard),
            PRECEDENCE => Transition::new(trg, Label::Precedence(a1)),
            _ => return Err(NetError::UnknownTransitionType { from: src, code }),
        };
        builder.add_transition(src, transition);
    }

    let ndecisions = words.count("decision count")?;
    for _ in 0..ndecisions {
        words.state("decision state", nstates)?;
    }

    let network = builder.build(0)?;
    if network.rule_starts() != listed_starts.as_slice() {
        return Err(NetError::BrokenPairing(
            "rule start list disagrees with rule start states".to_string(),
        ));
    }
    Ok(network)
}

/// Encode a network as serialized words that [`deserialize`] (and the ANTLR
/// runtime) can read back.
///
/// Rule stop edges are derived on load and therefore not written. Decision
/// states are listed in state order.
pub fn serialize(network: &GrammarNetwork) -> Vec<i32> {
    let mut out = vec![SERIALIZED_VERSION, GRAMMAR_PARSER, network.max_token_type()];

    out.push(network.len() as i32);
    for state in network.states() {
        let (code, extra) = match state.kind {
            StateKind::Invalid => {
                out.push(INVALID);
                continue;
            }
            StateKind::Basic => (BASIC, None),
            StateKind::RuleStart { .. } => (RULE_START, None),
            StateKind::RuleStop { .. } => (RULE_STOP, None),
            StateKind::BlockStart { kind, end } => (
                match kind {
                    BlockKind::Basic => BLOCK_START,
                    BlockKind::Plus => PLUS_BLOCK_START,
                    BlockKind::Star => STAR_BLOCK_START,
                },
                Some(end as i32),
            ),
            StateKind::BlockEnd { .. } => (BLOCK_END, None),
            StateKind::StarLoopEntry { .. } => (STAR_LOOP_ENTRY, None),
            StateKind::StarLoopback => (STAR_LOOP_BACK, None),
            StateKind::PlusLoopback => (PLUS_LOOP_BACK, None),
            StateKind::LoopEnd { loopback, .. } => (LOOP_END, Some(loopback as i32)),
            StateKind::TokenStart => (TOKEN_START, None),
        };
        out.push(code);
        out.push(state.rule as i32);
        out.extend(extra);
    }

    // No non-greedy or precedence markers.
    out.push(0);
    out.push(0);

    out.push(network.rule_count() as i32);
    out.extend(network.rule_starts().iter().map(|&s| s as i32));

    // Parser networks have no modes.
    out.push(0);

    let mut sets: Vec<&IntervalSet> = Vec::new();
    let mut edges: Vec<[i32; 6]> = Vec::new();
    for state in network.states() {
        if matches!(state.kind, StateKind::RuleStop { .. }) {
            continue;
        }
        let src = state.id as i32;
        for t in &state.transitions {
            let trg = t.target as i32;
            let edge = match &t.label {
                Label::Epsilon => [src, trg, EPSILON, 0, 0, 0],
                Label::Range { start, end } if *start == EOF => [src, trg, RANGE, 0, *end, 1],
                Label::Range { start, end } => [src, trg, RANGE, *start, *end, 0],
                Label::Rule {
                    follow,
                    rule,
                    precedence,
                } => [src, *follow as i32, RULE, trg, *rule as i32, *precedence],
                Label::Predicate {
                    rule,
                    predicate,
                    context_dependent,
                } => [
                    src,
                    trg,
                    PREDICATE,
                    *rule as i32,
                    *predicate as i32,
                    *context_dependent as i32,
                ],
                Label::Atom(c) if *c == EOF => [src, trg, ATOM, 0, 0, 1],
                Label::Atom(c) => [src, trg, ATOM, *c, 0, 0],
                Label::Action {
                    rule,
                    action,
                    context_dependent,
                } => [src, trg, ACTION, *rule as i32, *action, *context_dependent as i32],
                Label::Set(set) => [src, trg, SET, set_index(&mut sets, set), 0, 0],
                Label::NotSet(set) => [src, trg, NOT_SET, set_index(&mut sets, set), 0, 0],
                Label::Wildcard => [src, trg, WILDCARD, 0, 0, 0],
                Label::Precedence(p) => [src, trg, PRECEDENCE, *p, 0, 0],
            };
            edges.push(edge);
        }
    }

    out.push(sets.len() as i32);
    for set in &sets {
        write_set(&mut out, set);
    }

    out.push(edges.len() as i32);
    for edge in &edges {
        out.extend_from_slice(edge);
    }

    let decisions: Vec<i32> = network
        .states()
        .iter()
        .filter(|s| {
            matches!(
                s.kind,
                StateKind::BlockStart { .. }
                    | StateKind::StarLoopEntry { .. }
                    | StateKind::PlusLoopback
                    | StateKind::TokenStart
            )
        })
        .map(|s| s.id as i32)
        .collect();
    out.push(decisions.len() as i32);
    out.extend(decisions);

    out
}

fn set_index<'n>(sets: &mut Vec<&'n IntervalSet>, set: &'n IntervalSet) -> i32 {
    if let Some(i) = sets.iter().position(|s| *s == set) {
        return i as i32;
    }
    sets.push(set);
    (sets.len() - 1) as i32
}

// End-of-input membership is a flag; the interval list starts at 0.
fn write_set(out: &mut Vec<i32>, set: &IntervalSet) {
    let contains_eof = set.contains(EOF);
    let intervals: Vec<(Category, Category)> = set
        .intervals()
        .iter()
        .filter_map(|&(lo, hi)| {
            if lo > EOF {
                Some((lo, hi))
            } else if hi >= 0 {
                Some((0, hi))
            } else {
                None
            }
        })
        .collect();
    out.push(intervals.len() as i32);
    out.push(contains_eof as i32);
    for (lo, hi) in intervals {
        out.push(lo);
        out.push(hi);
    }
}
