// Transitions between network states and their labels.

use caret_core::Category;

use crate::StateId;

/// A set of categories stored as inclusive intervals.
///
/// Serialized networks describe sets as interval lists; keeping that shape
/// avoids expanding large ranges (for example `~';'` style sets) into
/// per-category vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalSet {
    intervals: Vec<(Category, Category)>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from individual categories, merging adjacent values.
    pub fn from_categories(categories: &[Category]) -> Self {
        let mut sorted = categories.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut set = Self::new();
        for c in sorted {
            set.add_range(c, c);
        }
        set
    }

    /// Add the inclusive range `start..=end`. Empty ranges are ignored.
    ///
    /// Ranges touching the last stored interval are merged into it.
    pub fn add_range(&mut self, start: Category, end: Category) {
        if start > end {
            return;
        }
        if let Some(last) = self.intervals.last_mut() {
            if start >= last.0 && start <= last.1.saturating_add(1) {
                last.1 = last.1.max(end);
                return;
            }
        }
        self.intervals.push((start, end));
    }

    pub fn add(&mut self, category: Category) {
        self.add_range(category, category);
    }

    pub fn contains(&self, category: Category) -> bool {
        self.intervals
            .iter()
            .any(|&(start, end)| category >= start && category <= end)
    }

    pub fn intervals(&self) -> &[(Category, Category)] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterate all member categories in interval order.
    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.intervals.iter().flat_map(|&(start, end)| start..=end)
    }
}

/// What a transition requires (or does) when it is taken.
///
/// The first five variants consume no token; the parser-side simulation
/// treats them uniformly as epsilon moves. `Rule` targets the callee's
/// `RuleStart` state and remembers where the caller continues.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Label {
    Epsilon,
    /// Rule invocation; `follow` is the caller's state after the call.
    Rule {
        follow: StateId,
        rule: u32,
        precedence: i32,
    },
    Predicate {
        rule: u32,
        predicate: u32,
        context_dependent: bool,
    },
    Precedence(i32),
    Action {
        rule: u32,
        action: i32,
        context_dependent: bool,
    },
    /// Exactly one category.
    Atom(Category),
    /// Any category in `start..=end`.
    Range { start: Category, end: Category },
    /// Any category in the set.
    Set(IntervalSet),
    /// Any category of the vocabulary not in the set.
    NotSet(IntervalSet),
    /// Any category of the vocabulary.
    Wildcard,
}

impl Label {
    /// Whether taking this transition consumes no token.
    #[inline]
    pub fn is_epsilon(&self) -> bool {
        matches!(
            self,
            Label::Epsilon
                | Label::Rule { .. }
                | Label::Predicate { .. }
                | Label::Precedence(_)
                | Label::Action { .. }
        )
    }

    /// The caller's continuation state for rule invocations.
    #[inline]
    pub fn call_return(&self) -> Option<StateId> {
        match self {
            Label::Rule { follow, .. } => Some(*follow),
            _ => None,
        }
    }

    /// Whether `category` satisfies this label.
    ///
    /// Only meaningful for `Atom`, `Range` and `Set`; complemented labels need
    /// the vocabulary size and epsilon labels match nothing.
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Label::Atom(c) => *c == category,
            Label::Range { start, end } => category >= *start && category <= *end,
            Label::Set(set) => set.contains(category),
            _ => false,
        }
    }

    /// Short name of the label kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Label::Epsilon => "epsilon",
            Label::Rule { .. } => "rule",
            Label::Predicate { .. } => "predicate",
            Label::Precedence(_) => "precedence",
            Label::Action { .. } => "action",
            Label::Atom(_) => "atom",
            Label::Range { .. } => "range",
            Label::Set(_) => "set",
            Label::NotSet(_) => "not-set",
            Label::Wildcard => "wildcard",
        }
    }
}

/// An outgoing edge of a state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    pub target: StateId,
    pub label: Label,
}

impl Transition {
    pub fn new(target: StateId, label: Label) -> Self {
        Self { target, label }
    }

    pub fn epsilon(target: StateId) -> Self {
        Self::new(target, Label::Epsilon)
    }

    pub fn atom(target: StateId, category: Category) -> Self {
        Self::new(target, Label::Atom(category))
    }

    #[inline]
    pub fn is_epsilon(&self) -> bool {
        self.label.is_epsilon()
    }
}
