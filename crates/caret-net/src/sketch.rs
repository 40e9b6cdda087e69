// Grammar sketches: EBNF-shaped rules laid out as networks with the same
// structural shapes the ANTLR tool produces. Test and benchmark support only.

use caret_core::{Category, EOF};

use crate::builder::{NetworkBuilder, Shape};
use crate::grammar::Grammar;
use crate::network::GrammarNetwork;
use crate::state::BlockKind;
use crate::transition::{IntervalSet, Label, Transition};
use crate::vocabulary::Vocabulary;
use crate::{NetError, StateId};

/// One element of a rule body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Token(Category),
    Set(Vec<Category>),
    Rule(String),
    Seq(Vec<Element>),
    Alt(Vec<Element>),
    Optional(Box<Element>),
    Star(Box<Element>),
    Plus(Box<Element>),
}

pub fn tok(category: Category) -> Element {
    Element::Token(category)
}

pub fn eof() -> Element {
    Element::Token(EOF)
}

pub fn set(categories: &[Category]) -> Element {
    Element::Set(categories.to_vec())
}

pub fn rule(name: &str) -> Element {
    Element::Rule(name.to_string())
}

pub fn seq(elements: impl IntoIterator<Item = Element>) -> Element {
    Element::Seq(elements.into_iter().collect())
}

pub fn alt(alternatives: impl IntoIterator<Item = Element>) -> Element {
    Element::Alt(alternatives.into_iter().collect())
}

pub fn opt(element: Element) -> Element {
    Element::Optional(Box::new(element))
}

pub fn star(element: Element) -> Element {
    Element::Star(Box::new(element))
}

pub fn plus(element: Element) -> Element {
    Element::Plus(Box::new(element))
}

/// A set of named rules. The first rule is the start rule.
///
/// ```
/// use caret_net::sketch::{Sketch, alt, seq, tok};
/// // s : 'a' 'b' | 'a' 'c' ;
/// let net = Sketch::new()
///     .rule("s", alt([seq([tok(1), tok(2)]), seq([tok(1), tok(3)])]))
///     .compile()
///     .unwrap();
/// assert_eq!(net.rule_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    rules: Vec<(String, Element)>,
}

impl Sketch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, name: &str, body: Element) -> Self {
        self.rules.push((name.to_string(), body));
        self
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Lay out all rules and build the network.
    pub fn compile(&self) -> Result<GrammarNetwork, NetError> {
        let max_token_type = self
            .rules
            .iter()
            .map(|(_, body)| max_category(body))
            .max()
            .unwrap_or(0);
        let mut layout = Layout {
            builder: NetworkBuilder::new(max_token_type),
            names: self.rule_names(),
            starts: Vec::with_capacity(self.rules.len()),
        };

        let mut stops = Vec::with_capacity(self.rules.len());
        for index in 0..self.rules.len() as u32 {
            layout.starts.push(layout.builder.add_state(index, Shape::RuleStart));
            stops.push(layout.builder.add_state(index, Shape::RuleStop));
        }
        for (index, (_, body)) in self.rules.iter().enumerate() {
            let rule = index as u32;
            let exit = layout.emit(rule, body, layout.starts[index])?;
            layout.builder.add_transition(exit, Transition::epsilon(stops[index]));
        }
        layout.builder.build(0)
    }

    /// Compile into a [`Grammar`] with the given vocabulary.
    pub fn grammar(&self, vocabulary: Vocabulary) -> Result<Grammar, NetError> {
        Ok(Grammar::new(self.compile()?, vocabulary, self.rule_names()))
    }
}

struct Layout {
    builder: NetworkBuilder,
    names: Vec<String>,
    starts: Vec<StateId>,
}

impl Layout {
    fn basic(&mut self, rule: u32) -> StateId {
        self.builder.add_state(rule, Shape::Basic)
    }

    fn epsilon(&mut self, from: StateId, to: StateId) {
        self.builder.add_transition(from, Transition::epsilon(to));
    }

    // Emit `element` entered from `from`; returns the state after it.
    fn emit(&mut self, rule: u32, element: &Element, from: StateId) -> Result<StateId, NetError> {
        match element {
            Element::Token(category) => Ok(self.labeled(rule, from, Label::Atom(*category))),
            Element::Set(categories) => Ok(self.labeled(
                rule,
                from,
                Label::Set(IntervalSet::from_categories(categories)),
            )),
            Element::Rule(name) => {
                let callee = self
                    .names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| NetError::UnknownRule(name.clone()))?;
                let src = self.basic(rule);
                let follow = self.basic(rule);
                self.epsilon(from, src);
                self.builder.add_transition(
                    src,
                    Transition::new(
                        self.starts[callee],
                        Label::Rule {
                            follow,
                            rule: callee as u32,
                            precedence: 0,
                        },
                    ),
                );
                Ok(follow)
            }
            Element::Seq(elements) => {
                let mut at = from;
                for e in elements {
                    at = self.emit(rule, e, at)?;
                }
                Ok(at)
            }
            Element::Alt(alternatives) => self.block(rule, alternatives, false, from),
            Element::Optional(inner) => {
                self.block(rule, std::slice::from_ref(inner.as_ref()), true, from)
            }
            Element::Star(body) => {
                let entry = self.builder.add_state(rule, Shape::StarLoopEntry);
                let block_end = self.builder.add_state(rule, Shape::BlockEnd);
                let block = self.builder.add_state(
                    rule,
                    Shape::BlockStart {
                        kind: BlockKind::Star,
                        end: block_end,
                    },
                );
                let loopback = self.builder.add_state(rule, Shape::StarLoopback);
                let loop_end = self.builder.add_state(rule, Shape::LoopEnd { loopback });
                self.epsilon(from, entry);
                self.epsilon(entry, block);
                self.epsilon(entry, loop_end);
                let exit = self.emit(rule, body, block)?;
                self.epsilon(exit, block_end);
                self.epsilon(block_end, loopback);
                self.epsilon(loopback, entry);
                Ok(loop_end)
            }
            Element::Plus(body) => {
                let block_end = self.builder.add_state(rule, Shape::BlockEnd);
                let block = self.builder.add_state(
                    rule,
                    Shape::BlockStart {
                        kind: BlockKind::Plus,
                        end: block_end,
                    },
                );
                let loopback = self.builder.add_state(rule, Shape::PlusLoopback);
                let loop_end = self.builder.add_state(rule, Shape::LoopEnd { loopback });
                self.epsilon(from, block);
                let exit = self.emit(rule, body, block)?;
                self.epsilon(exit, block_end);
                self.epsilon(block_end, loopback);
                self.epsilon(loopback, block);
                self.epsilon(loopback, loop_end);
                Ok(loop_end)
            }
        }
    }

    // Labeled edges always leave a basic state of their own.
    fn labeled(&mut self, rule: u32, from: StateId, label: Label) -> StateId {
        let src = self.basic(rule);
        let dst = self.basic(rule);
        self.epsilon(from, src);
        self.builder.add_transition(src, Transition::new(dst, label));
        dst
    }

    fn block(
        &mut self,
        rule: u32,
        alternatives: &[Element],
        optional: bool,
        from: StateId,
    ) -> Result<StateId, NetError> {
        let end = self.builder.add_state(rule, Shape::BlockEnd);
        let start = self.builder.add_state(
            rule,
            Shape::BlockStart {
                kind: BlockKind::Basic,
                end,
            },
        );
        self.epsilon(from, start);
        for alternative in alternatives {
            let exit = self.emit(rule, alternative, start)?;
            self.epsilon(exit, end);
        }
        if optional {
            self.epsilon(start, end);
        }
        Ok(end)
    }
}

fn max_category(element: &Element) -> Category {
    match element {
        Element::Token(c) => *c,
        Element::Set(cs) => cs.iter().copied().max().unwrap_or(0),
        Element::Rule(_) => 0,
        Element::Seq(es) | Element::Alt(es) => es.iter().map(max_category).max().unwrap_or(0),
        Element::Optional(e) | Element::Star(e) | Element::Plus(e) => max_category(e),
    }
}
