//! Property tests for suggestions over a nested-list grammar:
//!
//!   start : value EOF ;
//!   value : INT | '[' (value (',' value)*)? ']' ;

use std::collections::BTreeSet;

use caret_complete::{Suggester, Suggestions};
use caret_core::{Category, EOF, Token};
use caret_net::GrammarNetwork;
use caret_net::sketch::{Sketch, alt, eof, opt, rule, seq, star, tok};
use proptest::prelude::*;

const LB: Category = 1;
const INT: Category = 2;
const COMMA: Category = 3;
const RB: Category = 4;

fn network() -> GrammarNetwork {
    Sketch::new()
        .rule("start", seq([rule("value"), eof()]))
        .rule(
            "value",
            alt([
                tok(INT),
                seq([
                    tok(LB),
                    opt(seq([rule("value"), star(seq([tok(COMMA), rule("value")]))])),
                    tok(RB),
                ]),
            ]),
        )
        .compile()
        .unwrap()
}

fn suggest(net: &GrammarNetwork, preceding: &[Category]) -> Suggestions {
    let mut tokens: Vec<Token> = preceding
        .iter()
        .enumerate()
        .map(|(i, &c)| Token::new(c, i, 1))
        .collect();
    tokens.push(Token::cursor(preceding.len()));
    Suggester::new(net).suggest(&tokens).unwrap()
}

/// Token categories of one well-formed value.
fn value() -> impl Strategy<Value = Vec<Category>> {
    Just(vec![INT]).prop_recursive(4, 48, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(|items| {
            let mut out = vec![LB];
            for (i, item) in items.into_iter().enumerate() {
                if i > 0 {
                    out.push(COMMA);
                }
                out.extend(item);
            }
            out.push(RB);
            out
        })
    })
}

/// Arbitrary, mostly ill-formed, token sequences.
fn noise() -> impl Strategy<Value = Vec<Category>> {
    prop::collection::vec(prop::sample::select(vec![LB, INT, COMMA, RB]), 0..10)
}

#[test]
fn empty_input_proposes_sentence_starts() {
    let s = suggest(&network(), &[]);
    assert!(s.cursor_reached);
    assert_eq!(s.proposed, BTreeSet::from([LB, INT]));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // Every token of a valid sentence is proposed after the tokens before it.
    #[test]
    fn valid_sentences_are_completed(sentence in value()) {
        let net = network();
        let mut sentence = sentence;
        sentence.push(EOF);
        for i in 0..sentence.len() {
            let s = suggest(&net, &sentence[..i]);
            prop_assert!(s.cursor_reached);
            prop_assert!(
                s.proposed.contains(&sentence[i]),
                "{:?} not proposed after {:?}: {:?}",
                sentence[i],
                &sentence[..i],
                s.proposed
            );
        }
    }

    // Appending any proposed token keeps the prefix valid.
    #[test]
    fn proposals_extend_the_prefix(prefix in noise()) {
        let net = network();
        let s = suggest(&net, &prefix);
        for &c in s.proposed.iter().filter(|&&c| c != EOF) {
            let mut extended = prefix.clone();
            extended.push(c);
            prop_assert!(
                suggest(&net, &extended).cursor_reached,
                "{c} proposed after {prefix:?} but rejected once appended"
            );
        }
    }

    #[test]
    fn unreachable_cursor_proposes_nothing(prefix in noise()) {
        let s = suggest(&network(), &prefix);
        prop_assert!(s.cursor_reached || s.proposed.is_empty());
    }

    #[test]
    fn requests_are_idempotent(prefix in noise()) {
        let net = network();
        prop_assert_eq!(suggest(&net, &prefix), suggest(&net, &prefix));
    }
}
