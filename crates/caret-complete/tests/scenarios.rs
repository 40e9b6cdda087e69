//! End-to-end suggestion scenarios over sketched grammars.
//!
//! Grammars are laid out with `caret_net::sketch`, which produces the same
//! state shapes as compiled ANTLR parsers (rule start/stop pairs, blocks,
//! star and plus loops).

use std::collections::BTreeSet;
use std::sync::Arc;

use caret_complete::{
    CancelToken, PatternLexer, SuggestError, SuggestOptions, Suggester, Suggestions, suggest,
};
use caret_core::{Category, EOF, Token};
use caret_net::sketch::{Sketch, alt, eof, opt, plus, rule, seq, set, star, tok};
use caret_net::{
    BlockKind, Grammar, GrammarNetwork, IntervalSet, Label, NetError, NetworkBuilder, Shape,
    Transition, Vocabulary,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Tokens for `preceding`, two bytes apart, followed by the cursor marker.
fn tokens(preceding: &[Category]) -> Vec<Token> {
    let mut out: Vec<Token> = preceding
        .iter()
        .enumerate()
        .map(|(i, &c)| Token::new(c, i * 2, 1))
        .collect();
    out.push(Token::cursor(preceding.len() * 2));
    out
}

fn suggest_after(net: &GrammarNetwork, preceding: &[Category]) -> Suggestions {
    Suggester::new(net).suggest(&tokens(preceding)).unwrap()
}

fn proposed(net: &GrammarNetwork, preceding: &[Category]) -> BTreeSet<Category> {
    suggest_after(net, preceding).proposed
}

fn cats<const N: usize>(categories: [Category; N]) -> BTreeSet<Category> {
    BTreeSet::from(categories)
}

// ---------------------------------------------------------------------------
// Alternatives sharing a prefix: s : 'a' 'b' | 'a' 'c' ;
// ---------------------------------------------------------------------------

const A: Category = 1;
const B: Category = 2;
const C: Category = 3;

fn shared_prefix() -> GrammarNetwork {
    Sketch::new()
        .rule("s", alt([seq([tok(A), tok(B)]), seq([tok(A), tok(C)])]))
        .compile()
        .unwrap()
}

#[test]
fn shared_prefix_after_a() {
    let net = shared_prefix();
    let s = suggest_after(&net, &[A]);
    assert_eq!(s.proposed, cats([B, C]));
    assert_eq!(s.preceding_tokens.len(), 1);
    assert!(s.cursor_reached);
}

#[test]
fn shared_prefix_empty_input() {
    assert_eq!(proposed(&shared_prefix(), &[]), cats([A]));
}

#[test]
fn shared_prefix_complete_sentence() {
    let s = suggest_after(&shared_prefix(), &[A, C]);
    assert!(s.proposed.is_empty());
    assert!(s.cursor_reached);
}

// ---------------------------------------------------------------------------
// Nesting: s : '(' s ')' | 'x' ;
// ---------------------------------------------------------------------------

const LP: Category = 1;
const RP: Category = 2;
const X: Category = 3;

fn parens() -> GrammarNetwork {
    Sketch::new()
        .rule("s", alt([seq([tok(LP), rule("s"), tok(RP)]), tok(X)]))
        .compile()
        .unwrap()
}

#[test]
fn parens_after_two_opens() {
    assert_eq!(proposed(&parens(), &[LP, LP]), cats([LP, X]));
}

#[test]
fn parens_close_only_what_is_open() {
    let net = parens();
    assert_eq!(proposed(&net, &[LP, LP, X]), cats([RP]));
    assert_eq!(proposed(&net, &[LP, LP, X, RP]), cats([RP]));
    assert!(proposed(&net, &[LP, LP, X, RP, RP]).is_empty());
    assert!(proposed(&net, &[X]).is_empty());
}

#[test]
fn parens_unbalanced_prefix() {
    let s = suggest_after(&parens(), &[LP, X, RP, RP]);
    assert!(!s.cursor_reached);
    assert!(s.proposed.is_empty());
}

// ---------------------------------------------------------------------------
// Loops: list : '[' (INT (',' INT)*)? ']' ;
// ---------------------------------------------------------------------------

const LB: Category = 1;
const INT: Category = 2;
const COMMA: Category = 3;
const RB: Category = 4;

fn list() -> GrammarNetwork {
    Sketch::new()
        .rule(
            "list",
            seq([
                tok(LB),
                opt(seq([tok(INT), star(seq([tok(COMMA), tok(INT)]))])),
                tok(RB),
            ]),
        )
        .compile()
        .unwrap()
}

#[test]
fn list_after_open_bracket() {
    assert_eq!(proposed(&list(), &[LB]), cats([INT, RB]));
}

#[test]
fn list_after_element() {
    let net = list();
    assert_eq!(proposed(&net, &[LB, INT]), cats([COMMA, RB]));
    assert_eq!(proposed(&net, &[LB, INT, COMMA, INT]), cats([COMMA, RB]));
    assert_eq!(proposed(&net, &[LB, INT, COMMA, INT, COMMA, INT]), cats([COMMA, RB]));
}

#[test]
fn list_after_comma() {
    assert_eq!(proposed(&list(), &[LB, INT, COMMA]), cats([INT]));
}

#[test]
fn list_rejects_adjacent_elements() {
    let s = suggest_after(&list(), &[LB, INT, INT]);
    assert!(!s.cursor_reached);
    assert!(s.proposed.is_empty());
}

#[test]
fn plus_loop_repeats() {
    // ids : ID+ ';' ;
    let net = Sketch::new()
        .rule("ids", seq([plus(tok(1)), tok(2)]))
        .compile()
        .unwrap();
    assert_eq!(proposed(&net, &[]), cats([1]));
    assert_eq!(proposed(&net, &[1]), cats([1, 2]));
    assert_eq!(proposed(&net, &[1, 1, 1]), cats([1, 2]));
    assert!(proposed(&net, &[1, 2]).is_empty());
}

// ---------------------------------------------------------------------------
// Recursion: expr : expr '+' expr | INT, in the shape ANTLR rewrites
// left recursion into: expr : INT ('+' expr)* ;
// ---------------------------------------------------------------------------

const NUM: Category = 1;
const PLUS: Category = 2;

fn expr() -> GrammarNetwork {
    Sketch::new()
        .rule("prog", seq([rule("expr"), eof()]))
        .rule("expr", seq([tok(NUM), star(seq([tok(PLUS), rule("expr")]))]))
        .compile()
        .unwrap()
}

#[test]
fn expr_operator_after_operand() {
    let net = expr();
    for preceding in [&[NUM][..], &[NUM, PLUS, NUM], &[NUM, PLUS, NUM, PLUS, NUM]] {
        let p = proposed(&net, preceding);
        assert!(p.contains(&PLUS), "after {preceding:?}: {p:?}");
        assert!(!p.contains(&NUM), "after {preceding:?}: {p:?}");
        assert!(p.contains(&EOF));
    }
}

#[test]
fn expr_operand_after_operator() {
    let net = expr();
    assert_eq!(proposed(&net, &[NUM, PLUS]), cats([NUM]));
    assert_eq!(proposed(&net, &[]), cats([NUM]));
}

/// `expr : expr '+' expr | INT` as the ANTLR tool emits it: the primary
/// alternative, then a star loop whose block opens with a precedence
/// predicate and calls `expr` back at a higher precedence.
fn expr_with_precedence() -> GrammarNetwork {
    let mut b = NetworkBuilder::new(2);
    let start = b.add_state(0, Shape::RuleStart);
    let stop = b.add_state(0, Shape::RuleStop);
    let primary = b.add_state(0, Shape::Basic);
    let entry = b.add_state(0, Shape::StarLoopEntry);
    let block_end = b.add_state(0, Shape::BlockEnd);
    let block = b.add_state(
        0,
        Shape::BlockStart {
            kind: BlockKind::Star,
            end: block_end,
        },
    );
    let guard = b.add_state(0, Shape::Basic);
    let operator = b.add_state(0, Shape::Basic);
    let operand = b.add_state(0, Shape::Basic);
    let after = b.add_state(0, Shape::Basic);
    let loopback = b.add_state(0, Shape::StarLoopback);
    let loop_end = b.add_state(0, Shape::LoopEnd { loopback });

    b.add_transition(start, Transition::epsilon(primary));
    b.add_transition(primary, Transition::atom(entry, NUM));
    b.add_transition(entry, Transition::epsilon(block));
    b.add_transition(entry, Transition::epsilon(loop_end));
    b.add_transition(block, Transition::epsilon(guard));
    b.add_transition(guard, Transition::new(operator, Label::Precedence(2)));
    b.add_transition(operator, Transition::atom(operand, PLUS));
    b.add_transition(
        operand,
        Transition::new(
            start,
            Label::Rule {
                follow: after,
                rule: 0,
                precedence: 3,
            },
        ),
    );
    b.add_transition(after, Transition::epsilon(block_end));
    b.add_transition(block_end, Transition::epsilon(loopback));
    b.add_transition(loopback, Transition::epsilon(entry));
    b.add_transition(loop_end, Transition::epsilon(stop));
    b.build(0).unwrap()
}

#[test]
fn expr_precedence_loop() {
    let net = expr_with_precedence();
    assert_eq!(proposed(&net, &[]), cats([NUM]));
    assert_eq!(proposed(&net, &[NUM]), cats([PLUS]));
    assert_eq!(proposed(&net, &[NUM, PLUS]), cats([NUM]));
    assert_eq!(proposed(&net, &[NUM, PLUS, NUM, PLUS, NUM]), cats([PLUS]));
    assert!(!suggest_after(&net, &[PLUS]).cursor_reached);
}

#[test]
fn literal_left_recursion_is_rejected() {
    let result = Sketch::new()
        .rule("expr", alt([seq([rule("expr"), tok(PLUS), rule("expr")]), tok(NUM)]))
        .compile();
    assert!(matches!(result, Err(NetError::LeftRecursion(0))));
}

#[test]
fn nested_rule_returns_to_its_caller() {
    // s : t 'x' | u 'y' ; t : 'a' ; u : 'a' ;
    let net = Sketch::new()
        .rule("s", alt([seq([rule("t"), tok(10)]), seq([rule("u"), tok(11)])]))
        .rule("t", tok(1))
        .rule("u", tok(1))
        .compile()
        .unwrap();
    assert_eq!(proposed(&net, &[1]), cats([10, 11]));
    assert!(proposed(&net, &[1, 10]).is_empty());
}

#[test]
fn sets_propose_every_member() {
    // s : ('a' | 'b' | 'c') 'd' ;
    let net = Sketch::new()
        .rule("s", seq([set(&[1, 2, 3]), tok(4)]))
        .compile()
        .unwrap();
    assert_eq!(proposed(&net, &[]), cats([1, 2, 3]));
    assert_eq!(proposed(&net, &[2]), cats([4]));
}

#[test]
fn idempotent_requests() {
    let net = list();
    let first = suggest_after(&net, &[LB, INT, COMMA]);
    let second = suggest_after(&net, &[LB, INT, COMMA]);
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Source text through the lexer collaborator
// ---------------------------------------------------------------------------

const COMMENT: Category = 5;

fn list_grammar() -> (Grammar, PatternLexer) {
    let vocabulary = Vocabulary::new(
        vec![None, Some("'['".into()), None, Some("','".into()), Some("']'".into())],
        vec![None, None, Some("INT".into()), None, None, Some("COMMENT".into())],
    );
    let lexer = PatternLexer::from_vocabulary(&vocabulary)
        .token(INT, "[0-9]+")
        .unwrap()
        .hidden(COMMENT, "#[^\n]*")
        .unwrap()
        .skip(r"\s+")
        .unwrap();
    let grammar = Grammar::new(list(), vocabulary, vec!["list".into()]);
    (grammar, lexer)
}

#[test]
fn source_text_suggestions() {
    let (grammar, lexer) = list_grammar();
    let text = "[1, 2";
    let s = suggest(text, text.len(), &grammar, &lexer).unwrap();
    assert_eq!(s.proposed, cats([COMMA, RB]));
    assert_eq!(s.display_names(grammar.vocabulary()), vec!["','", "']'"]);
    assert_eq!(s.propositions(grammar.vocabulary()), vec![",", "]"]);
}

#[test]
fn hidden_channel_tokens_are_invisible() {
    let (grammar, lexer) = list_grammar();
    let text = "[1, # two\n";
    let s = suggest(text, text.len(), &grammar, &lexer).unwrap();
    assert!(s.cursor_reached);
    assert_eq!(s.proposed, cats([INT]));
    assert_eq!(s.preceding_tokens.len(), 3);
}

#[test]
fn cursor_in_middle_of_text() {
    let (grammar, lexer) = list_grammar();
    // Cursor right after '[' in a complete list.
    let s = suggest("[1, 2]", 1, &grammar, &lexer).unwrap();
    assert_eq!(s.proposed, cats([INT, RB]));
}

#[test]
fn cursor_inside_a_token_keeps_the_token() {
    let (grammar, lexer) = list_grammar();
    let s = suggest("[12", 2, &grammar, &lexer).unwrap();
    assert_eq!(s.preceding_tokens.len(), 2);
    assert_eq!(s.preceding_tokens[1].len, 2);
    assert_eq!(s.proposed, cats([COMMA, RB]));
}

#[test]
fn cursor_out_of_bounds() {
    let (grammar, lexer) = list_grammar();
    let err = suggest("[1", 5, &grammar, &lexer).unwrap_err();
    assert_eq!(err, SuggestError::CursorOutOfBounds { offset: 5, len: 2 });
}

#[test]
fn grammar_survives_interp_round_trip() {
    let (grammar, lexer) = list_grammar();
    let text = caret_net::interp::write(&grammar.to_interp_file());
    let reloaded = Grammar::from_interp(&text).unwrap();
    assert_eq!(reloaded.network(), grammar.network());

    let bundled = Grammar::from_bundle(&grammar.to_bundle()).unwrap();
    for source in ["", "[", "[1", "[1,", "[1,2]"] {
        let expected = suggest(source, source.len(), &grammar, &lexer).unwrap();
        assert_eq!(suggest(source, source.len(), &reloaded, &lexer).unwrap(), expected);
        assert_eq!(suggest(source, source.len(), &bundled, &lexer).unwrap(), expected);
    }
}

// ---------------------------------------------------------------------------
// Faults and guards
// ---------------------------------------------------------------------------

#[test]
fn not_set_transition_aborts_request() {
    // s : 'a' ~('b') ;  with the complement left in the network
    let mut b = NetworkBuilder::new(2);
    let start = b.add_state(0, Shape::RuleStart);
    let stop = b.add_state(0, Shape::RuleStop);
    let x = b.add_state(0, Shape::Basic);
    let y = b.add_state(0, Shape::Basic);
    b.add_transition(start, Transition::atom(x, 1));
    b.add_transition(x, Transition::new(y, Label::NotSet(IntervalSet::from_categories(&[2]))));
    b.add_transition(y, Transition::epsilon(stop));
    let net = b.build(0).unwrap();

    // Not reached yet: fine.
    assert_eq!(proposed(&net, &[]), cats([1]));
    // Reached: the whole request fails, no partial result.
    let err = Suggester::new(&net).suggest(&tokens(&[1])).unwrap_err();
    assert!(matches!(err, SuggestError::UnsupportedTransition { label: "not-set", .. }));
}

#[test]
fn lexer_state_aborts_request() {
    let mut b = NetworkBuilder::new(1);
    let start = b.add_state(0, Shape::RuleStart);
    let stop = b.add_state(0, Shape::RuleStop);
    let odd = b.add_state(0, Shape::TokenStart);
    b.add_transition(start, Transition::epsilon(odd));
    b.add_transition(odd, Transition::epsilon(stop));
    let net = b.build(0).unwrap();
    let err = Suggester::new(&net).suggest(&tokens(&[])).unwrap_err();
    assert!(matches!(err, SuggestError::UnsupportedState { kind: "token-start", .. }));
}

fn long_input() -> (GrammarNetwork, Vec<Token>) {
    // s : ('a' | 'b')* 'c' ;
    let net = Sketch::new()
        .rule("s", seq([star(alt([tok(1), tok(2)])), tok(3)]))
        .compile()
        .unwrap();
    let preceding: Vec<Category> = (0..300).map(|i| 1 + i % 2).collect();
    (net, tokens(&preceding))
}

#[test]
fn long_input_completes_within_defaults() {
    let (net, toks) = long_input();
    let s = Suggester::new(&net).suggest(&toks).unwrap();
    assert_eq!(s.proposed, cats([1, 2, 3]));
}

#[test]
fn step_budget_aborts_request() {
    let (net, toks) = long_input();
    let err = Suggester::new(&net)
        .with_options(SuggestOptions::default().with_max_steps(50))
        .suggest(&toks)
        .unwrap_err();
    assert_eq!(err, SuggestError::StepBudgetExhausted(50));
}

#[test]
fn cancelled_request_returns_nothing() {
    let (net, toks) = long_input();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = Suggester::new(&net)
        .suggest_with_cancel(&toks, &cancel)
        .unwrap_err();
    assert_eq!(err, SuggestError::Cancelled);

    let live = CancelToken::new();
    assert!(Suggester::new(&net).suggest_with_cancel(&toks, &live).is_ok());
}

#[test]
fn nesting_limit_aborts_request() {
    let net = parens();
    let deep = vec![LP; 20];
    let err = Suggester::new(&net)
        .with_options(SuggestOptions::default().with_max_nesting(8))
        .suggest(&tokens(&deep))
        .unwrap_err();
    assert_eq!(err, SuggestError::NestingTooDeep(8));
    assert_eq!(proposed(&net, &deep), cats([LP, X]));
}

#[test]
fn missing_cursor_is_an_error() {
    let err = Suggester::new(&list())
        .suggest(&[Token::new(LB, 0, 1)])
        .unwrap_err();
    assert_eq!(err, SuggestError::MissingCursor);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_requests_share_one_network() {
    let net = Arc::new(list());
    let cases: Vec<(Vec<Category>, BTreeSet<Category>)> = vec![
        (vec![LB], cats([INT, RB])),
        (vec![LB, INT], cats([COMMA, RB])),
        (vec![LB, INT, COMMA], cats([INT])),
        (vec![], cats([LB])),
    ];

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let net = Arc::clone(&net);
            let (preceding, expected) = cases[i % cases.len()].clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(proposed(&net, &preceding), expected);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
