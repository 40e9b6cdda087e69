// Quick look at a grammar: load an .interp or .cnet file and print its rules
// and the shape of its network.
use std::fs;

use caret_net::{Grammar, StateKind};

fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: inspect GRAMMAR.interp|GRAMMAR.cnet");
        std::process::exit(2);
    };

    let data = fs::read(&path).expect("Failed to read grammar file");
    println!("Loaded {}: {} bytes", path, data.len());

    let grammar = Grammar::from_bytes(&data).expect("Failed to load grammar");
    let net = grammar.network();
    println!(
        "States: {}, transitions: {}, rules: {}, max token type: {}",
        net.len(),
        net.transition_count(),
        net.rule_count(),
        net.max_token_type(),
    );

    for (i, name) in grammar.rule_names().iter().enumerate() {
        let start = net.rule_start(i as u32).unwrap_or_default();
        let owned = net.states().iter().filter(|s| s.rule == i as u32).count();
        println!("  {:3} {:24} start={:<5} states={}", i, name, start, owned);
    }

    let mut kinds: Vec<(&str, usize)> = Vec::new();
    for state in net.states() {
        let name = state.kind.name();
        match kinds.iter_mut().find(|(k, _)| *k == name) {
            Some((_, n)) => *n += 1,
            None => kinds.push((name, 1)),
        }
    }
    println!("\nState kinds:");
    for (kind, n) in &kinds {
        println!("  {:18} {}", kind, n);
    }

    let unsupported = net
        .states()
        .iter()
        .filter(|s| matches!(s.kind, StateKind::TokenStart | StateKind::Invalid))
        .count();
    if unsupported > 0 {
        println!("\n{} states cannot be walked by the suggester", unsupported);
    }
}
