// caret-bundle: Convert an ANTLR .interp file into a .cnet bundle.
//
// The bundle holds the same vocabulary, rule names and serialized network
// in a binary layout that loads without text parsing.
//
// Usage:
//   caret-bundle INPUT.interp [OUTPUT.cnet]
//
// Options:
//   --check      Load INPUT (either format) and print a summary only
//   -h, --help   Print help

use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (verbosity, args) = caret_cli::parse_verbosity(&args);

    if caret_cli::wants_help(&args) || args.is_empty() {
        println!("caret-bundle: Convert an ANTLR .interp file into a .cnet bundle.");
        println!();
        println!("Usage: caret-bundle INPUT.interp [OUTPUT.cnet]");
        println!();
        println!("OUTPUT defaults to INPUT with the extension replaced by .cnet.");
        println!();
        println!("Options:");
        println!("  --check      Load INPUT (either format) and print a summary only");
        println!("  -h, --help   Print this help");
        return;
    }

    caret_cli::init_logging(verbosity);

    let check = args.iter().any(|a| a == "--check");
    let paths: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    let input = match paths.as_slice() {
        [input] | [input, _] => Path::new(input.as_str()),
        _ => caret_cli::fatal("expected INPUT and at most one OUTPUT"),
    };

    let grammar = caret_cli::load_grammar(Some(&input.to_string_lossy()))
        .unwrap_or_else(|e| caret_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let network = grammar.network();
    let _ = writeln!(
        out,
        "{}: {} states, {} rules, {} transitions, start rule {}",
        input.display(),
        network.len(),
        network.rule_count(),
        network.transition_count(),
        grammar.start_rule_name().unwrap_or("?")
    );
    if check {
        return;
    }

    let output = match paths.get(1) {
        Some(path) => PathBuf::from(path.as_str()),
        None => input.with_extension("cnet"),
    };
    let data = grammar.to_bundle();
    std::fs::write(&output, &data).unwrap_or_else(|e| {
        caret_cli::fatal(&format!("failed to write {}: {e}", output.display()))
    });
    let _ = writeln!(out, "wrote {} ({} bytes)", output.display(), data.len());
}
