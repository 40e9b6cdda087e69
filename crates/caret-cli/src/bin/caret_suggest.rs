// caret-suggest: Propose the tokens that may follow a cursor position.
//
// Reads source text from FILE (or stdin), tokenizes it with a pattern lexer
// built from the grammar's literal names plus --token/--hidden rules, and
// prints the token categories that may legally appear at the cursor.
//
// Usage:
//   caret-suggest [-g GRAMMAR] [OPTIONS] [FILE]
//
// Options:
//   -g, --grammar PATH     Grammar file (.interp or .cnet)
//   --rule NAME            Start rule (default: the first rule)
//   --cursor OFFSET        Cursor byte offset (default: end of input)
//   --token NAME=REGEX     Lexer rule on the default channel (repeatable)
//   --hidden NAME=REGEX    Lexer rule on the hidden channel (repeatable)
//   --skip REGEX           Text to drop (repeatable, default: whitespace)
//   --max-steps N          Walk step budget
//   --json                 Print a JSON report
//   -v, -vv                Debug / trace logging on stderr
//   -h, --help             Print help

use std::io::{self, Read, Write};

use caret_complete::{SuggestOptions, Suggester};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (grammar_path, args) = caret_cli::parse_grammar_path(&args);
    let (verbosity, args) = caret_cli::parse_verbosity(&args);

    if caret_cli::wants_help(&args) {
        println!("caret-suggest: Propose tokens that may follow the cursor.");
        println!();
        println!("Usage: caret-suggest [-g GRAMMAR] [OPTIONS] [FILE]");
        println!();
        println!("Reads source from FILE, or stdin if no FILE is given.");
        println!();
        println!("Options:");
        println!("  -g, --grammar PATH     Grammar file (.interp or .cnet)");
        println!("  --rule NAME            Start rule (default: the first rule)");
        println!("  --cursor OFFSET        Cursor byte offset (default: end of input)");
        println!("  --token NAME=REGEX     Lexer rule on the default channel (repeatable)");
        println!("  --hidden NAME=REGEX    Lexer rule on the hidden channel (repeatable)");
        println!("  --skip REGEX           Text to drop (repeatable, default: whitespace)");
        println!("  --max-steps N          Walk step budget");
        println!("  --json                 Print a JSON report");
        println!("  -v, -vv                Debug / trace logging on stderr");
        println!("  -h, --help             Print this help");
        println!();
        println!("Environment:");
        println!("  {}   Grammar file when -g is not given", caret_cli::GRAMMAR_ENV);
        println!("  {}             Log filter when -v is not given", caret_cli::LOG_ENV);
        return;
    }

    caret_cli::init_logging(verbosity);

    let (lexer_spec, args) = caret_cli::LexerSpec::parse(&args)
        .unwrap_or_else(|e| caret_cli::fatal(&e));
    let (mut rule, args) = caret_cli::take_option(&args, None, "--rule")
        .unwrap_or_else(|e| caret_cli::fatal(&e));
    let (mut cursor, args) = caret_cli::take_option(&args, None, "--cursor")
        .unwrap_or_else(|e| caret_cli::fatal(&e));
    let (mut max_steps, args) =
        caret_cli::take_option(&args, None, "--max-steps").unwrap_or_else(|e| caret_cli::fatal(&e));
    let json = args.iter().any(|a| a == "--json");
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();

    if let Some(unknown) = args.iter().find(|a| a.starts_with('-') && *a != "--json") {
        caret_cli::fatal(&format!("unknown option: {unknown}"));
    }
    if files.len() > 1 {
        caret_cli::fatal("at most one FILE may be given");
    }

    let grammar = caret_cli::load_grammar(grammar_path.as_deref())
        .and_then(|g| caret_cli::select_rule(g, rule.pop().as_deref()))
        .unwrap_or_else(|e| caret_cli::fatal(&e));
    let lexer = lexer_spec.build(grammar.vocabulary()).unwrap_or_else(|e| caret_cli::fatal(&e));

    let source = match files.first() {
        Some(path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| caret_cli::fatal(&format!("failed to read {path}: {e}"))),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .unwrap_or_else(|e| caret_cli::fatal(&format!("failed to read stdin: {e}")));
            input
        }
    };

    let cursor = match cursor.pop() {
        Some(value) => value
            .parse()
            .unwrap_or_else(|_| caret_cli::fatal("invalid number for --cursor")),
        None => source.len(),
    };

    let mut options = SuggestOptions::default();
    if let Some(value) = max_steps.pop() {
        options = options.with_max_steps(
            value
                .parse()
                .unwrap_or_else(|_| caret_cli::fatal("invalid number for --max-steps")),
        );
    }

    let suggestions = Suggester::new(grammar.network())
        .with_options(options)
        .suggest_source(&lexer, &source, cursor)
        .unwrap_or_else(|e| caret_cli::fatal(&e.to_string()));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if json {
        let report = caret_cli::Report::new(cursor, &suggestions, grammar.vocabulary());
        let text = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|e| caret_cli::fatal(&format!("failed to encode report: {e}")));
        let _ = writeln!(out, "{text}");
        return;
    }

    if !suggestions.cursor_reached {
        let _ = writeln!(out, "(input before the cursor does not match the grammar)");
        return;
    }
    if suggestions.proposed.is_empty() {
        let _ = writeln!(out, "(no suggestions)");
        return;
    }
    for &category in &suggestions.proposed {
        let name = grammar.vocabulary().display_name(category);
        match grammar.vocabulary().proposition(category) {
            Some(text) => {
                let _ = writeln!(out, "{category:>4}  {name:20} {text}");
            }
            None => {
                let _ = writeln!(out, "{category:>4}  {name}");
            }
        }
    }
}
