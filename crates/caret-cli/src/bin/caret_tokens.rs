// caret-tokens: Show the token stream a suggestion request would walk.
//
// Reads source text from FILE (or stdin) and prints every token the lexer
// produces, with its channel, followed by the filtered stream in front of the
// cursor and the cursor marker.
//
// Usage:
//   caret-tokens [-g GRAMMAR] [OPTIONS] [FILE]
//
// Options:
//   -g, --grammar PATH     Grammar file (.interp or .cnet)
//   --cursor OFFSET        Cursor byte offset (default: end of input)
//   --token NAME=REGEX     Lexer rule on the default channel (repeatable)
//   --hidden NAME=REGEX    Lexer rule on the hidden channel (repeatable)
//   --skip REGEX           Text to drop (repeatable, default: whitespace)
//   -h, --help             Print help

use std::io::{self, Read, Write};

use caret_complete::{Lexer, cursor_tokens};
use caret_core::Token;
use caret_net::Vocabulary;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (grammar_path, args) = caret_cli::parse_grammar_path(&args);
    let (verbosity, args) = caret_cli::parse_verbosity(&args);

    if caret_cli::wants_help(&args) {
        println!("caret-tokens: Show the token stream in front of the cursor.");
        println!();
        println!("Usage: caret-tokens [-g GRAMMAR] [OPTIONS] [FILE]");
        println!();
        println!("Options:");
        println!("  -g, --grammar PATH     Grammar file (.interp or .cnet)");
        println!("  --cursor OFFSET        Cursor byte offset (default: end of input)");
        println!("  --token NAME=REGEX     Lexer rule on the default channel (repeatable)");
        println!("  --hidden NAME=REGEX    Lexer rule on the hidden channel (repeatable)");
        println!("  --skip REGEX           Text to drop (repeatable, default: whitespace)");
        println!("  -h, --help             Print this help");
        return;
    }

    caret_cli::init_logging(verbosity);

    let (lexer_spec, args) = caret_cli::LexerSpec::parse(&args)
        .unwrap_or_else(|e| caret_cli::fatal(&e));
    let (mut cursor, args) = caret_cli::take_option(&args, None, "--cursor")
        .unwrap_or_else(|e| caret_cli::fatal(&e));

    let grammar = caret_cli::load_grammar(grammar_path.as_deref())
        .unwrap_or_else(|e| caret_cli::fatal(&e));
    let vocabulary = grammar.vocabulary();
    let lexer = lexer_spec.build(vocabulary).unwrap_or_else(|e| caret_cli::fatal(&e));

    let source = match args.iter().find(|a| !a.starts_with('-')) {
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

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let _ = writeln!(out, "=== Tokens ===");
    for token in lexer.tokenize(&source) {
        print_token(&mut out, &token, &source, vocabulary);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "=== Before cursor ===");
    let stream = cursor_tokens(&lexer, &source, cursor)
        .unwrap_or_else(|e| caret_cli::fatal(&e.to_string()));
    for token in &stream {
        print_token(&mut out, token, &source, vocabulary);
    }
}

fn print_token(out: &mut impl Write, token: &Token, source: &str, vocabulary: &Vocabulary) {
    if token.is_cursor() {
        let _ = writeln!(out, "{:20} [{:>4}]", "<cursor>", token.start);
        return;
    }
    let text = token
        .text(source)
        .unwrap_or("")
        .replace('\n', "\\n")
        .replace('\t', "\\t");
    let channel = if token.is_default_channel() {
        String::new()
    } else {
        format!(" (channel {})", token.channel)
    };
    let _ = writeln!(
        out,
        "{:20} [{:>4}..{:>4}]: {text}{channel}",
        vocabulary.display_name(token.category),
        token.start,
        token.end()
    );
}
