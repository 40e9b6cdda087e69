// caret-cli: shared utilities for CLI tools.

use std::path::PathBuf;
use std::process;

use caret_complete::{PatternLexer, Suggestions};
use caret_core::{Category, Token};
use caret_net::{Grammar, Vocabulary};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable naming the grammar file when `-g` is not given.
pub const GRAMMAR_ENV: &str = "CARET_GRAMMAR_PATH";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "CARET_LOG";

/// Load a grammar from an `.interp` or `.cnet` file.
///
/// Search order:
/// 1. `grammar_path` argument (if provided)
/// 2. `CARET_GRAMMAR_PATH` environment variable
pub fn load_grammar(grammar_path: Option<&str>) -> Result<Grammar, String> {
    let path = grammar_path
        .map(PathBuf::from)
        .or_else(|| std::env::var(GRAMMAR_ENV).ok().map(PathBuf::from))
        .ok_or_else(|| format!("no grammar given (use -g PATH or set {GRAMMAR_ENV})"))?;
    let data =
        std::fs::read(&path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let grammar = Grammar::from_bytes(&data)
        .map_err(|e| format!("failed to load {}: {}", path.display(), e))?;
    debug!(
        path = %path.display(),
        bytes = data.len(),
        states = grammar.network().len(),
        rules = grammar.rule_names().len(),
        "grammar loaded"
    );
    Ok(grammar)
}

/// Select the start rule by name, if one was requested.
pub fn select_rule(grammar: Grammar, rule: Option<&str>) -> Result<Grammar, String> {
    match rule {
        Some(name) => grammar.with_start_rule(name).map_err(|e| e.to_string()),
        None => Ok(grammar),
    }
}

/// Remove every `-s VALUE`, `--long VALUE` and `--long=VALUE` occurrence
/// from `args`.
///
/// Returns `(values, remaining_args)`.
pub fn take_option(
    args: &[String],
    short: Option<&str>,
    long: &str,
) -> Result<(Vec<String>, Vec<String>), String> {
    let mut values = Vec::new();
    let mut remaining = Vec::new();
    let prefix = format!("{long}=");
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            values.push(val.to_string());
        } else if arg == long || Some(arg.as_str()) == short {
            match iter.next() {
                Some(val) => values.push(val.clone()),
                None => return Err(format!("{arg} requires a value")),
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    Ok((values, remaining))
}

/// Parse a `--grammar=PATH` or `-g PATH` argument from command line args.
///
/// Returns `(grammar_path, remaining_args)`; the last occurrence wins.
pub fn parse_grammar_path(args: &[String]) -> (Option<String>, Vec<String>) {
    let (mut values, remaining) =
        take_option(args, Some("-g"), "--grammar").unwrap_or_else(|e| fatal(&e));
    (values.pop(), remaining)
}

/// Count `-v` (one level), `-vv` (two levels) and `--verbose` flags.
///
/// Returns `(verbosity, remaining_args)`.
pub fn parse_verbosity(args: &[String]) -> (u8, Vec<String>) {
    let mut level: u8 = 0;
    let mut remaining = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-v" | "--verbose" => level = level.saturating_add(1),
            "-vv" => level = level.saturating_add(2),
            _ => remaining.push(arg.clone()),
        }
    }
    (level, remaining)
}

/// Install a stderr `tracing` subscriber.
///
/// Without `-v` the filter comes from `CARET_LOG` (default `warn`); `-v`
/// selects `debug` and `-vv` selects `trace`.
pub fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Resolve a category given by symbolic name (`INT`) or number (`7`).
pub fn resolve_category(vocabulary: &Vocabulary, name: &str) -> Result<Category, String> {
    vocabulary
        .category_of(name)
        .or_else(|| name.parse().ok())
        .ok_or_else(|| format!("unknown token name: {name}"))
}

/// Lexer rules collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct LexerSpec {
    /// `NAME=REGEX` pairs emitted on the default channel.
    pub tokens: Vec<String>,
    /// `NAME=REGEX` pairs emitted on the hidden channel.
    pub hidden: Vec<String>,
    /// Patterns dropped without emitting a token.
    pub skip: Vec<String>,
}

impl LexerSpec {
    /// Pull `--token`, `--hidden` and `--skip` options out of `args`.
    pub fn parse(args: &[String]) -> Result<(Self, Vec<String>), String> {
        let (tokens, args) = take_option(args, None, "--token")?;
        let (hidden, args) = take_option(&args, None, "--hidden")?;
        let (skip, args) = take_option(&args, None, "--skip")?;
        Ok((
            Self {
                tokens,
                hidden,
                skip,
            },
            args,
        ))
    }

    /// Build a lexer: the vocabulary's literal names first, then the
    /// command-line rules in order. Whitespace is skipped unless any `--skip`
    /// pattern was given.
    pub fn build(&self, vocabulary: &Vocabulary) -> Result<PatternLexer, String> {
        let mut lexer = PatternLexer::from_vocabulary(vocabulary);
        for rule in &self.tokens {
            let (category, pattern) = split_rule(vocabulary, rule)?;
            lexer = lexer
                .token(category, pattern)
                .map_err(|e| format!("invalid pattern for {rule}: {e}"))?;
        }
        for rule in &self.hidden {
            let (category, pattern) = split_rule(vocabulary, rule)?;
            lexer = lexer
                .hidden(category, pattern)
                .map_err(|e| format!("invalid pattern for {rule}: {e}"))?;
        }
        let default_skip = [r"\s+".to_string()];
        let skip = if self.skip.is_empty() {
            &default_skip[..]
        } else {
            &self.skip[..]
        };
        for pattern in skip {
            lexer = lexer
                .skip(pattern)
                .map_err(|e| format!("invalid skip pattern {pattern}: {e}"))?;
        }
        Ok(lexer)
    }
}

fn split_rule<'a>(vocabulary: &Vocabulary, rule: &'a str) -> Result<(Category, &'a str), String> {
    let (name, pattern) = rule
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=REGEX, got {rule}"))?;
    Ok((resolve_category(vocabulary, name)?, pattern))
}

// ---------------------------------------------------------------------------
// JSON reports
// ---------------------------------------------------------------------------

/// One proposed category, as printed by `caret-suggest --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    pub category: Category,
    pub name: String,
    /// Text to insert, for categories with a literal name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Machine-readable form of one suggestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub cursor: usize,
    pub cursor_reached: bool,
    pub preceding: Vec<Token>,
    pub proposals: Vec<Proposal>,
}

impl Report {
    pub fn new(cursor: usize, suggestions: &Suggestions, vocabulary: &Vocabulary) -> Self {
        Self {
            cursor,
            cursor_reached: suggestions.cursor_reached,
            preceding: suggestions.preceding_tokens.clone(),
            proposals: suggestions
                .proposed
                .iter()
                .map(|&category| Proposal {
                    category,
                    name: vocabulary.display_name(category),
                    text: vocabulary.proposition(category),
                })
                .collect(),
        }
    }
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn vocabulary() -> Vocabulary {
        Vocabulary::new(
            vec![None, Some("'['".into()), None],
            vec![None, None, Some("INT".into())],
        )
    }

    // -- Argument parsing --

    #[test]
    fn take_option_forms() {
        let (values, rest) =
            take_option(&args(&["a", "--token", "X=x", "--token=Y=y", "b"]), None, "--token")
                .unwrap();
        assert_eq!(values, args(&["X=x", "Y=y"]));
        assert_eq!(rest, args(&["a", "b"]));
    }

    #[test]
    fn take_option_missing_value() {
        let err = take_option(&args(&["--skip"]), None, "--skip").unwrap_err();
        assert_eq!(err, "--skip requires a value");
    }

    #[test]
    fn grammar_path_short_and_long() {
        let (path, rest) = parse_grammar_path(&args(&["-g", "a.interp", "x"]));
        assert_eq!(path.as_deref(), Some("a.interp"));
        assert_eq!(rest, args(&["x"]));
        let (path, _) = parse_grammar_path(&args(&["--grammar=b.cnet"]));
        assert_eq!(path.as_deref(), Some("b.cnet"));
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(parse_verbosity(&args(&["x"])), (0, args(&["x"])));
        assert_eq!(parse_verbosity(&args(&["-v", "x"])).0, 1);
        assert_eq!(parse_verbosity(&args(&["-vv"])).0, 2);
        assert_eq!(parse_verbosity(&args(&["-v", "--verbose"])).0, 2);
    }

    #[test]
    fn help_flag() {
        assert!(wants_help(&args(&["x", "-h"])));
        assert!(!wants_help(&args(&["x"])));
    }

    // -- Lexer rules --

    #[test]
    fn categories_by_name_or_number() {
        let v = vocabulary();
        assert_eq!(resolve_category(&v, "INT"), Ok(2));
        assert_eq!(resolve_category(&v, "7"), Ok(7));
        assert!(resolve_category(&v, "NOPE").is_err());
    }

    #[test]
    fn lexer_from_arguments() {
        use caret_complete::Lexer;
        let (lexer_spec, rest) =
            LexerSpec::parse(&args(&["--token", "INT=[0-9]+", "--hidden", "9=#.*", "f.txt"]))
                .unwrap();
        assert_eq!(rest, args(&["f.txt"]));
        let lexer = lexer_spec.build(&vocabulary()).unwrap();
        let cats: Vec<Category> = lexer.tokenize("[ 12 #x").iter().map(|t| t.category).collect();
        assert_eq!(cats, vec![1, 2, 9]);
    }

    #[test]
    fn malformed_rule() {
        let lexer_spec = LexerSpec {
            tokens: args(&["INT"]),
            ..LexerSpec::default()
        };
        assert!(lexer_spec.build(&vocabulary()).is_err());
    }

    // -- Reports --

    #[test]
    fn report_json() {
        let suggestions = Suggestions {
            preceding_tokens: vec![Token::new(1, 0, 1)],
            proposed: BTreeSet::from([1, 2]),
            cursor_reached: true,
        };
        let report = Report::new(1, &suggestions, &vocabulary());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["cursor_reached"], true);
        assert_eq!(json["proposals"][0]["name"], "'['");
        assert_eq!(json["proposals"][0]["text"], "[");
        assert_eq!(json["proposals"][1]["name"], "INT");
        assert!(json["proposals"][1].get("text").is_none());
        assert_eq!(json["preceding"][0]["category"], 1);
    }

    #[test]
    fn load_bundle_from_file() {
        use caret_net::sketch::{Sketch, seq, tok};
        let grammar = Sketch::new()
            .rule("list", seq([tok(1), tok(2)]))
            .grammar(vocabulary())
            .unwrap();
        let path = std::env::temp_dir().join(format!("caret-cli-{}.cnet", process::id()));
        std::fs::write(&path, grammar.to_bundle()).unwrap();

        let loaded = load_grammar(path.to_str());
        std::fs::remove_file(&path).unwrap();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.network(), grammar.network());
        assert_eq!(loaded.start_rule_name(), Some("list"));
    }

    #[test]
    fn missing_grammar_file() {
        let err = load_grammar(Some("/nonexistent/grammar.interp")).unwrap_err();
        assert!(err.starts_with("failed to read"));
    }
}
