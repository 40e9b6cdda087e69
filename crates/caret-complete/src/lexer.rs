// Lexer collaborator: the interface the suggester consumes tokens through,
// cursor-stream construction, and a regex-driven reference lexer.

use caret_core::{Category, DEFAULT_CHANNEL, HIDDEN_CHANNEL, Token};
use caret_net::Vocabulary;
use regex::Regex;
use tracing::debug;

use crate::SuggestError;

/// Splits source text into tokens.
///
/// Implementations return every token they recognise, on whatever channel
/// they belong to, without an end-of-input token. Unrecognised input is the
/// lexer's business; it must not stop tokenization.
pub trait Lexer {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

impl<L: Lexer + ?Sized> Lexer for &L {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        (**self).tokenize(text)
    }
}

/// Tokenize `text` and build the stream the suggester walks: the
/// default-channel tokens starting before `cursor_offset`, then one cursor
/// marker at `cursor_offset`.
///
/// A token the cursor falls inside is kept whole.
pub fn cursor_tokens<L: Lexer + ?Sized>(
    lexer: &L,
    text: &str,
    cursor_offset: usize,
) -> Result<Vec<Token>, SuggestError> {
    if !text.is_char_boundary(cursor_offset) {
        return Err(SuggestError::CursorOutOfBounds {
            offset: cursor_offset,
            len: text.len(),
        });
    }
    let mut tokens: Vec<Token> = lexer
        .tokenize(text)
        .into_iter()
        .filter(|t| t.is_default_channel() && t.start < cursor_offset)
        .collect();
    tokens.push(Token::cursor(cursor_offset));
    Ok(tokens)
}

#[derive(Debug, Clone)]
enum Action {
    Emit { category: Category, channel: u32 },
    Skip,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    action: Action,
}

/// A lexer driven by an ordered list of patterns.
///
/// At each position the longest match wins; on equal length the earlier
/// rule wins, so literal names added first take precedence over a general
/// identifier pattern. Characters no rule matches are skipped.
#[derive(Debug, Clone, Default)]
pub struct PatternLexer {
    rules: Vec<Rule>,
}

impl PatternLexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A lexer recognising every literal name of `vocabulary` ('if', '+').
    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        vocabulary
            .literals()
            .filter(|(_, text)| !text.is_empty())
            .fold(Self::new(), |lexer, (category, text)| lexer.literal(category, &text))
    }

    /// Recognise the exact text `text` as `category`.
    pub fn literal(mut self, category: Category, text: &str) -> Self {
        let pattern = anchored(&regex::escape(text));
        // An escaped literal is always a valid pattern.
        if let Ok(pattern) = Regex::new(&pattern) {
            self.rules.push(Rule {
                pattern,
                action: Action::Emit {
                    category,
                    channel: DEFAULT_CHANNEL,
                },
            });
        }
        self
    }

    /// Recognise `pattern` as `category` on the default channel.
    pub fn token(self, category: Category, pattern: &str) -> Result<Self, regex::Error> {
        self.rule(pattern, Action::Emit {
            category,
            channel: DEFAULT_CHANNEL,
        })
    }

    /// Recognise `pattern` as `category` on the hidden channel (comments).
    pub fn hidden(self, category: Category, pattern: &str) -> Result<Self, regex::Error> {
        self.rule(pattern, Action::Emit {
            category,
            channel: HIDDEN_CHANNEL,
        })
    }

    /// Drop text matching `pattern` (whitespace).
    pub fn skip(self, pattern: &str) -> Result<Self, regex::Error> {
        self.rule(pattern, Action::Skip)
    }

    fn rule(mut self, pattern: &str, action: Action) -> Result<Self, regex::Error> {
        self.rules.push(Rule {
            pattern: Regex::new(&anchored(pattern))?,
            action,
        });
        Ok(self)
    }
}

fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})")
}

impl Lexer for PatternLexer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let mut best: Option<(usize, &Action)> = None;
            for rule in &self.rules {
                if let Some(m) = rule.pattern.find(rest) {
                    if m.end() > best.map_or(0, |(len, _)| len) {
                        best = Some((m.end(), &rule.action));
                    }
                }
            }
            match best {
                Some((len, action)) => {
                    if let Action::Emit { category, channel } = action {
                        tokens.push(Token::on_channel(*category, pos, len, *channel));
                    }
                    pos += len;
                }
                None => {
                    let skipped = rest.chars().next().map_or(1, char::len_utf8);
                    debug!(offset = pos, "skipping unrecognized character");
                    pos += skipped;
                }
            }
        }
        tokens
    }
}
