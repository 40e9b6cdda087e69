// Suggestion facade: one request from tokens (or source text) to proposals.

use std::collections::BTreeSet;

use caret_core::{Category, Token};
use caret_net::{Grammar, GrammarNetwork, Vocabulary};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::collector::Collector;
use crate::config::SuggestOptions;
use crate::lexer::{Lexer, cursor_tokens};
use crate::stream::TokenCursor;
use crate::walker::Walker;
use crate::SuggestError;

/// Result of a suggestion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    /// Tokens in front of the cursor marker.
    pub preceding_tokens: Vec<Token>,
    /// Categories that may legally follow, in ascending order.
    pub proposed: BTreeSet<Category>,
    /// Whether the preceding tokens are a valid prefix of the start rule.
    /// When false, `proposed` is empty.
    pub cursor_reached: bool,
}

impl Suggestions {
    /// Display names of the proposed categories, in category order.
    pub fn display_names(&self, vocabulary: &Vocabulary) -> Vec<String> {
        self.proposed
            .iter()
            .map(|&c| vocabulary.display_name(c))
            .collect()
    }

    /// Insertable text of proposed categories that have a literal name.
    pub fn propositions(&self, vocabulary: &Vocabulary) -> Vec<String> {
        self.proposed
            .iter()
            .filter_map(|&c| vocabulary.proposition(c))
            .collect()
    }
}

/// Runs suggestion requests against one network.
///
/// Cheap to construct; the network is only borrowed. Requests on the same
/// network may run concurrently from different threads, each with its own
/// suggester or a shared one.
#[derive(Debug, Clone, Copy)]
pub struct Suggester<'g> {
    network: &'g GrammarNetwork,
    options: SuggestOptions,
}

impl<'g> Suggester<'g> {
    pub fn new(network: &'g GrammarNetwork) -> Self {
        Self {
            network,
            options: SuggestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SuggestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> SuggestOptions {
        self.options
    }

    /// Propose the categories that may follow the tokens before the cursor.
    ///
    /// `tokens` must contain a cursor marker; tokens after it are ignored.
    pub fn suggest(&self, tokens: &[Token]) -> Result<Suggestions, SuggestError> {
        self.run(tokens, None)
    }

    /// Like [`suggest`](Self::suggest), abandoning the walk once `cancel`
    /// is set.
    pub fn suggest_with_cancel(
        &self,
        tokens: &[Token],
        cancel: &CancelToken,
    ) -> Result<Suggestions, SuggestError> {
        self.run(tokens, Some(cancel))
    }

    /// Tokenize `source` with `lexer` and propose at byte `cursor_offset`.
    pub fn suggest_source<L: Lexer + ?Sized>(
        &self,
        lexer: &L,
        source: &str,
        cursor_offset: usize,
    ) -> Result<Suggestions, SuggestError> {
        let tokens = cursor_tokens(lexer, source, cursor_offset)?;
        self.suggest(&tokens)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
    fn run(
        &self,
        tokens: &[Token],
        cancel: Option<&CancelToken>,
    ) -> Result<Suggestions, SuggestError> {
        let cursor_at = tokens
            .iter()
            .position(Token::is_cursor)
            .ok_or(SuggestError::MissingCursor)?;

        let mut collector = Collector::new();
        let mut walker = Walker::new(self.network, self.options);
        if let Some(cancel) = cancel {
            walker = walker.with_cancel(cancel);
        }
        let stats = walker.walk(
            self.network.start_state(),
            TokenCursor::new(&tokens[..=cursor_at]),
            &mut collector,
        )?;

        debug!(
            preceding = cursor_at,
            steps = stats.steps,
            proposed = collector.len(),
            cursor_reached = stats.cursor_reached,
            "suggestion request finished"
        );

        Ok(Suggestions {
            preceding_tokens: tokens[..cursor_at].to_vec(),
            proposed: collector.collected(),
            cursor_reached: stats.cursor_reached,
        })
    }
}

/// Propose the categories that may follow `source[..cursor_offset]`.
///
/// Tokenizes the whole source with `lexer`, keeps the default-channel tokens
/// in front of the cursor and walks `grammar` from its start rule.
pub fn suggest<L: Lexer + ?Sized>(
    source: &str,
    cursor_offset: usize,
    grammar: &Grammar,
    lexer: &L,
) -> Result<Suggestions, SuggestError> {
    Suggester::new(grammar.network()).suggest_source(lexer, source, cursor_offset)
}
