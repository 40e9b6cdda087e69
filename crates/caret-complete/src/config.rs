// Resource limits for a suggestion request.

/// Default upper bound on walker steps per request.
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

/// Default upper bound on simultaneously open constructs.
pub const DEFAULT_MAX_NESTING: usize = 2000;

/// How many steps pass between two looks at the cancellation token.
pub const CANCEL_CHECK_INTERVAL: usize = 256;

/// Limits applied to each suggestion request.
///
/// A step is one visit of a state, in the main walk or in a stack
/// compatibility check. Exceeding either limit aborts the request with an
/// error rather than returning a partial proposal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestOptions {
    pub max_steps: usize,
    pub max_nesting: usize,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl SuggestOptions {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = SuggestOptions::default();
        assert_eq!(options.max_steps, 1_000_000);
        assert_eq!(options.max_nesting, 2000);
    }

    #[test]
    fn builder_setters() {
        let options = SuggestOptions::default()
            .with_max_steps(10)
            .with_max_nesting(3);
        assert_eq!(options, SuggestOptions { max_steps: 10, max_nesting: 3 });
    }
}
