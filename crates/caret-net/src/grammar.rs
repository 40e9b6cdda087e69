// A loaded grammar: network, vocabulary and rule names.

use crate::interp::{self, InterpFile};
use crate::network::GrammarNetwork;
use crate::vocabulary::Vocabulary;
use crate::{NetError, bundle, serialized};

/// Everything the suggestion engine and its callers need from a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    network: GrammarNetwork,
    vocabulary: Vocabulary,
    rule_names: Vec<String>,
}

impl Grammar {
    pub fn new(network: GrammarNetwork, vocabulary: Vocabulary, rule_names: Vec<String>) -> Self {
        Self {
            network,
            vocabulary,
            rule_names,
        }
    }

    /// Load a grammar from the text of an ANTLR `.interp` file.
    pub fn from_interp(text: &str) -> Result<Self, NetError> {
        Self::from_file(interp::parse(text)?)
    }

    /// Load a grammar from a `.cnet` bundle.
    pub fn from_bundle(data: &[u8]) -> Result<Self, NetError> {
        Self::from_file(bundle::read(data)?)
    }

    /// Load a grammar from bytes holding either a bundle or `.interp` text.
    pub fn from_bytes(data: &[u8]) -> Result<Self, NetError> {
        if bundle::is_bundle(data) {
            return Self::from_bundle(data);
        }
        let text = std::str::from_utf8(data)
            .map_err(|_| NetError::InvalidInterp("not UTF-8 text".to_string()))?;
        Self::from_interp(text)
    }

    fn from_file(file: InterpFile) -> Result<Self, NetError> {
        let network = serialized::deserialize(&file.words)?;
        if !file.rule_names.is_empty() && file.rule_names.len() != network.rule_count() {
            return Err(NetError::InvalidInterp(format!(
                "{} rule names for {} rules",
                file.rule_names.len(),
                network.rule_count()
            )));
        }
        tracing::debug!(
            states = network.len(),
            rules = network.rule_count(),
            transitions = network.transition_count(),
            max_token_type = network.max_token_type(),
            "loaded grammar network"
        );
        Ok(Self {
            network,
            vocabulary: Vocabulary::new(file.literal_names, file.symbolic_names),
            rule_names: file.rule_names,
        })
    }

    /// The `.interp` representation of this grammar.
    pub fn to_interp_file(&self) -> InterpFile {
        InterpFile {
            literal_names: self.vocabulary.literal_names().to_vec(),
            symbolic_names: self.vocabulary.symbolic_names().to_vec(),
            rule_names: self.rule_names.clone(),
            words: serialized::serialize(&self.network),
        }
    }

    /// Encode this grammar as a `.cnet` bundle.
    pub fn to_bundle(&self) -> Vec<u8> {
        bundle::write(&self.to_interp_file())
    }

    pub fn network(&self) -> &GrammarNetwork {
        &self.network
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn rule_names(&self) -> &[String] {
        &self.rule_names
    }

    pub fn rule_index(&self, name: &str) -> Option<u32> {
        self.rule_names.iter().position(|r| r == name).map(|i| i as u32)
    }

    /// Name of the rule walks start from.
    pub fn start_rule_name(&self) -> Option<&str> {
        self.network
            .start_rule()
            .and_then(|r| self.rule_names.get(r as usize))
            .map(String::as_str)
    }

    /// Start suggestion walks at the rule called `name`.
    pub fn with_start_rule(mut self, name: &str) -> Result<Self, NetError> {
        let rule = self
            .rule_index(name)
            .ok_or_else(|| NetError::UnknownRule(name.to_string()))?;
        self.network = self.network.with_start_rule(rule)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // prog : stat ;  stat : 'go' ;
    const INTERP: &str = "token literal names:
null
'go'

token symbolic names:
null
GO

rule names:
prog
stat

atn:
[4, 1, 1, 8, 2, 0, 7, 0, 1, 0, 1, 0, 2, 1, 7, 1, 1, 1, 1, 1, 0, 0, 2, 0, 4, 0, 0, 6, 0, 2, 1, 0, 0, 0, 2, 3, 3, 4, 1, 0, 3, 1, 1, 0, 0, 0, 4, 6, 1, 0, 0, 0, 6, 7, 5, 1, 0, 0, 7, 5, 1, 0, 0, 0, 0]
";

    #[test]
    fn load_interp() {
        let g = Grammar::from_interp(INTERP).unwrap();
        assert_eq!(g.rule_names(), &["prog", "stat"]);
        assert_eq!(g.network().rule_count(), 2);
        assert_eq!(g.start_rule_name(), Some("prog"));
        assert_eq!(g.vocabulary().proposition(1).as_deref(), Some("go"));
    }

    #[test]
    fn switch_start_rule_by_name() {
        let g = Grammar::from_interp(INTERP).unwrap().with_start_rule("stat").unwrap();
        assert_eq!(g.start_rule_name(), Some("stat"));
        assert_eq!(g.network().start_state(), 4);

        let err = Grammar::from_interp(INTERP)
            .unwrap()
            .with_start_rule("nope")
            .unwrap_err();
        assert!(matches!(err, NetError::UnknownRule(name) if name == "nope"));
    }

    #[test]
    fn bundle_round_trip() {
        let g = Grammar::from_interp(INTERP).unwrap();
        let again = Grammar::from_bytes(&g.to_bundle()).unwrap();
        assert_eq!(again, g);
    }

    #[test]
    fn from_bytes_accepts_interp_text() {
        let g = Grammar::from_bytes(INTERP.as_bytes()).unwrap();
        assert_eq!(g.rule_names().len(), 2);
    }

    #[test]
    fn reject_rule_name_mismatch() {
        let text = INTERP.replace("stat\n\natn", "stat\nextra\n\natn");
        assert!(matches!(
            Grammar::from_interp(&text),
            Err(NetError::InvalidInterp(_))
        ));
    }
}
