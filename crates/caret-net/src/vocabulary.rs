// Category names: literal names ('+', 'if'), symbolic names (ID, INT) and
// proposition text derived from them.

use caret_core::{Category, EOF};

/// Names of a grammar's token categories, indexed by category.
///
/// Index 0 is unused by ANTLR vocabularies and normally holds `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    literal_names: Vec<Option<String>>,
    symbolic_names: Vec<Option<String>>,
}

impl Vocabulary {
    pub fn new(literal_names: Vec<Option<String>>, symbolic_names: Vec<Option<String>>) -> Self {
        Self {
            literal_names,
            symbolic_names,
        }
    }

    /// Build a vocabulary from quoted literal names for categories `1..`.
    ///
    /// ```
    /// use caret_net::Vocabulary;
    /// let vocab = Vocabulary::from_literals(&["'('", "')'"]);
    /// assert_eq!(vocab.literal_name(2), Some("')'"));
    /// ```
    pub fn from_literals(literals: &[&str]) -> Self {
        let mut literal_names = vec![None];
        literal_names.extend(literals.iter().map(|l| Some(l.to_string())));
        Self::new(literal_names, Vec::new())
    }

    /// Largest category with a literal or symbolic name.
    pub fn max_category(&self) -> Category {
        self.literal_names.len().max(self.symbolic_names.len()) as Category - 1
    }

    pub fn literal_name(&self, category: Category) -> Option<&str> {
        lookup(&self.literal_names, category)
    }

    pub fn symbolic_name(&self, category: Category) -> Option<&str> {
        if category == EOF {
            return Some("EOF");
        }
        lookup(&self.symbolic_names, category)
    }

    /// Human-readable name: literal name, else symbolic name, else the number.
    pub fn display_name(&self, category: Category) -> String {
        self.literal_name(category)
            .or_else(|| self.symbolic_name(category))
            .map_or_else(|| category.to_string(), str::to_string)
    }

    /// Text to insert for `category`: its literal name without the quotes.
    ///
    /// Categories without a literal name (identifiers, numbers) have no
    /// fixed text and yield `None`.
    pub fn proposition(&self, category: Category) -> Option<String> {
        self.literal_name(category).map(unquote)
    }

    /// Category with the given symbolic name.
    pub fn category_of(&self, symbolic: &str) -> Option<Category> {
        if symbolic == "EOF" {
            return Some(EOF);
        }
        self.symbolic_names
            .iter()
            .position(|n| n.as_deref() == Some(symbolic))
            .map(|i| i as Category)
    }

    /// All categories that have a literal name, with the unquoted text.
    pub fn literals(&self) -> impl Iterator<Item = (Category, String)> + '_ {
        self.literal_names
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_deref().map(|n| (i as Category, unquote(n))))
    }

    pub fn literal_names(&self) -> &[Option<String>] {
        &self.literal_names
    }

    pub fn symbolic_names(&self) -> &[Option<String>] {
        &self.symbolic_names
    }
}

fn lookup(names: &[Option<String>], category: Category) -> Option<&str> {
    usize::try_from(category)
        .ok()
        .and_then(|i| names.get(i))
        .and_then(|n| n.as_deref())
}

/// Strip the surrounding single quotes of a literal name and undo `\'` and
/// `\\` escapes. Names that are not quoted come back unchanged.
pub fn unquote(literal: &str) -> String {
    let Some(inner) = literal
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    else {
        return literal.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next @ ('\'' | '\\')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
