// ANTLR `.interp` files: vocabulary, rule names and the serialized network
// written by the ANTLR tool next to generated parsers.
//
// Layout (sections separated by blank lines):
//
//   token literal names:
//   null
//   '('
//   ...
//
//   token symbolic names:
//   ...
//
//   rule names:
//   ...
//
//   atn:
//   [4, 1, 5, ...]

use crate::NetError;

/// Raw contents of an `.interp` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpFile {
    pub literal_names: Vec<Option<String>>,
    pub symbolic_names: Vec<Option<String>>,
    pub rule_names: Vec<String>,
    pub words: Vec<i32>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Literal,
    Symbolic,
    Rules,
    Modes,
    Atn,
}

/// Parse the text of an `.interp` file.
///
/// Lexer `.interp` files (with `channel names:` and `mode names:` sections)
/// parse as well; their networks are rejected later by the deserializer.
pub fn parse(text: &str) -> Result<InterpFile, NetError> {
    let mut file = InterpFile::default();
    let mut section = Section::None;
    let mut saw_atn = false;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        match line {
            "token literal names:" => section = Section::Literal,
            "token symbolic names:" => section = Section::Symbolic,
            "rule names:" => section = Section::Rules,
            "channel names:" | "mode names:" => section = Section::Modes,
            "atn:" => section = Section::Atn,
            "" => section = Section::None,
            _ => match section {
                Section::Literal => file.literal_names.push(entry(line)),
                Section::Symbolic => file.symbolic_names.push(entry(line)),
                Section::Rules => file.rule_names.push(line.to_string()),
                Section::Modes => {}
                Section::Atn => {
                    file.words = parse_words(line)
                        .map_err(|e| NetError::InvalidInterp(format!("line {}: {e}", number + 1)))?;
                    saw_atn = true;
                }
                Section::None => {
                    return Err(NetError::InvalidInterp(format!(
                        "line {}: unexpected text outside a section",
                        number + 1
                    )));
                }
            },
        }
    }

    if !saw_atn {
        return Err(NetError::InvalidInterp("missing atn section".to_string()));
    }
    Ok(file)
}

fn entry(line: &str) -> Option<String> {
    (line != "null").then(|| line.to_string())
}

fn parse_words(line: &str) -> Result<Vec<i32>, String> {
    let inner = line
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| "atn must be a bracketed list".to_string())?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|w| {
            let w = w.trim();
            w.parse::<i32>().map_err(|_| format!("invalid atn word {w:?}"))
        })
        .collect()
}

/// Render an `.interp` file. The output parses back to the same contents.
pub fn write(file: &InterpFile) -> String {
    let mut out = String::new();
    out.push_str("token literal names:\n");
    for name in &file.literal_names {
        out.push_str(name.as_deref().unwrap_or("null"));
        out.push('\n');
    }
    out.push_str("\ntoken symbolic names:\n");
    for name in &file.symbolic_names {
        out.push_str(name.as_deref().unwrap_or("null"));
        out.push('\n');
    }
    out.push_str("\nrule names:\n");
    for name in &file.rule_names {
        out.push_str(name);
        out.push('\n');
    }
    out.push_str("\natn:\n[");
    let words: Vec<String> = file.words.iter().map(i32::to_string).collect();
    out.push_str(&words.join(", "));
    out.push_str("]\n");
    out
}
