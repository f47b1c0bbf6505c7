use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};

use crate::scanner::token::TokenType;

/// Spelling → keyword token type, as consumed by the scanner.
pub type Keywords = HashMap<String, TokenType>;

/// Loads the keyword table from a JSON object of `{"<keyword name>": "<spelling>"}`,
/// or the built-in table when no path is given.
pub fn load_keywords(path: Option<&str>) -> Result<Keywords> {
    let map: HashMap<String, String> = match path {
        Some(p) => {
            let contents = fs::read_to_string(p)
                .with_context(|| format!("could not read keyword file '{}'", p))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("keyword file '{}' is not a JSON string map", p))?
        }
        None => default_spellings(),
    };

    Ok(keywords_from_spellings(map))
}

pub fn default_keywords() -> Keywords {
    keywords_from_spellings(default_spellings())
}

fn keywords_from_spellings(map: HashMap<String, String>) -> Keywords {
    let mut keywords = HashMap::new();
    for (key, value) in map {
        if let Some(token_type) = str_to_token_type(&key) {
            keywords.insert(value, token_type);
        } else {
            tracing::debug!(keyword = %key, "ignoring unknown keyword name");
        }
    }
    keywords
}

// These spellings are part of the language; scripts depend on them verbatim.
fn default_spellings() -> HashMap<String, String> {
    HashMap::from([
        ("and".into(), "e".into()),
        ("or".into(), "o".into()),
        ("class".into(), "classa".into()),
        ("if".into(), "se".into()),
        ("else".into(), "senon".into()),
        ("false".into(), "fals".into()),
        ("function".into(), "foncion".into()),
        ("for".into(), "per".into()),
        ("nil".into(), "nul".into()),
        ("print".into(), "est".into()),
        ("return".into(), "tornar".into()),
        ("super".into(), "eretar".into()),
        ("this".into(), "aico".into()),
        ("true".into(), "true".into()),
        ("var".into(), "var".into()),
        ("while".into(), "mentre".into()),
    ])
}

fn str_to_token_type(s: &str) -> Option<TokenType> {
    match s {
        "and" => Some(TokenType::And),
        "or" => Some(TokenType::Or),
        "class" => Some(TokenType::Class),
        "if" => Some(TokenType::If),
        "else" => Some(TokenType::Else),
        "false" => Some(TokenType::False),
        "function" => Some(TokenType::Function),
        "for" => Some(TokenType::For),
        "nil" => Some(TokenType::Nil),
        "print" => Some(TokenType::Print),
        "return" => Some(TokenType::Return),
        "super" => Some(TokenType::Super),
        "this" => Some(TokenType::This),
        "true" => Some(TokenType::True),
        "var" => Some(TokenType::Var),
        "while" => Some(TokenType::While),
        _ => None,
    }
}
