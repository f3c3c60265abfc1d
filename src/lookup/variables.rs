//! Permission variables offered as comparison values

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::EditorConfig;

static CLAIM_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("claim key pattern"));

static VARIABLE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^x-hasura-[a-z0-9_-]+$").expect("variable token pattern"));

/// Whether a value token names a session variable rather than a literal
pub fn is_permission_variable(token: &str) -> bool {
    VARIABLE_TOKEN.is_match(token.trim())
}

/// `X-Hasura-<Key>` for a custom claim key
///
/// Keys that already carry the prefix are not prefixed twice. Keys that
/// cannot form a header name yield `None`.
pub fn permission_variable_token(prefix: &str, key: &str) -> Option<String> {
    let key = key.trim();
    let key = match key.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &key[prefix.len()..],
        _ => key,
    };

    if !CLAIM_KEY.is_match(key) {
        debug!(key, "skipping claim key that is not a valid variable name");
        return None;
    }
    Some(format!("{}{}", prefix, key))
}

/// Curated variable list: configured defaults, then one token per claim
///
/// Duplicates (case-insensitive) keep their first position.
pub fn permission_variable_tokens(config: &EditorConfig, claims: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::with_capacity(config.default_variables.len() + claims.len());

    let candidates = config.default_variables.iter().cloned().chain(
        claims
            .iter()
            .filter_map(|key| permission_variable_token(&config.permission_variable_prefix, key)),
    );

    for token in candidates {
        if !tokens.iter().any(|t| t.eq_ignore_ascii_case(&token)) {
            tokens.push(token);
        }
    }
    tokens
}
