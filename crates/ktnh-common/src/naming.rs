//! Stack naming: `<prefix>-<shortIdentifier>-<qualifier>`
//!
//! The stack name is the only place the qualifier is ever recorded, so the
//! same functions are used both to build the name at freeze time and to build
//! the patterns that find it again.

use crate::defaults::{IDENTIFIER_TRUNCATE_LENGTH, QUALIFIER_LENGTH};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

/// Wildcard used in place of an unspecified name component
pub const WILDCARD: &str = ".+";

/// Random suffix that disambiguates stacks for the same DB identifier
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Deref)]
pub struct Qualifier(String);

impl Qualifier {
    /// Generate a fresh random qualifier of [`QUALIFIER_LENGTH`] alphanumerics
    pub fn generate() -> Self {
        let qualifier: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(QUALIFIER_LENGTH)
            .map(char::from)
            .collect();

        debug!(qualifier = %qualifier, "Generated qualifier for CloudFormation stack");

        Qualifier(qualifier)
    }
}

impl From<&str> for Qualifier {
    fn from(s: &str) -> Self {
        Qualifier(s.to_string())
    }
}

/// Components of a stack name; `None` components become [`WILDCARD`].
///
/// When the identifier is unset the qualifier is ignored, giving `<prefix>-.+`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackNameOption<'a> {
    pub db_identifier_short: Option<&'a str>,
    pub qualifier: Option<&'a str>,
}

/// Shorten a DB identifier for use in stack names.
///
/// Truncates to [`IDENTIFIER_TRUNCATE_LENGTH`] characters. If the truncated
/// value ends with a non-alphanumeric character, one more character is kept.
pub fn shorten_identifier(db_identifier: &str) -> String {
    let char_count = db_identifier.chars().count();
    if char_count <= IDENTIFIER_TRUNCATE_LENGTH {
        return db_identifier.to_string();
    }

    let shortened: String = db_identifier
        .chars()
        .take(IDENTIFIER_TRUNCATE_LENGTH)
        .collect();

    if shortened
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphanumeric())
    {
        return shortened;
    }

    db_identifier
        .chars()
        .take(IDENTIFIER_TRUNCATE_LENGTH + 1)
        .collect()
}

/// Build a stack name (or a name pattern when components are missing).
pub fn generate_stack_name(prefix: &str, option: &StackNameOption<'_>) -> String {
    let mut items = vec![prefix];

    match option.db_identifier_short.filter(|s| !s.is_empty()) {
        None => items.push(WILDCARD),
        Some(short) => {
            items.push(short);
            items.push(option.qualifier.filter(|q| !q.is_empty()).unwrap_or(WILDCARD));
        }
    }

    let stack_name = items.join("-");

    debug!(stack_name = %stack_name, "Generated stack name");

    stack_name
}

/// Anchored regular expression source matching stacks for `option`
pub fn stack_name_pattern(prefix: &str, option: &StackNameOption<'_>) -> String {
    format!("^{}$", generate_stack_name(prefix, option))
}
