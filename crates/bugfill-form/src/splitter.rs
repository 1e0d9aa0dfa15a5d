//! Turns a record value into the sequence of selections to make.

use crate::definition::Multiplicity;

/// Values to inject for one field, in order.
///
/// Split fields yield each whitespace-separated token; single fields yield
/// the value unchanged. Blank input yields nothing either way.
#[must_use]
pub fn values(value: &str, multiplicity: Multiplicity) -> Vec<&str> {
    if value.trim().is_empty() {
        return Vec::new();
    }

    match multiplicity {
        Multiplicity::Split => value.split_whitespace().collect(),
        Multiplicity::Single => vec![value],
    }
}
