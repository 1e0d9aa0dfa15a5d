//! XPath patterns for locating dropdown options by their text.

use crate::definition::MatchMode;
use bugfill_browser::Locator;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Quote `value` as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so a value holding both quote kinds is
/// assembled with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }

    let parts: Vec<String> = value.split('"').map(|part| format!("\"{part}\"")).collect();
    format!("concat({})", parts.join(", '\"', "))
}

/// First character upper-cased, the rest lower-cased ("hIGH" -> "High").
#[must_use]
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Option locators to try, in order: case-folded, literal, capitalized.
#[must_use]
pub fn option_locators(value: &str, mode: MatchMode) -> [Locator; 3] {
    let folded = format!("translate(text(), \"{UPPER}\", \"{LOWER}\")");
    let lower = xpath_literal(&value.to_lowercase());
    let literal = xpath_literal(value);
    let capitalized = xpath_literal(&capitalize(value));

    match mode {
        MatchMode::Exact => [
            Locator::xpath(format!("//*[{folded}={lower}]")),
            Locator::xpath(format!("//*[text()={literal}]")),
            Locator::xpath(format!("//*[text()={capitalized}]")),
        ],
        MatchMode::Substring => [
            Locator::xpath(format!("//*[contains({folded}, {lower})]")),
            Locator::xpath(format!("//*[contains(text(), {literal})]")),
            Locator::xpath(format!("//*[contains(text(), {capitalized})]")),
        ],
    }
}
