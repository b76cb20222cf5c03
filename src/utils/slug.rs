// src/utils/slug.rs

use std::sync::OnceLock;

use regex::Regex;

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[^a-z0-9]+").expect("static regex"))
}

/// Lowercase, collapse non-alphanumeric runs to single dashes, trim dashes,
/// cap at 80 characters.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let dashed = non_alnum().replace_all(&lowered, "-");
    let trimmed = dashed.trim_matches('-');
    trimmed.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_and_trims() {
        assert_eq!(slugify("Premier League: Top Scorers!"), "premier-league-top-scorers");
        assert_eq!(slugify("  El Clásico  "), "el-cl-sico");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn caps_length() {
        let long = "a".repeat(200);
        assert_eq!(slugify(&long).len(), 80);
    }
}
