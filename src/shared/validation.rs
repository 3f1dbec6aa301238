use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for statement-of-applicability control references
    /// Annex letter(s) followed by dot-separated clause numbers
    /// - Valid: "A.5.1", "A.8.23", "B.1"
    /// - Invalid: "A", "A.", "a.5.1", "A.5.", "5.1"
    pub static ref CONTROL_REF_REGEX: Regex = Regex::new(r"^[A-Z]{1,3}(?:\.[0-9]+)+$").unwrap();

    /// Regex for version labels on register entries and history logs
    /// - Valid: "1", "1.0", "2.3.1", "v4", "Rev 2"
    /// - Invalid: "", " 1", "1..2", "1."
    pub static ref VERSION_REGEX: Regex =
        Regex::new(r"^(?:[A-Za-z]+ ?)?[0-9]+(?:\.[0-9]+)*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_ref_regex_valid() {
        assert!(CONTROL_REF_REGEX.is_match("A.5.1"));
        assert!(CONTROL_REF_REGEX.is_match("A.8.23"));
        assert!(CONTROL_REF_REGEX.is_match("B.1"));
    }

    #[test]
    fn test_control_ref_regex_invalid() {
        assert!(!CONTROL_REF_REGEX.is_match("A")); // no clause
        assert!(!CONTROL_REF_REGEX.is_match("A.")); // dangling dot
        assert!(!CONTROL_REF_REGEX.is_match("a.5.1")); // lowercase annex
        assert!(!CONTROL_REF_REGEX.is_match("A.5.")); // trailing dot
        assert!(!CONTROL_REF_REGEX.is_match("5.1")); // no annex
    }

    #[test]
    fn test_version_regex() {
        assert!(VERSION_REGEX.is_match("1"));
        assert!(VERSION_REGEX.is_match("2.3.1"));
        assert!(VERSION_REGEX.is_match("v4"));
        assert!(VERSION_REGEX.is_match("Rev 2"));
        assert!(!VERSION_REGEX.is_match(""));
        assert!(!VERSION_REGEX.is_match(" 1"));
        assert!(!VERSION_REGEX.is_match("1..2"));
        assert!(!VERSION_REGEX.is_match("1."));
    }
}
