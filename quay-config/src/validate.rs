//! Structural pre-flight validation
//!
//! Runs directly on raw text, independent of the full parser, so obviously
//! broken input can be rejected before committing to a parse or a save.
//! Checks are intentionally shallow: empty content, per-line brace
//! balance, and a denylist of paste-garbage markers. The full parser owns
//! everything subtler.

use serde::Serialize;

/// Markers that mean the text is pasted markup or binary junk rather than
/// a site configuration. Matched case-insensitively; findings are
/// warnings, not hard errors.
const KNOWN_BAD_TOKENS: &[&str] = &["<html", "<!doctype", "<?xml", "<?php", "\u{fffd}"];

/// Outcome of a structural validation pass. Building one never fails;
/// broken input is reported through `errors`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate raw configuration text structurally.
pub fn validate(raw: &str) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if raw.trim().is_empty() {
        errors.push("configuration is empty".to_string());
        return ValidationReport {
            valid: false,
            errors,
            warnings,
        };
    }

    let mut depth: i64 = 0;
    let mut underflow_reported = false;

    for (idx, line) in raw.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth < 0 && !underflow_reported {
                        errors.push(format!("unmatched '}}' on line {}", idx + 1));
                        underflow_reported = true;
                    }
                }
                _ => {}
            }
        }

        let lowered = line.to_lowercase();
        for bad in KNOWN_BAD_TOKENS {
            if lowered.contains(bad) {
                warnings.push(format!(
                    "line {} does not look like configuration (found {:?})",
                    idx + 1,
                    bad
                ));
                break;
            }
        }
    }

    if depth > 0 {
        errors.push(format!("{depth} unclosed '{{' at end of input"));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_invalid() {
        assert!(!validate("").valid);
        assert!(!validate("   \n\t\n").valid);
    }

    #[test]
    fn test_balanced_input_is_valid() {
        let report = validate("example.com {\n\trespond 200\n}\n");
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unclosed_brace_is_invalid() {
        let report = validate("example.com {\n\trespond 200\n");
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["1 unclosed '{' at end of input"]);
    }

    #[test]
    fn test_unmatched_close_reports_line() {
        let report = validate("example.com {\n\trespond 200\n}\n}\n");
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["unmatched '}' on line 4"]);
    }

    #[test]
    fn test_any_count_mismatch_is_invalid() {
        // count('{') != count('}') must always fail, whichever side wins
        for text in ["{{}", "{}}", "a { b { c }", "} {"] {
            let opens = text.matches('{').count();
            let closes = text.matches('}').count();
            if opens != closes {
                assert!(!validate(text).valid, "expected invalid: {text:?}");
            }
        }
    }

    #[test]
    fn test_placeholders_do_not_unbalance() {
        let report = validate("example.com {\n\tredir https://{host}{uri}\n}\n");
        assert!(report.valid);
    }

    #[test]
    fn test_markup_paste_is_soft_error() {
        let report = validate("<!DOCTYPE html>\n<html>\n</html>{}\n");
        // balanced braces, so still structurally valid, but flagged
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_never_panics_on_junk() {
        for junk in ["}}}}{{{{", "\u{fffd}\u{fffd}", "{", "#}\n{"] {
            let _ = validate(junk);
        }
    }
}
