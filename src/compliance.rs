//! License compliance classification

use crate::policy::LicensePredicate;
use crate::types::{FailureReason, LicenseCheck};
use once_cell::sync::Lazy;
use regex::Regex;

static MISSING_LICENSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(unknown|see license)\b").expect("missing-license pattern is valid")
});

/// Whether a license value carries no usable information
pub fn is_missing(license: &str) -> bool {
    license.is_empty() || MISSING_LICENSE.is_match(license)
}

/// Check a license (or license file content) against a policy predicate.
///
/// Missing values fail without consulting the predicate; everything else
/// passes or fails as the predicate decides.
pub fn classify(license: &str, is_file: bool, predicate: &LicensePredicate) -> LicenseCheck {
    if is_missing(license) {
        return LicenseCheck::failed(FailureReason::Missing);
    }
    if predicate(license, is_file) {
        LicenseCheck::passed()
    } else {
        LicenseCheck::failed(FailureReason::Incompatible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn accept(expected: &'static str) -> LicensePredicate {
        Arc::new(move |license, _| license == expected)
    }

    #[test]
    fn test_pass_when_predicate_accepts() {
        let check = classify("MIT", false, &accept("MIT"));
        assert_eq!(check, LicenseCheck::passed());
        assert_eq!(check.reason, None);
    }

    #[test]
    fn test_incompatible_when_predicate_rejects() {
        let check = classify("GPL-3.0", false, &accept("MIT"));
        assert_eq!(check, LicenseCheck::failed(FailureReason::Incompatible));
    }

    #[test]
    fn test_empty_is_missing() {
        let always: LicensePredicate = Arc::new(|_, _| true);
        assert_eq!(
            classify("", false, &always),
            LicenseCheck::failed(FailureReason::Missing)
        );
    }

    #[test]
    fn test_whitespace_reaches_predicate() {
        assert_eq!(
            classify(" ", false, &accept("MIT")),
            LicenseCheck::failed(FailureReason::Incompatible)
        );
        assert!(classify(" ", false, &accept(" ")).pass);
    }

    #[test]
    fn test_placeholders_missing_regardless_of_predicate() {
        let always: LicensePredicate = Arc::new(|_, _| true);
        for license in ["UNKNOWN", "Unknown license", "SEE LICENSE IN LICENSE.md", "see license"] {
            assert_eq!(
                classify(license, false, &always),
                LicenseCheck::failed(FailureReason::Missing),
                "{license}"
            );
        }
    }

    #[test]
    fn test_unknown_must_be_a_whole_word() {
        let always: LicensePredicate = Arc::new(|_, _| true);
        assert!(classify("Unknownware-1.0", false, &always).pass);
    }

    #[test]
    fn test_predicate_sees_file_flag() {
        let files_only: LicensePredicate = Arc::new(|_, is_file| is_file);
        assert!(classify("Apache License", true, &files_only).pass);
        assert!(!classify("Apache License", false, &files_only).pass);
    }
}
