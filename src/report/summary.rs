//! Terminal summary of failed packages

use crate::types::LicenseResults;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

pub const NO_FAILURES: &str = "All packages have compatible licenses.\n";

/// Table of failed packages, or a one-line all-clear.
///
/// When `config_file` is given, failures are followed by a note pointing at
/// the file where exceptions can be declared.
pub fn render_summary(results: &LicenseResults, config_file: Option<&str>) -> String {
    if results.fail.is_empty() {
        return NO_FAILURES.to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Reason").add_attribute(Attribute::Bold),
            Cell::new("Repository").add_attribute(Attribute::Bold),
            Cell::new("Homepage").add_attribute(Attribute::Bold),
        ]);

    for (key, result) in results.fail.entries() {
        table.add_row(vec![
            Cell::new(key.as_str()),
            Cell::new(result.license.as_deref().unwrap_or("?")),
            Cell::new(result.reason.map_or("?".to_string(), |r| r.to_string())).fg(Color::Red),
            Cell::new(result.repository.as_deref().unwrap_or("?")),
            Cell::new(result.homepage.as_deref().unwrap_or("?")),
        ]);
    }

    let mut out = format!("{}\n", table);
    if let Some(config_file) = config_file {
        out.push_str(&format!(
            "\nNOTE: For false positives, exceptions may be added to: {}\n\n",
            config_file
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bucket, FailureReason, PackageKey, PackageResult};

    fn with_failure() -> LicenseResults {
        let mut results = LicenseResults::new();
        results.merge(
            Bucket::Pass,
            PackageKey::from("express@npm:4.18.2"),
            PackageResult {
                license: Some("MIT".to_string()),
                ..Default::default()
            },
        );
        results.merge(
            Bucket::Fail,
            PackageKey::from("mystery@npm:0.1.0"),
            PackageResult {
                reason: Some(FailureReason::Missing),
                repository: Some("https://example.com/mystery".to_string()),
                homepage: Some("https://mystery.example.com".to_string()),
                ..Default::default()
            },
        );
        results
    }

    #[test]
    fn test_no_failures() {
        let mut results = LicenseResults::new();
        results.merge(
            Bucket::Ignored,
            PackageKey::from("mystery@npm:0.1.0"),
            PackageResult::default(),
        );
        assert_eq!(render_summary(&results, Some(".licenses.toml")), NO_FAILURES);
    }

    #[test]
    fn test_failures_only_in_table() {
        let out = render_summary(&with_failure(), None);
        assert!(out.contains("Package"));
        assert!(out.contains("Repository"));
        assert!(out.contains("mystery@npm:0.1.0"));
        assert!(out.contains("missing"));
        assert!(out.contains("Homepage"));
        assert!(out.contains("https://example.com/mystery"));
        assert!(out.contains("https://mystery.example.com"));
        assert!(out.contains('?'));
        assert!(!out.contains("express"));
        assert!(!out.contains("NOTE:"));
    }

    #[test]
    fn test_config_note() {
        let out = render_summary(&with_failure(), Some(".licenses.toml"));
        assert!(out.ends_with(
            "\nNOTE: For false positives, exceptions may be added to: .licenses.toml\n\n"
        ));
    }
}
