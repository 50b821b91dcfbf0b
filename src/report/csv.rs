//! CSV listing of every audited package

use crate::types::LicenseResults;
use std::borrow::Cow;

const HEADER: &str = "name,license,homepage,repository";

/// Quote a field when it contains a separator, quote, line break or tab
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n', '\t']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// One row per package across all buckets, sorted by package key
pub fn render_csv(results: &LicenseResults) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for (_, key, result) in results.all_entries() {
        let row = [
            key.as_str(),
            result.license.as_deref().unwrap_or_default(),
            result.homepage.as_deref().unwrap_or_default(),
            result.repository.as_deref().unwrap_or_default(),
        ]
        .map(escape)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }

    out
}
