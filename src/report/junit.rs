//! JUnit XML report
//!
//! Every package becomes a test case in a single suite. Failed packages carry
//! a `<failure>`, ignored ones a `<skipped/>`, and each case lists the known
//! fields of its result as standard output.

use crate::error::{AuditError, Result};
use crate::types::{Bucket, LicenseResults, PackageResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

pub const SUITE_NAME: &str = "Dependency Licenses Audit";

fn xml_error(e: impl std::fmt::Display) -> AuditError {
    AuditError::report(format!("failed to write JUnit report: {}", e))
}

fn failure_message(result: &PackageResult) -> Option<(String, String)> {
    let reason = result.reason?;
    let message = format!(
        "License: {}. Reason: {}",
        result.license.as_deref().unwrap_or("?"),
        reason.printable()
    );
    Some((message, reason.to_string()))
}

fn standard_output(result: &PackageResult) -> String {
    result
        .fields()
        .into_iter()
        .map(|(field, value)| format!("{}: {}", field, value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_junit(results: &LicenseResults) -> Result<String> {
    let entries = results.all_entries();
    let tests = entries.len().to_string();
    let failures = results.fail.len().to_string();
    let skipped = results.ignored.len().to_string();

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut suites = BytesStart::new("testsuites");
    suites.push_attribute(("tests", tests.as_str()));
    suites.push_attribute(("failures", failures.as_str()));
    suites.push_attribute(("errors", "0"));
    suites.push_attribute(("skipped", skipped.as_str()));
    writer.write_event(Event::Start(suites)).map_err(xml_error)?;

    let mut suite = BytesStart::new("testsuite");
    suite.push_attribute(("name", SUITE_NAME));
    suite.push_attribute(("tests", tests.as_str()));
    suite.push_attribute(("failures", failures.as_str()));
    suite.push_attribute(("errors", "0"));
    suite.push_attribute(("skipped", skipped.as_str()));
    writer.write_event(Event::Start(suite)).map_err(xml_error)?;

    for (bucket, key, result) in entries {
        let mut case = BytesStart::new("testcase");
        case.push_attribute(("classname", SUITE_NAME));
        case.push_attribute(("name", key.as_str()));
        writer.write_event(Event::Start(case)).map_err(xml_error)?;

        match bucket {
            Bucket::Ignored => writer
                .write_event(Event::Empty(BytesStart::new("skipped")))
                .map_err(xml_error)?,
            Bucket::Fail => {
                if let Some((message, kind)) = failure_message(result) {
                    let mut failure = BytesStart::new("failure");
                    failure.push_attribute(("message", message.as_str()));
                    failure.push_attribute(("type", kind.as_str()));
                    writer
                        .write_event(Event::Empty(failure))
                        .map_err(xml_error)?;
                }
            }
            Bucket::Pass => {}
        }

        let output = standard_output(result);
        if !output.is_empty() {
            writer
                .write_event(Event::Start(BytesStart::new("system-out")))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(&output)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new("system-out")))
                .map_err(xml_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("testcase")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("testsuite")))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("testsuites")))
        .map_err(xml_error)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureReason, PackageKey};

    fn sample() -> LicenseResults {
        let mut results = LicenseResults::new();
        results.merge(
            Bucket::Pass,
            PackageKey::from("express@npm:4.18.2"),
            PackageResult {
                license: Some("MIT".to_string()),
                homepage: Some("http://expressjs.com/".to_string()),
                ..Default::default()
            },
        );
        results.merge(
            Bucket::Fail,
            PackageKey::from("gpl-thing@npm:1.0.0"),
            PackageResult {
                reason: Some(FailureReason::Incompatible),
                license: Some("GPL-3.0-only".to_string()),
                ..Default::default()
            },
        );
        results.merge(
            Bucket::Fail,
            PackageKey::from("mystery@npm:0.1.0"),
            PackageResult {
                reason: Some(FailureReason::Missing),
                ..Default::default()
            },
        );
        results.merge(
            Bucket::Ignored,
            PackageKey::from("@corp/internal@npm:3.0.0"),
            PackageResult {
                reason: Some(FailureReason::Missing),
                ..Default::default()
            },
        );
        results
    }

    #[test]
    fn test_suite_counts() {
        let xml = render_junit(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            "<testsuite name=\"Dependency Licenses Audit\" tests=\"4\" failures=\"2\" errors=\"0\" skipped=\"1\">"
        ));
        assert_eq!(xml.matches("<testcase ").count(), 4);
    }

    #[test]
    fn test_failure_and_skipped_cases() {
        let xml = render_junit(&sample()).unwrap();
        assert!(xml.contains(
            "<failure message=\"License: GPL-3.0-only. Reason: License is incompatible.\" type=\"incompatible\"/>"
        ));
        assert!(xml.contains(
            "<failure message=\"License: ?. Reason: License could not be found.\" type=\"missing\"/>"
        ));
        assert_eq!(xml.matches("<skipped/>").count(), 1);
        assert_eq!(xml.matches("<failure ").count(), 2);
    }

    #[test]
    fn test_cases_sorted_with_standard_output() {
        let xml = render_junit(&sample()).unwrap();
        let corp = xml.find("@corp/internal@npm:3.0.0").unwrap();
        let express = xml.find("express@npm:4.18.2").unwrap();
        let mystery = xml.find("mystery@npm:0.1.0").unwrap();
        assert!(corp < express && express < mystery);

        assert!(xml.contains("license: MIT\nhomepage: http://expressjs.com/"));
    }

    #[test]
    fn test_empty_results() {
        let xml = render_junit(&LicenseResults::new()).unwrap();
        assert!(xml.contains("tests=\"0\""));
        assert!(!xml.contains("<testcase"));
    }
}
