use std::cmp::Ordering;

use crate::dsl::schema::FormatVersion;

use super::types::{IssueCode, ValidationIssue};

/// Compare a document version against the supported one.
pub fn validate(document: &FormatVersion, supported: &FormatVersion) -> Vec<ValidationIssue> {
    let issue = match document.major().cmp(&supported.major()) {
        Ordering::Greater => Some(ValidationIssue::error(
            IssueCode::UnsupportedFutureVersion,
            format!(
                "DSL version {} is newer than the supported version {}; upgrade the validator",
                document, supported
            ),
            "version",
        )),
        Ordering::Less => Some(ValidationIssue::error(
            IssueCode::IncompatibleLegacyVersion,
            format!(
                "DSL version {} uses an incompatible major version; the supported version is {}",
                document, supported
            ),
            "version",
        )),
        Ordering::Equal => match document.cmp(supported) {
            Ordering::Less => Some(ValidationIssue::warning(
                IssueCode::OutdatedVersion,
                format!(
                    "DSL version {} is older than the supported version {}; it will be migrated on import",
                    document, supported
                ),
                "version",
            )),
            Ordering::Greater => Some(ValidationIssue::warning(
                IssueCode::AheadOfSupported,
                format!(
                    "DSL version {} is ahead of the supported version {}; newer fields may be ignored",
                    document, supported
                ),
                "version",
            )),
            Ordering::Equal => None,
        },
    };

    tracing::debug!(document = %document, supported = %supported, "version check finished");
    issue.into_iter().collect()
}
