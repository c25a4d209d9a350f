use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use dslcheck::{DslFormat, DslValidator, ValidationIssue, ValidatorConfig};

#[derive(Debug, Deserialize)]
struct ExpectedOutput {
    success: bool,
    /// Error codes, in order.
    #[serde(default)]
    errors: Vec<String>,
    /// Warning codes, in order.
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    info: Option<ExpectedInfo>,
    /// Substrings that must appear in the first error's message.
    #[serde(default)]
    error_contains: Vec<String>,
    /// Document paths that must appear among the reported issues.
    #[serde(default)]
    paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExpectedInfo {
    dsl_version: Option<String>,
    app_mode: Option<String>,
    node_count: Option<usize>,
    edge_count: Option<usize>,
}

pub fn run_case(case_dir: &Path) {
    let (doc_path, format) = find_document(case_dir);
    let content = read_to_string(&doc_path);
    let expected: ExpectedOutput = read_json(case_dir.join("expected.json"));

    let config_path = case_dir.join("config.toml");
    let validator = if config_path.exists() {
        let config = ValidatorConfig::from_path(&config_path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", config_path.display(), e));
        DslValidator::new(config)
    } else {
        DslValidator::default()
    };

    let result = validator.validate_with_format(&content, format);

    assert_eq!(
        result.success,
        expected.success,
        "[{}] success mismatch: {}",
        case_dir.display(),
        serde_json::to_string_pretty(&result).unwrap_or_default()
    );
    assert_eq!(
        codes(&result.errors),
        expected.errors,
        "[{}] error codes mismatch: {:#?}",
        case_dir.display(),
        result.errors
    );
    assert_eq!(
        codes(&result.warnings),
        expected.warnings,
        "[{}] warning codes mismatch: {:#?}",
        case_dir.display(),
        result.warnings
    );

    if let Some(info) = expected.info {
        if let Some(version) = info.dsl_version {
            assert_eq!(result.info.dsl_version, version, "[{}] dsl_version", case_dir.display());
        }
        if let Some(mode) = info.app_mode {
            assert_eq!(result.info.app_mode, mode, "[{}] app_mode", case_dir.display());
        }
        if let Some(count) = info.node_count {
            assert_eq!(result.info.node_count, count, "[{}] node_count", case_dir.display());
        }
        if let Some(count) = info.edge_count {
            assert_eq!(result.info.edge_count, count, "[{}] edge_count", case_dir.display());
        }
    }

    for needle in &expected.error_contains {
        let message = result
            .errors
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or("");
        assert!(
            message.contains(needle.as_str()),
            "[{}] expected first error to contain '{}', got '{}'",
            case_dir.display(),
            needle,
            message
        );
    }

    for path in &expected.paths {
        assert!(
            result.issues().any(|issue| &issue.path == path),
            "[{}] no issue reported at '{}'",
            case_dir.display(),
            path
        );
    }
}

fn codes(issues: &[ValidationIssue]) -> Vec<String> {
    issues.iter().map(|i| i.code.to_string()).collect()
}

fn find_document(case_dir: &Path) -> (PathBuf, DslFormat) {
    for (name, format) in [
        ("workflow.yml", DslFormat::Yaml),
        ("workflow.json", DslFormat::Json),
        ("workflow.toml", DslFormat::Toml),
    ] {
        let path = case_dir.join(name);
        if path.exists() {
            return (path, format);
        }
    }
    panic!("No workflow document in {}", case_dir.display());
}

fn read_to_string(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref()).unwrap_or_else(|e| {
        panic!("Failed to read {}: {}", path.as_ref().display(), e)
    })
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> T {
    let content = read_to_string(path.as_ref());
    serde_json::from_str(&content).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.as_ref().display(), e)
    })
}
