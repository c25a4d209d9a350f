use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ================================
// DSL Versioning
// ================================

/// Current supported DSL version
pub const CURRENT_DSL_VERSION: FormatVersion = FormatVersion::new(0, 4, 0);

/// Placeholder reported in `info` when a value was never extracted.
pub const UNKNOWN: &str = "unknown";

/// A `major.minor.patch` DSL format version.
///
/// Pre-release and build suffixes are rejected: Dify only ever emits plain
/// three-component versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatVersion(semver::Version);

impl FormatVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        FormatVersion(semver::Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        CURRENT_DSL_VERSION
    }
}

impl PartialOrd for FormatVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FormatVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major(), self.minor(), self.patch()).cmp(&(other.major(), other.minor(), other.patch()))
    }
}

/// Why a version string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidVersion(pub String);

impl FromStr for FormatVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = semver::Version::parse(s.trim())
            .map_err(|e| InvalidVersion(format!("'{}' is not a major.minor.patch version: {}", s, e)))?;
        if !version.pre.is_empty() || !version.build.is_empty() {
            return Err(InvalidVersion(format!(
                "'{}' carries a pre-release or build suffix; expected plain major.minor.patch",
                s
            )));
        }
        Ok(FormatVersion(version))
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl Serialize for FormatVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FormatVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ================================
// App Modes
// ================================

/// Application category declared under `app.mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppMode {
    Completion,
    Chat,
    AgentChat,
    /// The chat-flow mode: a workflow graph driving a conversation.
    AdvancedChat,
    Workflow,
}

impl AppMode {
    /// All recognized modes, in the order they are advertised.
    pub const ALL: [AppMode; 5] = [
        AppMode::Completion,
        AppMode::Chat,
        AppMode::AgentChat,
        AppMode::AdvancedChat,
        AppMode::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Completion => "completion",
            AppMode::Chat => "chat",
            AppMode::AgentChat => "agent-chat",
            AppMode::AdvancedChat => "advanced-chat",
            AppMode::Workflow => "workflow",
        }
    }

    /// Whether documents of this mode carry a `workflow.graph`.
    pub fn requires_graph(&self) -> bool {
        matches!(self, AppMode::Workflow | AppMode::AdvancedChat)
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown app mode: {}", s))
    }
}
