//! Build-time version metadata.
//!
//! Populated by the build script; set `SERVICE_NAME`, `GIT_VERSION`,
//! `GIT_COMMIT`, `GIT_BRANCH`, `GIT_TREE_STATE` or `BUILD_DATE` in the
//! environment of `cargo build` to override what git reports.

use std::fmt;

use serde::Serialize;

const DEFAULT_VERSIONS: [&str; 4] = ["v0.0.0-dev", "unknown", "dev", ""];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub service_name: &'static str,
    pub git_version: &'static str,
    pub git_commit: &'static str,
    pub git_branch: &'static str,
    pub git_tree_state: &'static str,
    pub build_date: &'static str,
    pub rust_version: &'static str,
    pub platform: &'static str,
}

static VERSION: VersionInfo = VersionInfo {
    service_name: env!("LOGKIT_SERVICE_NAME"),
    git_version: env!("LOGKIT_GIT_VERSION"),
    git_commit: env!("LOGKIT_GIT_COMMIT"),
    git_branch: env!("LOGKIT_GIT_BRANCH"),
    git_tree_state: env!("LOGKIT_GIT_TREE_STATE"),
    build_date: env!("LOGKIT_BUILD_DATE"),
    rust_version: env!("LOGKIT_RUST_VERSION"),
    platform: env!("LOGKIT_PLATFORM"),
};

/// Version metadata of this build.
pub fn get() -> &'static VersionInfo {
    &VERSION
}

impl VersionInfo {
    /// First eight characters of the commit hash.
    pub fn short_commit(&self) -> &str {
        match self.git_commit.char_indices().nth(8) {
            Some((end, _)) => &self.git_commit[..end],
            None => self.git_commit,
        }
    }

    /// True when no real version was stamped into the build.
    pub fn is_default_version(&self) -> bool {
        DEFAULT_VERSIONS.contains(&self.git_version)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (commit {}, branch {}, tree {}, built {}, {}, {})",
            self.git_version,
            self.short_commit(),
            self.git_branch,
            self.git_tree_state,
            self.build_date,
            self.rust_version,
            self.platform,
        )
    }
}
