// Build metadata for `logkit::version`.
//
// Values come from the environment of `cargo build` first, then from git, and
// finally from placeholders so that builds outside a checkout still succeed.
use std::process::Command;

const KEYS: [&str; 6] = [
    "SERVICE_NAME",
    "GIT_VERSION",
    "GIT_COMMIT",
    "GIT_BRANCH",
    "GIT_TREE_STATE",
    "BUILD_DATE",
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for key in KEYS {
        println!("cargo:rerun-if-env-changed={key}");
    }

    let service_name = from_env("SERVICE_NAME").unwrap_or_default();
    let git_version = from_env("GIT_VERSION")
        .or_else(|| git(&["describe", "--tags", "--always", "--dirty"]))
        .unwrap_or_else(|| "v0.0.0-dev".to_string());
    let git_commit = from_env("GIT_COMMIT")
        .or_else(|| git(&["rev-parse", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());
    let git_branch = from_env("GIT_BRANCH")
        .or_else(|| git(&["rev-parse", "--abbrev-ref", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());
    let git_tree_state = from_env("GIT_TREE_STATE")
        .or_else(|| {
            git(&["status", "--porcelain"]).map(|out| {
                if out.is_empty() { "clean" } else { "dirty" }.to_string()
            })
        })
        .unwrap_or_else(|| "unknown".to_string());
    let build_date = from_env("BUILD_DATE")
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());
    let rust_version = rustc_version().unwrap_or_else(|| "unknown".to_string());
    let platform = format!(
        "{}/{}",
        std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_else(|_| "unknown".to_string()),
        std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".to_string()),
    );

    emit("LOGKIT_SERVICE_NAME", &service_name);
    emit("LOGKIT_GIT_VERSION", &git_version);
    emit("LOGKIT_GIT_COMMIT", &git_commit);
    emit("LOGKIT_GIT_BRANCH", &git_branch);
    emit("LOGKIT_GIT_TREE_STATE", &git_tree_state);
    emit("LOGKIT_BUILD_DATE", &build_date);
    emit("LOGKIT_RUST_VERSION", &rust_version);
    emit("LOGKIT_PLATFORM", &platform);
}

fn from_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn rustc_version() -> Option<String> {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let output = Command::new(rustc).arg("--version").output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn emit(key: &str, value: &str) {
    // rustc-env values must stay on one line.
    let value = value.replace(['\n', '\r'], " ");
    println!("cargo:rustc-env={key}={value}");
}
