//! Version information display

// Include the auto-generated versions from build.rs
include!(concat!(env!("OUT_DIR"), "/versions.rs"));

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (set by build.rs)
pub const GIT_HASH: &str = env!("REFRACTOR_GIT_HASH");

/// Git commit date (set by build.rs)
pub const GIT_DATE: &str = env!("REFRACTOR_GIT_DATE");

/// Full version text for `--version`.
pub fn long() -> String {
    let mut out = format!("{} ({} {})", VERSION, GIT_HASH, GIT_DATE);
    if !DEPENDENCY_VERSIONS.is_empty() {
        out.push_str("\n\nCore libraries:");
        let width = DEPENDENCY_VERSIONS
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        for (name, version) in DEPENDENCY_VERSIONS {
            out.push_str(&format!("\n  {:width$}  {}", name, version));
        }
    }
    out
}
