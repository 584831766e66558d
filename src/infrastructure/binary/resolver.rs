use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::models::GuardianConfig;

/// Default file stem of the governance executable
pub const DEFAULT_BINARY_NAME: &str = "guardian";

/// Normalized operating system and CPU architecture
///
/// Names follow the layout of the `bin/<os>-<arch>/` directories shipped with
/// the governance binary: `darwin`, `linux`, `win32` and `x64`, `x86`, `arm64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Normalize raw OS and architecture names
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: normalize_os(os),
            arch: normalize_arch(arch),
        }
    }

    /// Platform of the running process
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn is_windows(&self) -> bool {
        self.os == "win32"
    }

    /// Directory name holding the platform-specific build, e.g. `linux-x64`
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Executable file name for `stem` on this platform
    pub fn executable_name(&self, stem: &str) -> String {
        if self.is_windows() {
            format!("{stem}.exe")
        } else {
            stem.to_string()
        }
    }
}

fn normalize_os(os: &str) -> String {
    let os = os.to_lowercase();
    match os.as_str() {
        "darwin" | "macos" => "darwin".to_string(),
        "linux" => "linux".to_string(),
        "windows" | "win32" => "win32".to_string(),
        _ => os,
    }
}

fn normalize_arch(arch: &str) -> String {
    let arch = arch.to_lowercase();
    match arch.as_str() {
        "x86_64" | "amd64" | "x64" => "x64".to_string(),
        "aarch64" | "arm64" => "arm64".to_string(),
        "i386" | "i686" | "x86" => "x86".to_string(),
        _ => arch,
    }
}

/// Locates the governance executable for the current platform
///
/// Resolution order, first existing path wins:
/// 1. `<base>/bin/<os>-<arch>/<binary>`
/// 2. `<base>/bin/<binary>`
/// 3. `<base>/<binary>`
///
/// When none exists the last candidate is returned anyway; existence is
/// checked again right before spawning.
#[derive(Debug, Clone)]
pub struct BinaryResolver {
    base_dir: PathBuf,
    platform: Platform,
    binary_stem: String,
    explicit: Option<PathBuf>,
}

impl BinaryResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            platform: Platform::current(),
            binary_stem: DEFAULT_BINARY_NAME.to_string(),
            explicit: None,
        }
    }

    /// Build a resolver from configuration
    ///
    /// The base directory is `install_dir` when set, otherwise the directory
    /// containing the running executable. `binary_path` short-circuits
    /// resolution entirely.
    pub fn from_config(config: &GuardianConfig) -> Self {
        let base_dir = config.install_dir.clone().unwrap_or_else(executable_dir);
        Self {
            explicit: config.binary_path.clone(),
            ..Self::new(base_dir)
        }
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub fn with_binary_stem(mut self, stem: impl Into<String>) -> Self {
        self.binary_stem = stem.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Candidate paths in resolution order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let name = self.platform.executable_name(&self.binary_stem);
        let bin_dir = self.base_dir.join("bin");
        vec![
            bin_dir.join(self.platform.dir_name()).join(&name),
            bin_dir.join(&name),
            self.base_dir.join(&name),
        ]
    }

    /// Resolve the executable path
    pub fn resolve(&self) -> PathBuf {
        if let Some(explicit) = &self.explicit {
            debug!(path = ?explicit, "using configured Guardian binary");
            return explicit.clone();
        }

        let candidates = self.candidates();
        if let Some(found) = candidates.iter().find(|path| path.exists()) {
            debug!(path = ?found, "resolved Guardian binary");
            return found.clone();
        }

        // Non-empty by construction
        let fallback = candidates.last().cloned().unwrap_or_default();
        debug!(path = ?fallback, "no Guardian binary found, using default location");
        fallback
    }
}

fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"#!/bin/sh\n").unwrap();
    }

    #[test]
    fn test_platform_normalization() {
        assert_eq!(Platform::new("linux", "x86_64").dir_name(), "linux-x64");
        assert_eq!(Platform::new("Linux", "AMD64").dir_name(), "linux-x64");
        assert_eq!(Platform::new("macos", "aarch64").dir_name(), "darwin-arm64");
        assert_eq!(Platform::new("darwin", "arm64").dir_name(), "darwin-arm64");
        assert_eq!(Platform::new("windows", "i686").dir_name(), "win32-x86");
        assert_eq!(Platform::new("linux", "i386").dir_name(), "linux-x86");
        assert_eq!(Platform::new("freebsd", "riscv64").dir_name(), "freebsd-riscv64");
    }

    #[test]
    fn test_windows_executable_suffix() {
        assert_eq!(Platform::new("windows", "x86_64").executable_name("guardian"), "guardian.exe");
        assert_eq!(Platform::new("linux", "x86_64").executable_name("guardian"), "guardian");
    }

    #[test]
    fn test_platform_specific_binary_wins() {
        let dir = TempDir::new().unwrap();
        let platform = Platform::new("linux", "x86_64");
        let specific = dir.path().join("bin/linux-x64/guardian");
        touch(&specific);
        touch(&dir.path().join("bin/guardian"));
        touch(&dir.path().join("guardian"));

        let resolver = BinaryResolver::new(dir.path()).with_platform(platform);
        assert_eq!(resolver.resolve(), specific);
    }

    #[test]
    fn test_bin_dir_before_root() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin/guardian");
        touch(&bin);
        touch(&dir.path().join("guardian"));

        let resolver =
            BinaryResolver::new(dir.path()).with_platform(Platform::new("linux", "x86_64"));
        assert_eq!(resolver.resolve(), bin);
    }

    #[test]
    fn test_root_binary_found() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("guardian.exe");
        touch(&root);

        let resolver =
            BinaryResolver::new(dir.path()).with_platform(Platform::new("windows", "amd64"));
        assert_eq!(resolver.resolve(), root);
    }

    #[test]
    fn test_missing_binary_returns_last_candidate() {
        let dir = TempDir::new().unwrap();
        let resolver =
            BinaryResolver::new(dir.path()).with_platform(Platform::new("linux", "aarch64"));

        let resolved = resolver.resolve();
        assert_eq!(resolved, dir.path().join("guardian"));
        assert!(!resolved.exists());
        assert_eq!(
            resolver.candidates()[0],
            dir.path().join("bin").join("linux-arm64").join("guardian")
        );
    }

    #[test]
    fn test_explicit_binary_path_bypasses_resolution() {
        let config = GuardianConfig {
            binary_path: Some(PathBuf::from("/opt/custom/guardian")),
            install_dir: Some(PathBuf::from("/nonexistent")),
            ..Default::default()
        };
        let resolver = BinaryResolver::from_config(&config);
        assert_eq!(resolver.resolve(), PathBuf::from("/opt/custom/guardian"));
        assert_eq!(resolver.base_dir(), Path::new("/nonexistent"));
    }
}
