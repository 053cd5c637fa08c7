//! Locating and probing the external image-mastering tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::application::ports::CommandRunner;
use crate::domain::error::{BuildError, InputError};

/// Executable name looked up on the search path.
pub const TOOL_NAME: &str = "xorriso";

/// Timeout for `xorriso -version`.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(clippy::expect_used)] // Pattern is a compile-time constant
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^xorriso\s+(\d+\.\d+(?:\.\d+)?)").expect("valid version pattern")
});

/// Locates `xorriso` and verifies that it runs.
///
/// The located path is instance state, so a builder can be handed a detector
/// pinned to a fake tool in tests.
pub struct ToolDetector<R: CommandRunner> {
    runner: R,
    search_path: Option<OsString>,
    pinned: Option<PathBuf>,
    located: Option<PathBuf>,
    version: Option<String>,
}

impl<R: CommandRunner> ToolDetector<R> {
    /// Detector that searches `PATH`.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            search_path: None,
            pinned: None,
            located: None,
            version: None,
        }
    }

    /// Detector that skips the lookup and probes `path` directly.
    pub fn at(runner: R, path: impl Into<PathBuf>) -> Self {
        Self {
            pinned: Some(path.into()),
            ..Self::new(runner)
        }
    }

    /// Search this path list instead of the process `PATH`.
    #[must_use]
    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    /// Locate the tool and probe its version.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ToolingUnavailable`] with install guidance when
    /// the tool is missing, fails to run, or prints no recognisable version.
    pub async fn detect(&mut self) -> Result<&Path, BuildError> {
        self.located = None;
        self.version = None;

        let path = self.locate()?;
        let program = path
            .to_str()
            .ok_or_else(|| InputError::NonUtf8Path(path.clone()))?;

        let output = self
            .runner
            .run_with_timeout(program, &["-version"], VERSION_PROBE_TIMEOUT)
            .await
            .map_err(|e| unavailable(format!("{} did not run: {e:#}", path.display())))?;
        if !output.status.success() {
            return Err(unavailable(format!(
                "{} -version exited with {}",
                path.display(),
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let version = parse_version(&stdout)
            .or_else(|| parse_version(&stderr))
            .ok_or_else(|| {
                unavailable(format!("{} printed no recognisable version", path.display()))
            })?;

        tracing::debug!(path = %path.display(), %version, "mastering tool detected");
        self.version = Some(version);
        Ok(self.located.insert(path))
    }

    fn locate(&self) -> Result<PathBuf, BuildError> {
        if let Some(pinned) = &self.pinned {
            return if pinned.is_file() {
                Ok(pinned.clone())
            } else {
                Err(unavailable(format!(
                    "configured path {} does not exist",
                    pinned.display()
                )))
            };
        }
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(TOOL_NAME, Some(paths), cwd)
            }
            None => which::which(TOOL_NAME),
        };
        found.map_err(|_| unavailable("not found on PATH".to_string()))
    }

    /// Whether a previous `detect` succeeded. Never spawns a process.
    #[must_use]
    pub fn available(&self) -> bool {
        self.located.is_some()
    }

    /// Path found by the last successful `detect`.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.located.as_deref()
    }

    /// Version found by the last successful `detect`.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Install guidance for the current platform.
    #[must_use]
    pub fn install_instructions(&self) -> &'static str {
        install_instructions()
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

fn unavailable(reason: String) -> BuildError {
    BuildError::ToolingUnavailable {
        tool: TOOL_NAME.to_string(),
        reason,
        guidance: install_instructions().to_string(),
    }
}

/// Extract `<major>.<minor>[.<patch>]` from `xorriso -version` output.
#[must_use]
pub fn parse_version(output: &str) -> Option<String> {
    VERSION_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Install guidance for the platform this binary was built for.
#[must_use]
pub fn install_instructions() -> &'static str {
    install_instructions_for(std::env::consts::OS)
}

/// Install guidance for `os` (a `std::env::consts::OS` value).
#[must_use]
pub fn install_instructions_for(os: &str) -> &'static str {
    match os {
        "linux" => {
            "Install xorriso with your package manager:\n  \
             Debian/Ubuntu: sudo apt install xorriso\n  \
             Fedora:        sudo dnf install xorriso\n  \
             Arch:          sudo pacman -S libisoburn"
        }
        "macos" => "Install xorriso with Homebrew:\n  brew install xorriso",
        "windows" => {
            "xorriso has no native Windows build. Run autoiso inside WSL and install it there:\n  \
             sudo apt install xorriso"
        }
        _ => "Install xorriso (part of GNU libisoburn) and make sure it is on your PATH.",
    }
}
