//! Harness configuration.
//!
//! Defaults match the repository layout; the binary overrides them from the
//! command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::corpus::Fixture;
use crate::error::HarnessResult;

/// Whether a suite run compares against the golden file or rewrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoldenMode {
    /// Fail on any difference from the golden file
    #[default]
    Check,
    /// Overwrite the golden file with this run's results
    Update,
}

impl GoldenMode {
    /// `Update` if `update` is set.
    pub const fn from_flag(update: bool) -> Self {
        if update {
            Self::Update
        } else {
            Self::Check
        }
    }
}

/// Paths and modes for the correctness runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Directory holding the gzip fixtures
    pub testdata_dir: PathBuf,
    /// Directory holding the conformance suite documents
    pub suite_dir: PathBuf,
    /// Golden file name, inside `suite_dir`
    pub golden: String,
    /// Golden file mode
    pub mode: GoldenMode,
    /// Fixtures to load; all when empty
    pub fixtures: Vec<Fixture>,
}

impl HarnessConfig {
    /// Default layout rooted at `dir`.
    pub fn rooted<P: AsRef<Path>>(dir: P) -> Self {
        let testdata_dir = dir.as_ref().to_path_buf();
        Self {
            suite_dir: testdata_dir.join("JSONTestSuite"),
            testdata_dir,
            golden: "results.json".to_string(),
            mode: GoldenMode::Check,
            fixtures: Vec::new(),
        }
    }

    /// Restrict to the named fixtures.
    pub fn with_fixture_names(mut self, names: &[String]) -> HarnessResult<Self> {
        self.fixtures = names
            .iter()
            .map(|n| Fixture::from_name(n))
            .collect::<HarnessResult<_>>()?;
        Ok(self)
    }

    /// Fixtures selected by this configuration.
    pub fn selected_fixtures(&self) -> &[Fixture] {
        if self.fixtures.is_empty() {
            &Fixture::ALL
        } else {
            &self.fixtures
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::rooted("testdata")
    }
}

/// Benchmark tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Minimum measuring time per benchmark
    pub min_time: Duration,
    /// Times each benchmark is repeated
    pub count: u32,
    /// Only run benchmarks whose name contains this
    pub filter: Option<String>,
}

impl BenchConfig {
    /// True if `name` passes the filter.
    pub fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().map_or(true, |f| name.contains(f))
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            min_time: Duration::from_secs(1),
            count: 1,
            filter: None,
        }
    }
}
