//! Fixture corpus.
//!
//! Six gzip-compressed reference documents, each bound to a typed schema.
//! Loading is all-or-nothing: a missing or corrupt fixture is a setup error
//! and nothing runs.

pub mod fixtures;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::registry::Value;

/// A corpus document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fixture {
    /// GeoJSON polygons, dominated by floats
    CanadaGeometry,
    /// Event catalogue, dominated by id-keyed maps
    CITMCatalog,
    /// FHIR bundle with deeply nested records
    SyntheaFHIR,
    /// Search results with mixed content
    TwitterStatus,
    /// Recursive file tree
    GolangSource,
    /// Non-ASCII strings and escapes
    StringUnicode,
}

impl Fixture {
    /// Every fixture, in corpus order.
    pub const ALL: [Fixture; 6] = [
        Fixture::CanadaGeometry,
        Fixture::CITMCatalog,
        Fixture::SyntheaFHIR,
        Fixture::TwitterStatus,
        Fixture::GolangSource,
        Fixture::StringUnicode,
    ];

    /// Name used in unit and benchmark names.
    pub const fn name(self) -> &'static str {
        match self {
            Fixture::CanadaGeometry => "CanadaGeometry",
            Fixture::CITMCatalog => "CITMCatalog",
            Fixture::SyntheaFHIR => "SyntheaFHIR",
            Fixture::TwitterStatus => "TwitterStatus",
            Fixture::GolangSource => "GolangSource",
            Fixture::StringUnicode => "StringUnicode",
        }
    }

    /// File name inside the fixture directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Fixture::CanadaGeometry => "canada_geometry.json.gz",
            Fixture::CITMCatalog => "citm_catalog.json.gz",
            Fixture::SyntheaFHIR => "synthea_fhir.json.gz",
            Fixture::TwitterStatus => "twitter_status.json.gz",
            Fixture::GolangSource => "golang_source.json.gz",
            Fixture::StringUnicode => "string_unicode.json.gz",
        }
    }

    /// Look a fixture up by name.
    pub fn from_name(name: &str) -> HarnessResult<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| HarnessError::Unknown {
                kind: "fixture",
                name: name.to_string(),
            })
    }

    /// An empty decode target of the given shape for this fixture.
    pub fn empty(self, shape: Shape) -> Value {
        match shape {
            Shape::Concrete => match self {
                Fixture::CanadaGeometry => Value::Canada(Box::default()),
                Fixture::CITMCatalog => Value::Citm(Box::default()),
                Fixture::SyntheaFHIR => Value::Synthea(Box::default()),
                Fixture::TwitterStatus => Value::Twitter(Box::default()),
                Fixture::GolangSource => Value::Golang(Box::default()),
                Fixture::StringUnicode => Value::Strings(Box::default()),
            },
            Shape::Dynamic => Value::Dynamic(serde_json::Value::Null),
            Shape::RawText => Value::Raw(None),
        }
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a decoded document is held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    /// The fixture's typed schema
    Concrete,
    /// `serde_json::Value`
    Dynamic,
    /// Verbatim document text
    RawText,
}

impl Shape {
    /// Every shape, in report order.
    pub const ALL: [Shape; 3] = [Shape::Concrete, Shape::Dynamic, Shape::RawText];

    /// Name used in unit and benchmark names.
    pub const fn name(self) -> &'static str {
        match self {
            Shape::Concrete => "Concrete",
            Shape::Dynamic => "Dynamic",
            Shape::RawText => "RawText",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read and decompress a gzip file.
pub fn load(path: &Path) -> HarnessResult<Vec<u8>> {
    let file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
    let mut bytes = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut bytes)
        .map_err(|source| HarnessError::CorruptFixture {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(bytes)
}

/// A loaded fixture.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    /// Which document this is
    pub fixture: Fixture,
    /// Decompressed document bytes
    pub bytes: Vec<u8>,
}

impl CorpusEntry {
    /// Name of the entry.
    pub fn name(&self) -> &'static str {
        self.fixture.name()
    }

    /// An empty decode target of the given shape.
    pub fn empty(&self, shape: Shape) -> Value {
        self.fixture.empty(shape)
    }
}

/// The loaded corpus. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Load every fixture from `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> HarnessResult<Self> {
        Self::load_fixtures(dir, &Fixture::ALL)
    }

    /// Load the given fixtures from `dir`.
    pub fn load_fixtures<P: AsRef<Path>>(dir: P, fixtures: &[Fixture]) -> HarnessResult<Self> {
        let dir = dir.as_ref();
        let entries = fixtures
            .iter()
            .map(|&fixture| {
                let path: PathBuf = dir.join(fixture.file_name());
                let bytes = load(&path)?;
                debug!(fixture = fixture.name(), bytes = bytes.len(), "loaded fixture");
                Ok(CorpusEntry { fixture, bytes })
            })
            .collect::<HarnessResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Build a corpus from documents already in memory.
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    /// Loaded entries in corpus order.
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_gz(dir: &Path, name: &str, body: &[u8]) {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(body).unwrap();
        std::fs::write(dir.join(name), enc.finish().unwrap()).unwrap();
    }

    #[test]
    fn test_load_decompresses() {
        let dir = tempfile::tempdir().unwrap();
        write_gz(dir.path(), "golang_source.json.gz", br#"{"username":"gopher"}"#);

        let corpus = Corpus::load_fixtures(dir.path(), &[Fixture::GolangSource]).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.entries()[0].bytes, br#"{"username":"gopher"}"#);
        assert_eq!(corpus.entries()[0].name(), "GolangSource");
    }

    #[test]
    fn test_missing_fixture_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Corpus::load(dir.path()).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
        assert!(err.to_string().contains("canada_geometry.json.gz"));
    }

    #[test]
    fn test_corrupt_fixture_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("citm_catalog.json.gz"), b"not gzip").unwrap();

        let err = Corpus::load_fixtures(dir.path(), &[Fixture::CITMCatalog]).unwrap_err();
        assert!(matches!(err, HarnessError::CorruptFixture { .. }));
    }

    #[test]
    fn test_fixture_names() {
        assert_eq!(Fixture::from_name("TwitterStatus").unwrap(), Fixture::TwitterStatus);
        assert!(Fixture::from_name("Nope").is_err());
        assert_eq!(Shape::RawText.to_string(), "RawText");
    }

    #[test]
    fn test_empty_values_match_shape() {
        for fixture in Fixture::ALL {
            assert_eq!(fixture.empty(Shape::Concrete).shape(), Some(Shape::Concrete));
            assert_eq!(fixture.empty(Shape::Dynamic).shape(), Some(Shape::Dynamic));
            assert_eq!(fixture.empty(Shape::RawText).shape(), Some(Shape::RawText));
        }
    }
}
