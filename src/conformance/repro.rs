//! Reproduction bundle for differential divergences.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::equivalence::Divergence;
use crate::error::{HarnessError, HarnessResult};

/// Everything needed to localize and rerun a diverging unit.
#[derive(Debug, Clone, Serialize)]
pub struct ReproBundle {
    /// Unit name, `Fixture/Shape/Codec/Op`.
    pub unit: String,
    /// Fixture name.
    pub fixture: String,
    /// Decode target shape.
    pub shape: String,
    /// Codec under test.
    pub codec: String,
    /// Capability slot under test.
    pub op: String,
    /// JSON Pointer of the first divergence.
    pub path: String,
    /// Reference value at that location.
    pub want: String,
    /// Value produced through the codec.
    pub got: String,
}

impl ReproBundle {
    /// Create a bundle from a divergence.
    pub fn new(
        fixture: &str,
        shape: &str,
        codec: &str,
        op: &str,
        divergence: Divergence,
    ) -> Self {
        Self {
            unit: format!("{fixture}/{shape}/{codec}/{op}"),
            fixture: fixture.to_string(),
            shape: shape.to_string(),
            codec: codec.to_string(),
            op: op.to_string(),
            path: divergence.path,
            want: divergence.want,
            got: divergence.got,
        }
    }

    /// Format as a human-readable report.
    pub fn to_report(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        format!(
            r#"=== Divergence Report ===
Unit: {}
Fixture: {}
Shape: {}
Codec: {}
Operation: {}

Path: {}
Want: {}
Got:  {}

To reproduce:
  jsonbench roundtrip --fixture {} --codec {}
"#,
            self.unit,
            self.fixture,
            self.shape,
            self.codec,
            self.op,
            path,
            self.want,
            self.got,
            self.fixture,
            self.codec,
        )
    }

    /// File name for this bundle: the unit name with `/` replaced.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.unit.replace('/', "_"))
    }

    /// Write the bundle as JSON into `dir`, creating it if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> HarnessResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))?;
        let path = dir.join(self.file_name());
        let text = self.to_json().map_err(|e| HarnessError::io(&path, e.into()))?;
        fs::write(&path, text).map_err(|e| HarnessError::io(&path, e))?;
        Ok(path)
    }

    /// Format as JSON for machine parsing.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> ReproBundle {
        ReproBundle::new(
            "CanadaGeometry",
            "Dynamic",
            "IJson",
            "Encode",
            Divergence {
                path: "/features/0/type".to_string(),
                want: "\"Feature\"".to_string(),
                got: "null".to_string(),
            },
        )
    }

    #[test]
    fn test_repro_bundle_report() {
        let report = bundle().to_report();
        assert!(report.contains("Unit: CanadaGeometry/Dynamic/IJson/Encode"));
        assert!(report.contains("Path: /features/0/type"));
        assert!(report.contains("--fixture CanadaGeometry --codec IJson"));
    }

    #[test]
    fn test_repro_bundle_json() {
        let json = bundle().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["unit"], "CanadaGeometry/Dynamic/IJson/Encode");
        assert_eq!(value["want"], "\"Feature\"");
    }

    #[test]
    fn test_repro_bundle_save() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("repro");
        let path = bundle().save(&target).unwrap();
        assert_eq!(path, target.join("CanadaGeometry_Dynamic_IJson_Encode.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["path"], "/features/0/type");
        assert_eq!(value["got"], "null");
    }

    #[test]
    fn test_repro_bundle_save_into_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, "").unwrap();
        let err = bundle().save(&blocker).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }), "{err}");
    }
}
