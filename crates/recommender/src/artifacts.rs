//! Artifact configuration and the loaded artifact bundle.
//!
//! Everything the recommender needs is produced at training time and loaded
//! once at startup:
//!
//! ```text
//! <artifacts>/features/<table>.csv     feature tables
//! <artifacts>/encoder.json             one-hot encoder
//! <artifacts>/model.json               boosted tree classifier
//! <artifacts>/label_encoder.json       label vocabulary
//! <artifacts>/features.json            expected feature list
//! <artifacts>/artifacts.json           optional path overrides
//! ```

use crate::error::{RecommendError, Result};
use feature_store::{FEATURE_TABLES, FeatureStore};
use inference::{BoostedTreeClassifier, LabelDecoder, ProbabilityClassifier};
use pipeline::{CategoricalEncoder, FeatureComposer, OneHotEncoder, SchemaAligner, SchemaDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Name of the optional override manifest inside the artifact directory
pub const MANIFEST_FILE: &str = "artifacts.json";

/// Where each artifact lives on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub features_dir: PathBuf,
    pub encoder: PathBuf,
    pub model: PathBuf,
    pub label_decoder: PathBuf,
    pub expected_features: PathBuf,
    pub tables: Vec<String>,
}

/// Partial config read from `artifacts.json`; relative paths resolve
/// against the artifact directory.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ManifestOverrides {
    features_dir: Option<PathBuf>,
    encoder: Option<PathBuf>,
    model: Option<PathBuf>,
    label_decoder: Option<PathBuf>,
    expected_features: Option<PathBuf>,
    tables: Option<Vec<String>>,
}

impl ArtifactConfig {
    /// Default layout under `dir`, ignoring any manifest
    pub fn under(dir: &Path) -> Self {
        Self {
            features_dir: dir.join("features"),
            encoder: dir.join("encoder.json"),
            model: dir.join("model.json"),
            label_decoder: dir.join("label_encoder.json"),
            expected_features: dir.join("features.json"),
            tables: FEATURE_TABLES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Default layout under `dir` with `artifacts.json` applied if present
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut config = Self::under(dir);
        let manifest = dir.join(MANIFEST_FILE);
        if !manifest.exists() {
            return Ok(config);
        }

        let invalid = |reason: String| RecommendError::InvalidConfig {
            path: manifest.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(&manifest).map_err(|e| invalid(e.to_string()))?;
        let overrides: ManifestOverrides =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        let resolve = |path: PathBuf| if path.is_absolute() { path } else { dir.join(path) };
        if let Some(path) = overrides.features_dir {
            config.features_dir = resolve(path);
        }
        if let Some(path) = overrides.encoder {
            config.encoder = resolve(path);
        }
        if let Some(path) = overrides.model {
            config.model = resolve(path);
        }
        if let Some(path) = overrides.label_decoder {
            config.label_decoder = resolve(path);
        }
        if let Some(path) = overrides.expected_features {
            config.expected_features = resolve(path);
        }
        if let Some(tables) = overrides.tables {
            if tables.is_empty() {
                return Err(invalid("tables must not be empty".to_string()));
            }
            config.tables = tables;
        }

        debug!("Applied artifact overrides from {}", manifest.display());
        Ok(config)
    }
}

/// Read the expected feature list: a JSON array of column names
pub fn load_expected_features(path: &Path) -> Result<Vec<String>> {
    let missing = |source: Box<dyn std::error::Error + Send + Sync>| {
        RecommendError::SchemaArtifactMissing {
            artifact: path.display().to_string(),
            source,
        }
    };
    let content = std::fs::read_to_string(path).map_err(|e| missing(Box::new(e)))?;
    serde_json::from_str(&content).map_err(|e| missing(Box::new(e)))
}

/// All fitted artifacts, loaded once and shared read-only across requests
pub struct ArtifactBundle {
    composer: FeatureComposer,
    aligner: SchemaAligner,
    encoder: Box<dyn CategoricalEncoder>,
    classifier: Box<dyn ProbabilityClassifier>,
    labels: LabelDecoder,
}

impl ArtifactBundle {
    /// Assemble a bundle from already-loaded parts.
    ///
    /// Fails with `IncompatibleArtifacts` when the parts disagree: the
    /// classifier width must match the expected feature list, its recorded
    /// feature names (if any) must match it too, and its class count must
    /// match the label vocabulary.
    pub fn new(
        store: Arc<FeatureStore>,
        encoder: Box<dyn CategoricalEncoder>,
        classifier: Box<dyn ProbabilityClassifier>,
        labels: LabelDecoder,
        expected_features: Vec<String>,
    ) -> Result<Self> {
        if expected_features.is_empty() {
            return Err(RecommendError::IncompatibleArtifacts(
                "expected feature list is empty".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(expected_features.len());
        if let Some(dup) = expected_features.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(RecommendError::IncompatibleArtifacts(format!(
                "expected feature {dup} is listed twice"
            )));
        }

        if classifier.num_features() != expected_features.len() {
            return Err(RecommendError::IncompatibleArtifacts(format!(
                "classifier takes {} features but the expected list has {}",
                classifier.num_features(),
                expected_features.len()
            )));
        }
        if let Some(names) = classifier.feature_names() {
            if names != expected_features.as_slice() {
                return Err(RecommendError::IncompatibleArtifacts(
                    "classifier feature names differ from the expected feature list".to_string(),
                ));
            }
        }
        if classifier.num_classes() != labels.len() {
            return Err(RecommendError::IncompatibleArtifacts(format!(
                "classifier has {} classes but the label vocabulary has {}",
                classifier.num_classes(),
                labels.len()
            )));
        }

        let encoded = encoder.feature_names_out();
        let unused = encoded
            .iter()
            .filter(|name| !expected_features.contains(name))
            .count();
        if unused > 0 {
            warn!(
                "{} encoder output columns are not in the expected feature list and will be dropped",
                unused
            );
        }

        let expected = SchemaDescriptor::from_expected_features(&expected_features, &encoded);
        let aligner = SchemaAligner::new(encoder.feature_names_in().to_vec(), expected);

        Ok(Self {
            composer: FeatureComposer::new(store),
            aligner,
            encoder,
            classifier,
            labels,
        })
    }

    /// Load every artifact named by `config`.
    ///
    /// Feature tables and the model files are read in parallel.
    pub fn load(config: &ArtifactConfig) -> Result<Self> {
        let start = Instant::now();
        let tables: Vec<&str> = config.tables.iter().map(String::as_str).collect();

        let (store, model) = rayon::join(
            || FeatureStore::load_tables(&config.features_dir, &tables),
            || -> Result<(BoostedTreeClassifier, LabelDecoder)> {
                let classifier = BoostedTreeClassifier::from_path(&config.model).map_err(
                    |source| RecommendError::ModelArtifactMissing {
                        artifact: config.model.display().to_string(),
                        source,
                    },
                )?;
                let labels = LabelDecoder::from_path(&config.label_decoder).map_err(|source| {
                    RecommendError::ModelArtifactMissing {
                        artifact: config.label_decoder.display().to_string(),
                        source,
                    }
                })?;
                Ok((classifier, labels))
            },
        );
        let store = store?;
        let (classifier, labels) = model?;

        let encoder = OneHotEncoder::from_path(&config.encoder).map_err(|source| {
            RecommendError::SchemaArtifactMissing {
                artifact: config.encoder.display().to_string(),
                source: Box::new(source),
            }
        })?;
        let expected_features = load_expected_features(&config.expected_features)?;

        let bundle = Self::new(
            Arc::new(store),
            Box::new(encoder),
            Box::new(classifier),
            labels,
            expected_features,
        )?;

        let (table_count, row_count) = bundle.composer.store().counts();
        info!(
            "Loaded artifacts in {:.2?}: {} tables ({} rows), {} features, {} dishes",
            start.elapsed(),
            table_count,
            row_count,
            bundle.aligner.expected().len(),
            bundle.labels.len()
        );
        Ok(bundle)
    }

    pub fn composer(&self) -> &FeatureComposer {
        &self.composer
    }

    pub fn aligner(&self) -> &SchemaAligner {
        &self.aligner
    }

    pub fn encoder(&self) -> &dyn CategoricalEncoder {
        self.encoder.as_ref()
    }

    pub fn classifier(&self) -> &dyn ProbabilityClassifier {
        self.classifier.as_ref()
    }

    pub fn labels(&self) -> &LabelDecoder {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_layout() {
        let config = ArtifactConfig::under(Path::new("/srv/artifacts"));
        assert_eq!(config.model, PathBuf::from("/srv/artifacts/model.json"));
        assert_eq!(config.features_dir, PathBuf::from("/srv/artifacts/features"));
        assert_eq!(config.tables.len(), FEATURE_TABLES.len());
    }

    #[test]
    fn test_manifest_overrides_resolve_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"model": "v2/model.json", "tables": ["cuisine_features"]}"#,
        )
        .unwrap();

        let config = ArtifactConfig::from_dir(dir.path()).unwrap();
        assert_eq!(config.model, dir.path().join("v2/model.json"));
        assert_eq!(config.encoder, dir.path().join("encoder.json"));
        assert_eq!(config.tables, vec!["cuisine_features".to_string()]);
    }

    #[test]
    fn test_malformed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), r#"{"modle": "x.json"}"#).unwrap();

        assert!(matches!(
            ArtifactConfig::from_dir(dir.path()),
            Err(RecommendError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_missing_expected_features() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_expected_features(&dir.path().join("features.json")),
            Err(RecommendError::SchemaArtifactMissing { .. })
        ));
    }
}
