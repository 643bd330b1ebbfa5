use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};
use crate::vectorizer::lsi::LsiOptions;

/// Artifact directory used when none is given: `models/` beside the crate manifest
pub fn default_directory() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models")
}

/// Identity and parameters of a topic model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base name of every artifact file
    pub name: String,

    /// Directory holding the artifacts; fixed for the model's lifetime
    pub directory: PathBuf,

    /// Number of LSI topics
    pub dimensions: usize,

    /// Minimum document frequency kept by the standalone dictionary step
    pub min_count: u64,

    /// Maximum document frequency kept, as a share of all documents
    pub max_ratio: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            directory: default_directory(),
            dimensions: 200,
            min_count: 5,
            max_ratio: 1.0,
        }
    }
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn with_max_ratio(mut self, max_ratio: f64) -> Self {
        self.max_ratio = max_ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TopicError::InvalidConfig("model name must not be empty".into()));
        }
        if self.name.contains(|c: char| c == '/' || c == '\\') {
            return Err(TopicError::InvalidConfig(format!("model name {:?} must not contain a path separator", self.name)));
        }
        if self.dimensions == 0 {
            return Err(TopicError::InvalidConfig("dimensions must be positive".into()));
        }
        check_max_ratio(self.max_ratio)
    }
}

/// Pruning share must be a positive number
pub(crate) fn check_max_ratio(max_ratio: f64) -> Result<()> {
    if max_ratio.is_nan() || max_ratio <= 0.0 {
        return Err(TopicError::InvalidConfig(format!("max_ratio must be positive, got {}", max_ratio)));
    }
    Ok(())
}

/// Knobs of the composite `Model::train`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainOptions {
    /// Minimum document frequency; 0 keeps every lemma
    pub min_count: u64,

    /// Maximum document frequency as a share of all documents; 1.0 keeps every lemma
    pub max_ratio: f64,

    /// Keep the plain and TF-IDF corpora after training
    pub keep_temp_files: bool,

    pub lsi: LsiOptions,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            min_count: 3,
            max_ratio: 1.0,
            keep_temp_files: false,
            lsi: LsiOptions::default(),
        }
    }
}

impl TrainOptions {
    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn with_max_ratio(mut self, max_ratio: f64) -> Self {
        self.max_ratio = max_ratio;
        self
    }

    pub fn keep_temp_files(mut self, keep: bool) -> Self {
        self.keep_temp_files = keep;
        self
    }

    pub fn with_lsi(mut self, lsi: LsiOptions) -> Self {
        self.lsi = lsi;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_max_ratio(self.max_ratio)
    }
}
