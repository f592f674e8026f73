//! Experiment configuration injected by the bootstrap layer
//!
//! The dataset layout (data root, split files, sampling limits) is decided
//! once at startup and passed down explicitly. Nothing in this library
//! consults hostnames, environment variables, or other ambient process
//! state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Limits applied when subsampling training/testing sequence lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleLimits {
    /// When set, training is restricted to `max_sequences` sequences
    pub small_sample: bool,
    pub max_sequences: usize,
    pub max_test_sequences: usize,
    /// Worker threads the orchestration layer may use
    pub cores: usize,
}

impl Default for SampleLimits {
    fn default() -> Self {
        Self {
            small_sample: true,
            max_sequences: 500,
            max_test_sequences: 8,
            cores: 8,
        }
    }
}

impl SampleLimits {
    /// Truncate a training sequence list according to the limits
    pub fn apply_train<T>(&self, mut sequences: Vec<T>) -> Vec<T> {
        if self.small_sample {
            sequences.truncate(self.max_sequences);
        }
        sequences
    }

    /// Truncate a test sequence list according to the limits
    pub fn apply_test<T>(&self, mut sequences: Vec<T>) -> Vec<T> {
        sequences.truncate(self.max_test_sequences);
        sequences
    }
}

/// One entry of a train/test split file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSpec {
    /// Scene directory name under the raw data root
    pub scene: String,
    /// Folder the scene was captured into
    pub folder: PathBuf,
    /// Frame numbers used from this scene
    pub frames: Vec<u32>,
    /// Unique name for this sequence, usually scene + frames
    pub name: String,
}

/// Dataset layout for one experiment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Root of the dataset on disk
    pub data_root: PathBuf,
    /// Split files listing training sequences
    pub train_split_files: Vec<PathBuf>,
    /// Split file listing test sequences
    pub test_split_file: PathBuf,
    pub limits: SampleLimits,
}

impl ExperimentConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        let splits = data_root.join("train_test");
        Self {
            train_split_files: vec![splits.join("train.yaml"), splits.join("train2.yaml")],
            test_split_file: splits.join("test.yaml"),
            data_root,
            limits: SampleLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SampleLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Directory holding the raw per-scene captures
    pub fn raw_data_dir(&self) -> PathBuf {
        self.data_root.join("data2")
    }

    /// Directory of one captured scene
    pub fn scene_dir(&self, scene: &str) -> PathBuf {
        self.raw_data_dir().join(scene)
    }

    /// Directory for everything belonging to a named model
    pub fn models_dir(&self, model_name: &str) -> PathBuf {
        self.data_root.join("models").join(model_name)
    }

    /// Serialized model file for a named model
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models_dir(model_name).join("model.bin")
    }

    /// Directory for features extracted from training scenes
    pub fn training_features_dir(&self, model_name: &str) -> PathBuf {
        self.models_dir(model_name).join("training_features")
    }

    /// Directory holding predictions for one test batch and sequence
    pub fn prediction_dir(&self, batch: &str, sequence: &str) -> PathBuf {
        self.data_root.join("predictions").join(batch).join(sequence)
    }

    /// Score summary file for one test batch and sequence
    pub fn scores_path(&self, batch: &str, sequence: &str) -> PathBuf {
        self.prediction_dir(batch, sequence).join("scores.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_limit_only_when_small_sample() {
        let mut limits = SampleLimits {
            small_sample: true,
            max_sequences: 2,
            max_test_sequences: 1,
            cores: 1,
        };
        assert_eq!(limits.apply_train(vec![1, 2, 3, 4]), vec![1, 2]);
        limits.small_sample = false;
        assert_eq!(limits.apply_train(vec![1, 2, 3, 4]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_test_limit_always_applies() {
        let limits = SampleLimits {
            small_sample: false,
            max_sequences: 100,
            max_test_sequences: 2,
            cores: 1,
        };
        assert_eq!(limits.apply_test(vec!["a", "b", "c"]), vec!["a", "b"]);
    }

    #[test]
    fn test_paths_derive_from_data_root() {
        let config = ExperimentConfig::new("/data/house");
        assert_eq!(config.raw_data_dir(), PathBuf::from("/data/house/data2"));
        assert_eq!(
            config.model_path("oma"),
            PathBuf::from("/data/house/models/oma/model.bin")
        );
        assert_eq!(
            config.scores_path("batch1", "kitchen_4"),
            PathBuf::from("/data/house/predictions/batch1/kitchen_4/scores.yaml")
        );
    }
}
