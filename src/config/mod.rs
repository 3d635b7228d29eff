//! Run-configuration schema and the JSONC binder.
//!
//! The document format is JSON extended with `//` comments and trailing
//! commas; [`json5`] accepts both. Parsing yields a generic tree which is
//! then bound against the static schema in a single recursive descent:
//! required keys must be present, optional keys fall back to their schema
//! defaults, keyword fields match a fixed allowed set and numeric fields
//! are range-checked. Binding has no side effects; it neither logs nor
//! touches the filesystem beyond reading the document.

mod data;
mod environment;
mod inference;
mod training;
mod tree;

pub use data::{Augmentations, DataCollection, DatasetKind, DatasetParams, DatasetSelection};
pub use environment::Environment;
pub use inference::{Inference, InferenceGeneral};
pub use training::{
    DeconvHead, Loss, LossFunction, LossType, LrScheduler, Model, ModelName, Optimizer,
    OptimizerName, ResnetBackbone, ResnetModel, Training, TrainingGeneral,
};

use crate::{common::*, error::Result};
use tree::Node;

/// One fully validated run configuration.
///
/// Constructed once at process start by [`Config::open`], immutable
/// afterwards, and safe to share between any number of readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub environment: Environment,
    pub data_collection: DataCollection,
    pub training: Training,
    pub inference: Inference,
}

impl Config {
    /// Reads and binds a JSONC configuration file.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        Self::from_jsonc(&text)
    }

    /// Binds a JSONC document already held in memory.
    pub fn from_jsonc(text: &str) -> Result<Self> {
        let document: Value = json5::from_str(text)?;
        let root = Node::root(&document)?;

        Ok(Self {
            environment: Environment::bind(&root.child("environment")?)?,
            data_collection: DataCollection::bind(&root.child("data_collection")?)?,
            training: Training::bind(&root.child("training")?)?,
            inference: Inference::bind_opt(root.child_opt("inference")?)?,
        })
    }
}
