//! The `data_collection` section: dataset selection and augmentation knobs.

use crate::{common::*, config::tree::Node, error::Result};

/// Recognized training datasets. Each selected dataset must come with its
/// own `<name>_params` block in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DatasetKind {
    #[serde(rename = "h36m")]
    H36m,
    #[serde(rename = "mpii")]
    Mpii,
    #[serde(rename = "mpii_3dhp")]
    Mpii3dhp,
    #[serde(rename = "jta")]
    Jta,
}

impl DatasetKind {
    pub const KEYWORDS: &'static [&'static str] = &["h36m", "mpii", "mpii_3dhp", "jta"];

    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "h36m" => Some(Self::H36m),
            "mpii" => Some(Self::Mpii),
            "mpii_3dhp" => Some(Self::Mpii3dhp),
            "jta" => Some(Self::Jta),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::H36m => "h36m",
            Self::Mpii => "mpii",
            Self::Mpii3dhp => "mpii_3dhp",
            Self::Jta => "jta",
        }
    }

    fn params_key(&self) -> String {
        format!("{}_params", self.as_keyword())
    }
}

/// Per-dataset split names and dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetParams {
    pub train_set: String,
    pub val_set: String,
    pub num_joints: NonZeroUsize,
    pub num_cameras: NonZeroUsize,
}

impl DatasetParams {
    fn bind(node: &Node) -> Result<Self> {
        Ok(Self {
            train_set: node.string("train_set")?,
            val_set: node.string("val_set")?,
            num_joints: node.positive_int("num_joints")?,
            num_cameras: node.positive_int("num_cameras")?,
        })
    }
}

/// One selected dataset together with its bound parameter block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSelection {
    pub kind: DatasetKind,
    pub params: DatasetParams,
}

/// Randomized input transformations applied during training.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Augmentations {
    pub scale_factor: f64,
    pub rotation_factor: f64,
    pub color_factor: f64,
    pub random_flip: bool,
}

impl Default for Augmentations {
    fn default() -> Self {
        Self {
            scale_factor: 0.25,
            rotation_factor: 30.0,
            color_factor: 0.2,
            random_flip: true,
        }
    }
}

impl Augmentations {
    fn bind_opt(node: Option<Node>) -> Result<Self> {
        let defaults = Self::default();
        let node = match node {
            Some(node) => node,
            None => return Ok(defaults),
        };
        Ok(Self {
            scale_factor: node.nonnegative_float_or("scale_factor", defaults.scale_factor)?,
            rotation_factor: node.nonnegative_float_or("rotation_factor", defaults.rotation_factor)?,
            color_factor: node.nonnegative_float_or("color_factor", defaults.color_factor)?,
            random_flip: node.boolean_or("random_flip", defaults.random_flip)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataCollection {
    pub folder: PathBuf,
    pub datasets: Vec<DatasetSelection>,
    pub augmentations: Augmentations,
    /// Input patch size as `[width, height]`.
    pub image_size: [NonZeroUsize; 2],
    pub z_weight: f64,
}

impl DataCollection {
    pub(crate) fn bind(node: &Node) -> Result<Self> {
        let kinds = node.keyword_seq("dataset", DatasetKind::KEYWORDS, DatasetKind::from_keyword)?;
        if kinds.is_empty() {
            return Err(node.out_of_range("dataset", "a non-empty list of dataset names", "[]"));
        }
        if let Some(kind) = kinds.iter().duplicates().next() {
            return Err(node.inconsistent(
                "dataset",
                format!("dataset \"{}\" is listed more than once", kind.as_keyword()),
            ));
        }

        let datasets = kinds
            .into_iter()
            .map(|kind| {
                let key = kind.params_key();
                let params_node = node.child_opt(&key)?.ok_or_else(|| {
                    node.inconsistent(
                        &key,
                        format!("selected by `dataset` entry \"{}\" but absent", kind.as_keyword()),
                    )
                })?;
                Ok(DatasetSelection {
                    kind,
                    params: DatasetParams::bind(&params_node)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let image_size = node.positive_int_seq("image_size", Some(2))?;

        Ok(Self {
            folder: node.path_buf("folder")?,
            datasets,
            augmentations: Augmentations::bind_opt(node.child_opt("augmentations")?)?,
            image_size: [image_size[0], image_size[1]],
            z_weight: node.float_or("z_weight", 1.0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::tree::Node, error::ConfigError};

    fn bind(text: &str) -> crate::error::Result<DataCollection> {
        let doc: Value = json5::from_str(text).unwrap();
        DataCollection::bind(&Node::root(&doc).unwrap())
    }

    const MINIMAL: &str = r#"{
        folder: "data",
        dataset: ["h36m"],
        h36m_params: { train_set: "train", val_set: "valid", num_joints: 18, num_cameras: 4 },
        image_size: [256, 256],
    }"#;

    #[test]
    fn binds_minimal_section_with_defaults() {
        let data = bind(MINIMAL).unwrap();
        assert_eq!(data.datasets.len(), 1);
        assert_eq!(data.datasets[0].kind, DatasetKind::H36m);
        assert_eq!(data.datasets[0].params.num_joints.get(), 18);
        assert_eq!(data.augmentations, Augmentations::default());
        assert_eq!(data.z_weight, 1.0);
        assert_eq!(data.image_size[0].get(), 256);
    }

    #[test]
    fn image_size_must_be_a_pair() {
        let err = bind(
            r#"{
                folder: "data",
                dataset: ["h36m"],
                h36m_params: { train_set: "train", val_set: "valid", num_joints: 18, num_cameras: 4 },
                image_size: [256],
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("image_size"));
    }

    #[test]
    fn selected_dataset_requires_its_params_block() {
        let err = bind(
            r#"{
                folder: "data",
                dataset: ["h36m", "mpii"],
                h36m_params: { train_set: "train", val_set: "valid", num_joints: 18, num_cameras: 4 },
                image_size: [256, 256],
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Consistency { .. }));
        assert_eq!(err.path(), Some("mpii_params"));
    }

    #[test]
    fn duplicate_dataset_entries_are_rejected() {
        let err = bind(
            r#"{
                folder: "data",
                dataset: ["h36m", "h36m"],
                h36m_params: { train_set: "train", val_set: "valid", num_joints: 18, num_cameras: 4 },
                image_size: [256, 256],
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Consistency { .. }));
    }

    #[test]
    fn unknown_dataset_name_is_indexed() {
        let err = bind(
            r#"{
                folder: "data",
                dataset: ["h36m", "coco"],
                h36m_params: { train_set: "train", val_set: "valid", num_joints: 18, num_cameras: 4 },
                image_size: [256, 256],
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("dataset[1]"));
    }

    #[test]
    fn negative_augmentation_factor_is_rejected() {
        let err = bind(
            r#"{
                folder: "data",
                dataset: ["h36m"],
                h36m_params: { train_set: "train", val_set: "valid", num_joints: 18, num_cameras: 4 },
                augmentations: { scale_factor: -0.25 },
                image_size: [256, 256],
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("augmentations.scale_factor"));
    }
}
