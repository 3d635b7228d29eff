use crate::{common::*, config::tree::Node, error::Result};

/// The `inference` section. The whole section is optional; the prediction
/// process falls back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inference {
    pub general: InferenceGeneral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceGeneral {
    pub foreground_threshold: f64,
    pub use_original_image_size: bool,
}

impl Default for Inference {
    fn default() -> Self {
        Self {
            general: InferenceGeneral::default(),
        }
    }
}

impl Default for InferenceGeneral {
    fn default() -> Self {
        Self {
            foreground_threshold: 0.5,
            use_original_image_size: false,
        }
    }
}

impl Inference {
    pub(crate) fn bind_opt(node: Option<Node>) -> Result<Self> {
        let node = match node {
            Some(node) => node,
            None => return Ok(Self::default()),
        };
        Ok(Self {
            general: InferenceGeneral::bind_opt(node.child_opt("general")?)?,
        })
    }
}

impl InferenceGeneral {
    fn bind_opt(node: Option<Node>) -> Result<Self> {
        let defaults = Self::default();
        let node = match node {
            Some(node) => node,
            None => return Ok(defaults),
        };
        let foreground_threshold =
            node.float_or("foreground_threshold", defaults.foreground_threshold)?;
        if !(0.0..=1.0).contains(&foreground_threshold) {
            return Err(node.out_of_range(
                "foreground_threshold",
                "a threshold in [0, 1]",
                foreground_threshold,
            ));
        }
        Ok(Self {
            foreground_threshold,
            use_original_image_size: node
                .boolean_or("use_original_image_size", defaults.use_original_image_size)?,
        })
    }
}
