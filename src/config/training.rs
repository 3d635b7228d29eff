//! The `training` section: loop parameters, model architecture, optimizer,
//! loss and learning-rate schedule.

use crate::{
    common::*,
    config::tree::Node,
    error::Result,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Training {
    pub general: TrainingGeneral,
    pub model: Model,
    pub optimizer: Optimizer,
    pub loss: Loss,
    pub lr_scheduler: LrScheduler,
}

impl Training {
    pub(crate) fn bind(node: &Node) -> Result<Self> {
        Ok(Self {
            general: TrainingGeneral::bind(&node.child("general")?)?,
            model: Model::bind(&node.child("model")?)?,
            optimizer: Optimizer::bind(&node.child("optimizer")?)?,
            loss: Loss::bind(&node.child("loss")?)?,
            lr_scheduler: LrScheduler::bind(&node.child("lr_scheduler")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingGeneral {
    pub batch_size: NonZeroUsize,
    pub num_epochs: NonZeroUsize,
    pub checkpoint_save_interval: NonZeroUsize,
    pub num_workers: NonZeroUsize,
    pub shuffle_data: bool,
    pub log_to_comet: bool,
}

impl TrainingGeneral {
    fn bind(node: &Node) -> Result<Self> {
        Ok(Self {
            batch_size: node.positive_int("batch_size")?,
            num_epochs: node.positive_int("num_epochs")?,
            checkpoint_save_interval: node.positive_int("checkpoint_save_interval")?,
            num_workers: node.positive_int("num_workers")?,
            shuffle_data: node.boolean_or("shuffle_data", true)?,
            log_to_comet: node.boolean_or("log_to_comet", false)?,
        })
    }
}

/// Known pose-estimation architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelName {
    #[serde(rename = "ResPoseNet_DeconvHead")]
    ResPoseNetDeconvHead,
    #[serde(rename = "IntegralPoseRegressionModel")]
    IntegralPoseRegression,
    #[serde(rename = "PoseAlexNetReg")]
    PoseAlexNetReg,
}

impl ModelName {
    pub const KEYWORDS: &'static [&'static str] = &[
        "ResPoseNet_DeconvHead",
        "IntegralPoseRegressionModel",
        "PoseAlexNetReg",
    ];

    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "ResPoseNet_DeconvHead" => Some(Self::ResPoseNetDeconvHead),
            "IntegralPoseRegressionModel" => Some(Self::IntegralPoseRegression),
            "PoseAlexNetReg" => Some(Self::PoseAlexNetReg),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::ResPoseNetDeconvHead => "ResPoseNet_DeconvHead",
            Self::IntegralPoseRegression => "IntegralPoseRegressionModel",
            Self::PoseAlexNetReg => "PoseAlexNetReg",
        }
    }

    /// The ResNet-backed architectures need a backbone and a deconvolution
    /// head; the AlexNet regressor needs neither.
    pub fn uses_resnet_backbone(&self) -> bool {
        match self {
            Self::ResPoseNetDeconvHead | Self::IntegralPoseRegression => true,
            Self::PoseAlexNetReg => false,
        }
    }
}

/// ResNet backbone variants, mirroring the torchvision family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResnetModel {
    #[serde(rename = "resnet18")]
    Resnet18,
    #[serde(rename = "resnet34")]
    Resnet34,
    #[serde(rename = "resnet50")]
    Resnet50,
    #[serde(rename = "resnet101")]
    Resnet101,
    #[serde(rename = "resnet152")]
    Resnet152,
}

impl ResnetModel {
    pub const KEYWORDS: &'static [&'static str] =
        &["resnet18", "resnet34", "resnet50", "resnet101", "resnet152"];

    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "resnet18" => Some(Self::Resnet18),
            "resnet34" => Some(Self::Resnet34),
            "resnet50" => Some(Self::Resnet50),
            "resnet101" => Some(Self::Resnet101),
            "resnet152" => Some(Self::Resnet152),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Resnet18 => "resnet18",
            Self::Resnet34 => "resnet34",
            Self::Resnet50 => "resnet50",
            Self::Resnet101 => "resnet101",
            Self::Resnet152 => "resnet152",
        }
    }

    fn params_key(&self) -> String {
        format!("{}_params", self.as_keyword())
    }
}

/// Backbone parameters bound from the one `<resnet_model>_params` block the
/// `resnet_model` field selects. Unselected blocks stay inert in the
/// document and are never bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResnetBackbone {
    pub model: ResnetModel,
    /// Residual block counts, one per stage.
    pub layers: [NonZeroUsize; 4],
    /// Channel widths: the stem plus one per stage.
    pub channels: [NonZeroUsize; 5],
}

impl ResnetBackbone {
    fn bind(node: &Node, model: ResnetModel) -> Result<Self> {
        let key = model.params_key();
        let params = node.child_opt(&key)?.ok_or_else(|| {
            node.inconsistent(
                &key,
                format!(
                    "selected by `resnet_model = \"{}\"` but absent",
                    model.as_keyword()
                ),
            )
        })?;
        Ok(Self {
            model,
            layers: stage_seq(&params, "layers")?,
            channels: stage_seq(&params, "channels")?,
        })
    }
}

// A wrong stage count contradicts the fixed architecture family, which
// makes it a consistency error rather than a plain validation error.
fn stage_seq<const N: usize>(params: &Node, key: &str) -> Result<[NonZeroUsize; N]> {
    let items = params.positive_int_seq(key, None)?;
    match <[NonZeroUsize; N]>::try_from(items) {
        Ok(stages) => Ok(stages),
        Err(items) => Err(params.inconsistent(
            key,
            format!("expected {} stage entries, found {}", N, items.len()),
        )),
    }
}

/// Upsampling head converting backbone features into joint heatmaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeconvHead {
    pub num_layers: NonZeroUsize,
    pub num_filters: NonZeroUsize,
    /// Transposed-convolution kernel size; the 2x upsampling layer only
    /// supports 2, 3 or 4.
    pub kernel_size: NonZeroUsize,
    /// Depth resolution of the 3D heatmap volume.
    pub depth_dim: NonZeroUsize,
}

impl DeconvHead {
    fn bind(node: &Node) -> Result<Self> {
        let kernel_size = node.positive_int("kernel_size")?;
        if !matches!(kernel_size.get(), 2..=4) {
            return Err(node.out_of_range("kernel_size", "one of 2, 3 or 4", kernel_size));
        }
        Ok(Self {
            num_layers: node.positive_int("num_deconv_layers")?,
            num_filters: node.positive_int("num_deconv_filters")?,
            kernel_size,
            depth_dim: node.positive_int("depth_dim")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub name: ModelName,
    pub num_joints: NonZeroUsize,
    /// Present for the ResNet-backed architectures only.
    pub backbone: Option<ResnetBackbone>,
    pub deconv_head: Option<DeconvHead>,
}

impl Model {
    pub(crate) fn bind(node: &Node) -> Result<Self> {
        let name = node.keyword("name", ModelName::KEYWORDS, ModelName::from_keyword)?;

        let resnet = node.keyword_opt("resnet_model", ResnetModel::KEYWORDS, ResnetModel::from_keyword)?;
        let backbone = match resnet {
            Some(model) => Some(ResnetBackbone::bind(node, model)?),
            None if name.uses_resnet_backbone() => return Err(node.missing("resnet_model")),
            None => None,
        };
        let deconv_head = if name.uses_resnet_backbone() {
            Some(DeconvHead::bind(node)?)
        } else {
            None
        };

        Ok(Self {
            name,
            num_joints: node.positive_int("num_joints")?,
            backbone,
            deconv_head,
        })
    }
}

/// Known optimizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptimizerName {
    #[serde(rename = "adam")]
    Adam,
    #[serde(rename = "adamW")]
    AdamW,
    #[serde(rename = "sgd")]
    Sgd,
}

impl OptimizerName {
    pub const KEYWORDS: &'static [&'static str] = &["adam", "adamW", "sgd"];

    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "adam" => Some(Self::Adam),
            "adamW" => Some(Self::AdamW),
            "sgd" => Some(Self::Sgd),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Adam => "adam",
            Self::AdamW => "adamW",
            Self::Sgd => "sgd",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimizer {
    pub name: OptimizerName,
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
}

impl Optimizer {
    fn bind(node: &Node) -> Result<Self> {
        let lr = node.float("lr")?;
        if lr <= 0.0 {
            return Err(node.out_of_range("lr", "a positive learning rate", lr));
        }
        Ok(Self {
            name: node.keyword("name", OptimizerName::KEYWORDS, OptimizerName::from_keyword)?,
            lr,
            beta1: momentum_beta(node, "beta1", 0.9)?,
            beta2: momentum_beta(node, "beta2", 0.999)?,
        })
    }
}

fn momentum_beta(node: &Node, key: &str, default: f64) -> Result<f64> {
    let value = node.float_or(key, default)?;
    if value <= 0.0 || value >= 1.0 {
        return Err(node.out_of_range(key, "a value strictly between 0 and 1", value));
    }
    Ok(value)
}

/// Known loss functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LossFunction {
    #[serde(rename = "L1JointRegressionLoss")]
    L1JointRegression,
    #[serde(rename = "L1JointRegressionLoss_eth_code")]
    L1JointRegressionEth,
}

impl LossFunction {
    pub const KEYWORDS: &'static [&'static str] =
        &["L1JointRegressionLoss", "L1JointRegressionLoss_eth_code"];

    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "L1JointRegressionLoss" => Some(Self::L1JointRegression),
            "L1JointRegressionLoss_eth_code" => Some(Self::L1JointRegressionEth),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::L1JointRegression => "L1JointRegressionLoss",
            Self::L1JointRegressionEth => "L1JointRegressionLoss_eth_code",
        }
    }
}

/// Batch reduction applied to the per-sample losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LossType {
    #[serde(rename = "mean")]
    Mean,
    #[serde(rename = "sum")]
    Sum,
}

impl LossType {
    pub const KEYWORDS: &'static [&'static str] = &["mean", "sum"];

    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "mean" => Some(Self::Mean),
            "sum" => Some(Self::Sum),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loss {
    pub loss_function: LossFunction,
    pub norm: bool,
    pub loss_type: LossType,
    pub output_3d: bool,
}

impl Loss {
    fn bind(node: &Node) -> Result<Self> {
        Ok(Self {
            loss_function: node.keyword(
                "loss_function",
                LossFunction::KEYWORDS,
                LossFunction::from_keyword,
            )?,
            norm: node.boolean_or("norm", false)?,
            loss_type: node.keyword("loss_type", LossType::KEYWORDS, LossType::from_keyword)?,
            output_3d: node.boolean_or("output_3d", true)?,
        })
    }
}

/// Learning-rate schedule, bound as a tagged variant: the `name` field
/// selects which `<name>_params` block is read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LrScheduler {
    #[serde(rename = "stepLR")]
    StepLr { step_size: NonZeroUsize, gamma: f64 },
    #[serde(rename = "multiStepLR")]
    MultiStepLr {
        milestones: Vec<NonZeroUsize>,
        gamma: f64,
    },
}

enum SchedulerName {
    Step,
    MultiStep,
}

impl LrScheduler {
    pub const KEYWORDS: &'static [&'static str] = &["stepLR", "multiStepLR"];

    pub(crate) fn bind(node: &Node) -> Result<Self> {
        let name = node.keyword("name", Self::KEYWORDS, |text| match text {
            "stepLR" => Some(SchedulerName::Step),
            "multiStepLR" => Some(SchedulerName::MultiStep),
            _ => None,
        })?;

        match name {
            SchedulerName::Step => {
                let params = Self::params_block(node, "stepLR")?;
                Ok(Self::StepLr {
                    step_size: params.positive_int("step_size")?,
                    gamma: decay_gamma(&params)?,
                })
            }
            SchedulerName::MultiStep => {
                let params = Self::params_block(node, "multiStepLR")?;
                let milestones = params.positive_int_seq("milestones", None)?;
                if milestones.is_empty() {
                    return Err(params.out_of_range(
                        "milestones",
                        "a non-empty list of epoch numbers",
                        "[]",
                    ));
                }
                if !milestones.iter().tuple_windows().all(|(a, b)| a < b) {
                    return Err(params.out_of_range(
                        "milestones",
                        "strictly increasing epoch numbers",
                        format!("{:?}", milestones.iter().map(|m| m.get()).collect::<Vec<_>>()),
                    ));
                }
                Ok(Self::MultiStepLr {
                    milestones,
                    gamma: decay_gamma(&params)?,
                })
            }
        }
    }

    fn params_block<'a>(node: &Node<'a>, name: &str) -> Result<Node<'a>> {
        let key = format!("{}_params", name);
        node.child_opt(&key)?
            .ok_or_else(|| node.inconsistent(&key, format!("selected by `name = \"{}\"` but absent", name)))
    }
}

fn decay_gamma(params: &Node) -> Result<f64> {
    let gamma = params.float("gamma")?;
    if gamma <= 0.0 || gamma > 1.0 {
        return Err(params.out_of_range("gamma", "a decay factor in (0, 1]", gamma));
    }
    Ok(gamma)
}
