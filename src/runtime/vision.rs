use crate::dsl::Rect;
use crate::runtime::pipeline::PipelineOverride;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 一帧截图 (对解释器不透明)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl Frame {
    pub fn new(seq: u64) -> Self {
        Self {
            seq,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Algorithm {
    /// 无需视觉确认，总是命中
    DirectHit,
    #[default]
    TemplateMatch,
    FeatureMatch,
    ColorMatch,
    #[serde(rename = "OCR")]
    Ocr,
    NeuralNetworkClassify,
    NeuralNetworkDetect,
    Custom,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecoDetail {
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default, rename = "box")]
    pub bbox: Option<Rect>,
    #[serde(default)]
    pub text: Option<String>,
}

impl RecoDetail {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            algorithm: Algorithm::Ocr,
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// 识别结果三态；`Error` 在解释器中等同于未命中
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Hit(RecoDetail),
    Miss(RecoDetail),
    Error(String),
}

impl Recognition {
    pub fn hit() -> Self {
        Recognition::Hit(RecoDetail::default())
    }

    pub fn miss() -> Self {
        Recognition::Miss(RecoDetail::default())
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Recognition::Hit(_))
    }

    /// A normal hit, or a miss reported by the always-matching algorithm.
    pub fn accepts(&self) -> bool {
        match self {
            Recognition::Hit(_) => true,
            Recognition::Miss(detail) => detail.algorithm == Algorithm::DirectHit,
            Recognition::Error(_) => false,
        }
    }
}

/// 视觉子系统：截图 + 按名称识别
#[async_trait]
pub trait Vision: Send + Sync {
    async fn capture(&self) -> Result<Frame>;

    /// Last captured frame, if the controller keeps one.
    fn cached_frame(&self) -> Option<Frame>;

    async fn recognize(
        &self,
        name: &str,
        frame: &Frame,
        overrides: Option<&PipelineOverride>,
    ) -> Recognition;
}
