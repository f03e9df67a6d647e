// 该文件是 Quyu （区域提取） 项目的一部分。
// src/model.rs - 目标检测器接口与后端
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, detection::Batch, frame::RgbNchwFrame};

/// 前景检测等未分类区域使用的保留类别
pub const BACKGROUND_LABEL: u32 = 0;
pub const PERSON_LABEL: u32 = 1;

/// torchvision 检测模型使用的 COCO 类别表，下标即类别编号
pub const COCO_CATEGORIES: [&str; 91] = [
  "__background__",
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "N/A",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "N/A",
  "backpack",
  "umbrella",
  "N/A",
  "N/A",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "N/A",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "N/A",
  "dining table",
  "N/A",
  "N/A",
  "toilet",
  "N/A",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "N/A",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

pub fn coco_label_name(label: u32) -> &'static str {
  COCO_CATEGORIES
    .get(label as usize)
    .copied()
    .unwrap_or("unknown")
}

/// 目标检测器。
///
/// 对一批帧做一次推理，每帧返回一个检测集合；掩码尺寸必须与对应帧一致。
/// 置信度阈值与候选框抑制由检测器自行处理。
pub trait Detector {
  type Error;

  fn detect(&self, frames: &[RgbNchwFrame]) -> Result<Batch, Self::Error>;
}

mod empty;
mod fixture;
pub use self::empty::EmptyDetector;
pub use self::fixture::{FixtureDetector, FixtureDetectorError, FixtureItem};

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("固定检测结果错误: {0}")]
  Fixture(#[from] FixtureDetectorError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 按 URL 方案选择检测后端
pub struct DetectorBuilder {
  url: Url,
  box_score_thresh: f32,
}

impl FromUrl for DetectorBuilder {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      EmptyDetector::SCHEME | FixtureDetector::SCHEME => Ok(DetectorBuilder {
        url: url.clone(),
        box_score_thresh: crate::config::DEFAULT_BOX_SCORE_THRESH,
      }),
      other => Err(DetectorError::SchemeMismatch(other.to_string())),
    }
  }
}

impl DetectorBuilder {
  pub fn box_score_thresh(mut self, box_score_thresh: f32) -> Self {
    self.box_score_thresh = box_score_thresh;
    self
  }

  pub fn build(self) -> Result<DetectorWrapper, DetectorError> {
    info!("创建检测后端: {}", self.url);
    match self.url.scheme() {
      EmptyDetector::SCHEME => Ok(DetectorWrapper::Empty(EmptyDetector)),
      FixtureDetector::SCHEME => {
        let detector = FixtureDetector::from_url(&self.url)?.with_box_score_thresh(self.box_score_thresh);
        Ok(DetectorWrapper::Fixture(detector))
      }
      other => Err(DetectorError::SchemeMismatch(other.to_string())),
    }
  }
}

pub enum DetectorWrapper {
  Empty(EmptyDetector),
  Fixture(FixtureDetector),
}

impl Detector for DetectorWrapper {
  type Error = DetectorError;

  fn detect(&self, frames: &[RgbNchwFrame]) -> Result<Batch, Self::Error> {
    match self {
      DetectorWrapper::Empty(detector) => match detector.detect(frames) {
        Ok(batch) => Ok(batch),
        Err(never) => match never {},
      },
      DetectorWrapper::Fixture(detector) => detector.detect(frames).map_err(DetectorError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_label_names() {
    assert_eq!(coco_label_name(BACKGROUND_LABEL), "__background__");
    assert_eq!(coco_label_name(PERSON_LABEL), "person");
    assert_eq!(coco_label_name(90), "toothbrush");
    assert_eq!(coco_label_name(1000), "unknown");
  }

  #[test]
  fn test_builder_rejects_unknown_scheme() {
    let url = Url::parse("rknn:///model.rknn").unwrap();
    assert!(matches!(
      DetectorBuilder::from_url(&url),
      Err(DetectorError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn test_empty_backend_from_url() {
    let url = Url::parse("none://").unwrap();
    let detector = DetectorBuilder::from_url(&url).unwrap().build().unwrap();
    let frames = vec![RgbNchwFrame::with_shape(4, 4); 2];
    let batch = detector.detect(&frames).unwrap();
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|set| set.is_empty()));
  }
}
