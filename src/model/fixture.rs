// 该文件是 Quyu （区域提取） 项目的一部分。
// src/model/fixture.rs - 固定检测结果后端
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  config::DEFAULT_BOX_SCORE_THRESH,
  detection::{Batch, DetectionSet},
  frame::RgbNchwFrame,
  geometry::{BBox, boxes_to_mask},
  model::Detector,
};

#[derive(Error, Debug)]
pub enum FixtureDetectorError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch { expected: String, actual: String },
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 固定检测结果文件中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureItem {
  /// [x_min, y_min, x_max, y_max]，像素坐标
  pub bbox: [f32; 4],
  pub label: u32,
  pub score: f32,
}

/// 从 JSON 文件读取检测结果，对每一帧返回相同的检测。
/// 掩码由检测框栅格化得到。
#[derive(Debug, Clone)]
pub struct FixtureDetector {
  items: Vec<FixtureItem>,
  box_score_thresh: f32,
}

impl FromUrlWithScheme for FixtureDetector {
  const SCHEME: &'static str = "fixture";
}

impl FromUrl for FixtureDetector {
  type Error = FixtureDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(FixtureDetectorError::SchemeMismatch {
        expected: Self::SCHEME.to_string(),
        actual: url.scheme().to_string(),
      });
    }

    info!("加载固定检测结果: {}", url.path());
    let data = std::fs::read_to_string(url.path())?;
    let items: Vec<FixtureItem> = serde_json::from_str(&data)?;
    debug!("固定检测结果数量: {}", items.len());

    Ok(FixtureDetector::new(items))
  }
}

impl FixtureDetector {
  pub fn new(items: Vec<FixtureItem>) -> Self {
    Self {
      items,
      box_score_thresh: DEFAULT_BOX_SCORE_THRESH,
    }
  }

  pub fn with_box_score_thresh(mut self, box_score_thresh: f32) -> Self {
    self.box_score_thresh = box_score_thresh;
    self
  }

  fn detect_one(&self, frame: &RgbNchwFrame) -> DetectionSet {
    let (height, width) = (frame.height(), frame.width());
    let mut detections = DetectionSet::new();
    for item in self.items.iter().filter(|item| item.score >= self.box_score_thresh) {
      let bbox = BBox::from(item.bbox).clip_to_image(height, width);
      let mask = boxes_to_mask(&[bbox], height, width);
      detections.push(bbox, item.label, item.score, mask);
    }
    detections
  }
}

impl Detector for FixtureDetector {
  type Error = FixtureDetectorError;

  fn detect(&self, frames: &[RgbNchwFrame]) -> Result<Batch, Self::Error> {
    Ok(frames.iter().map(|frame| self.detect_one(frame)).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn items() -> Vec<FixtureItem> {
    vec![
      FixtureItem {
        bbox: [2.0, 2.0, 10.0, 10.0],
        label: 1,
        score: 0.95,
      },
      FixtureItem {
        bbox: [0.0, 0.0, 40.0, 4.0],
        label: 3,
        score: 0.5,
      },
    ]
  }

  #[test]
  fn test_score_threshold_is_applied_by_backend() {
    let frames = vec![RgbNchwFrame::with_shape(16, 16)];
    let batch = FixtureDetector::new(items()).detect(&frames).unwrap();
    assert_eq!(batch[0].labels(), &[1]);

    let batch = FixtureDetector::new(items())
      .with_box_score_thresh(0.3)
      .detect(&frames)
      .unwrap();
    assert_eq!(batch[0].len(), 2);
    // 超出图像的框被裁剪
    assert_eq!(batch[0].boxes()[1], BBox::new(0.0, 0.0, 16.0, 4.0));
    assert_eq!(batch[0].masks()[0].height(), 16);
  }

  #[test]
  fn test_from_url_reads_json() {
    let path = std::env::temp_dir().join(format!("quyu-fixture-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string(&items()).unwrap()).unwrap();

    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&format!("fixture://{}", url.path())).unwrap();
    let detector = FixtureDetector::from_url(&url).unwrap();
    assert_eq!(detector.items, items());

    std::fs::remove_file(&path).unwrap();
  }

  #[test]
  fn test_from_url_scheme_mismatch() {
    let url = Url::parse("image:///tmp/a.png").unwrap();
    assert!(matches!(
      FixtureDetector::from_url(&url),
      Err(FixtureDetectorError::SchemeMismatch { .. })
    ));
  }
}
