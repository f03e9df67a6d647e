// 该文件是 Quyu （区域提取） 项目的一部分。
// src/fusion.rs - 目标检测结果与前景区域融合
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

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::{
  detection::{Batch, DetectionSet},
  foreground::{ForegroundDetector, ForegroundError},
  frame::RgbNchwFrame,
  geometry::{BBox, boxes_to_mask, masks_to_boxes},
  model::BACKGROUND_LABEL,
};

/// 已有检测框外扩的像素数，保证物体边缘不会被再次检出
pub const DETECTED_BOX_MARGIN: f32 = 2.0;
/// 前景区域没有校准过的置信度，统一取中间值
pub const FOREGROUND_SCORE: f32 = 0.5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FusionError {
  #[error("前景检测错误: {0}")]
  Foreground(#[from] ForegroundError),
  #[error("批次大小不一致: 检测结果 {detections}, 首帧 {first}, 末帧 {last}")]
  BatchMismatch {
    detections: usize,
    first: usize,
    last: usize,
  },
}

/// 将未被目标检测覆盖的运动区域追加到检测结果中
#[derive(Debug, Clone)]
pub struct ForegroundFusion {
  detector: ForegroundDetector,
}

impl ForegroundFusion {
  pub fn new(kernel_size: usize, binary_threshold: u8) -> Result<Self, FusionError> {
    Ok(Self {
      detector: ForegroundDetector::new(kernel_size, binary_threshold)?,
    })
  }

  pub fn fuse(
    &self,
    batch: Batch,
    first_frames: &[RgbNchwFrame],
    last_frames: &[RgbNchwFrame],
  ) -> Result<Batch, FusionError> {
    if batch.len() != first_frames.len() || batch.len() != last_frames.len() {
      return Err(FusionError::BatchMismatch {
        detections: batch.len(),
        first: first_frames.len(),
        last: last_frames.len(),
      });
    }

    #[cfg(feature = "parallel")]
    let fused = batch
      .into_par_iter()
      .zip(first_frames.par_iter())
      .zip(last_frames.par_iter())
      .map(|((set, first), last)| self.fuse_image(set, first, last))
      .collect();

    #[cfg(not(feature = "parallel"))]
    let fused = batch
      .into_iter()
      .zip(first_frames.iter())
      .zip(last_frames.iter())
      .map(|((set, first), last)| self.fuse_image(set, first, last))
      .collect();

    fused
  }

  /// 单张图像的融合，只追加、不删除
  pub fn fuse_image(
    &self,
    mut detections: DetectionSet,
    first: &RgbNchwFrame,
    last: &RgbNchwFrame,
  ) -> Result<DetectionSet, FusionError> {
    let foreground = self.detector.detect(first, last)?;
    let (height, width) = (foreground.height(), foreground.width());

    let covered: Vec<BBox> = detections
      .boxes()
      .iter()
      .map(|bbox| bbox.expand(DETECTED_BOX_MARGIN).clip_to_image(height, width))
      .collect();
    let covered = boxes_to_mask(&covered, height, width);
    let residual = foreground.and_not(&covered);

    let new_boxes = masks_to_boxes(&residual);
    if new_boxes.is_empty() {
      return Ok(detections);
    }

    debug!(
      "追加 {} 个前景区域 (已有检测 {} 个)",
      new_boxes.len(),
      detections.len()
    );

    for bbox in new_boxes {
      let mask = boxes_to_mask(&[bbox], height, width).and(&residual);
      detections.push(bbox, BACKGROUND_LABEL, FOREGROUND_SCORE, mask);
    }

    Ok(detections)
  }
}

/// 对整个批次做一次前景融合
pub fn fuse_foreground(
  batch: Batch,
  first_frames: &[RgbNchwFrame],
  last_frames: &[RgbNchwFrame],
  kernel_size: usize,
  binary_threshold: u8,
) -> Result<Batch, FusionError> {
  ForegroundFusion::new(kernel_size, binary_threshold)?.fuse(batch, first_frames, last_frames)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::Mask;

  fn black(height: usize, width: usize) -> RgbNchwFrame {
    RgbNchwFrame::with_shape(height, width)
  }

  fn with_square(height: usize, width: usize, x0: usize, y0: usize, size: usize) -> RgbNchwFrame {
    let mut frame = black(height, width);
    for y in y0..y0 + size {
      for x in x0..x0 + size {
        frame.set_pixel(x, y, [255, 255, 255]);
      }
    }
    frame
  }

  #[test]
  fn test_full_frame_detection_excludes_all_foreground() {
    let first = black(32, 32);
    let last = with_square(32, 32, 8, 8, 10);

    let mut detections = DetectionSet::new();
    detections.push(BBox::new(0.0, 0.0, 32.0, 32.0), 1, 0.9, Mask::zeros(32, 32));

    let fused = fuse_foreground(vec![detections], &[first], &[last], 3, 18).unwrap();
    assert_eq!(fused[0].len(), 1);
    assert_eq!(fused[0].labels(), &[1]);
  }

  #[test]
  fn test_uncovered_motion_is_appended() {
    let first = black(40, 40);
    let last = with_square(40, 40, 10, 10, 20);

    let fused = fuse_foreground(vec![DetectionSet::new()], &[first], &[last], 3, 18).unwrap();
    let set = &fused[0];
    assert_eq!(set.len(), 1);
    assert_eq!(set.labels(), &[BACKGROUND_LABEL]);
    assert_eq!(set.scores(), &[FOREGROUND_SCORE]);

    let bbox = set.boxes()[0];
    assert!(bbox.x1 <= 10.0 && bbox.y1 <= 10.0);
    assert!(bbox.x2 >= 29.0 && bbox.y2 >= 29.0);
    assert!(bbox.x2 - bbox.x1 <= 22.0);
    // 掩码只包含运动像素，而不是整个矩形
    let mask = &set.masks()[0];
    assert!(mask.get(20, 20));
    assert!(!mask.get(0, 0));
    assert!(mask.count() <= ((bbox.x2 - bbox.x1 + 1.0) * (bbox.y2 - bbox.y1 + 1.0)) as usize);
  }

  #[test]
  fn test_appended_mask_is_box_and_residual() {
    let first = black(48, 48);
    let last = with_square(48, 48, 8, 8, 24);

    // 检测框覆盖运动区域的右下角，剩余部分为 L 形
    let detected = BBox::new(20.0, 20.0, 40.0, 40.0);
    let mut detections = DetectionSet::new();
    detections.push(detected, 1, 0.9, Mask::zeros(48, 48));

    let fused = fuse_foreground(vec![detections], &[first.clone()], &[last.clone()], 3, 18).unwrap();
    let set = &fused[0];
    assert_eq!(set.len(), 2);
    assert_eq!(set.labels(), &[1, BACKGROUND_LABEL]);

    let foreground = ForegroundDetector::new(3, 18).unwrap().detect(&first, &last).unwrap();
    let covered = boxes_to_mask(
      &[detected.expand(DETECTED_BOX_MARGIN).clip_to_image(48, 48)],
      48,
      48,
    );
    let residual = foreground.and_not(&covered);

    let bbox = set.boxes()[1];
    let mask = &set.masks()[1];
    assert_eq!(*mask, boxes_to_mask(&[bbox], 48, 48).and(&residual));

    // 角落位于新区域的框内且是前景，但被检测框排除
    assert!(bbox.x2 >= 25.0 && bbox.y2 >= 25.0);
    assert!(foreground.get(25, 25));
    assert!(!mask.get(25, 25));
    assert!(mask.get(10, 10));
    assert!((mask.count() as f32) < (bbox.x2 - bbox.x1 + 1.0) * (bbox.y2 - bbox.y1 + 1.0));
  }

  #[test]
  fn test_partially_covered_object_not_fragmented() {
    let first = black(40, 40);
    let last = with_square(40, 40, 10, 10, 10);

    // 检测框与运动区域只差 1 像素，外扩 2 像素后应完全覆盖
    let mut detections = DetectionSet::new();
    detections.push(BBox::new(10.0, 10.0, 19.0, 19.0), 1, 0.9, Mask::zeros(40, 40));

    let fused = fuse_foreground(vec![detections], &[first], &[last], 3, 18).unwrap();
    assert_eq!(fused[0].len(), 1);
  }

  #[test]
  fn test_batch_mismatch() {
    let err = fuse_foreground(vec![], &[black(4, 4)], &[black(4, 4)], 3, 18).unwrap_err();
    assert_eq!(
      err,
      FusionError::BatchMismatch {
        detections: 0,
        first: 1,
        last: 1
      }
    );
  }
}
