// 该文件是 Quyu （区域提取） 项目的一部分。
// src/detection.rs - 单张图像的检测集合（并行数组）
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

use crate::geometry::{BBox, Mask};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DetectionSetError {
  #[error(
    "并行数组长度不一致: boxes={boxes}, labels={labels}, scores={scores}, masks={masks}"
  )]
  LengthMismatch {
    boxes: usize,
    labels: usize,
    scores: usize,
    masks: usize,
  },
}

/// 单张图像的检测结果。
///
/// 四个序列始终等长，任何删除或重排都必须经由 [`DetectionSet::select`]。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSet {
  boxes: Vec<BBox>,
  labels: Vec<u32>,
  scores: Vec<f32>,
  masks: Vec<Mask>,
}

/// 一个批次的检测结果，与输入帧按下标对齐
pub type Batch = Vec<DetectionSet>;

/// 检测集合中的单项视图
#[derive(Debug, Clone, Copy)]
pub struct DetectionRef<'a> {
  pub bbox: &'a BBox,
  pub label: u32,
  pub score: f32,
  pub mask: &'a Mask,
}

impl DetectionSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_parts(
    boxes: Vec<BBox>,
    labels: Vec<u32>,
    scores: Vec<f32>,
    masks: Vec<Mask>,
  ) -> Result<Self, DetectionSetError> {
    let n = boxes.len();
    if labels.len() != n || scores.len() != n || masks.len() != n {
      return Err(DetectionSetError::LengthMismatch {
        boxes: n,
        labels: labels.len(),
        scores: scores.len(),
        masks: masks.len(),
      });
    }

    Ok(Self {
      boxes,
      labels,
      scores,
      masks,
    })
  }

  pub fn into_parts(self) -> (Vec<BBox>, Vec<u32>, Vec<f32>, Vec<Mask>) {
    (self.boxes, self.labels, self.scores, self.masks)
  }

  pub fn push(&mut self, bbox: BBox, label: u32, score: f32, mask: Mask) {
    self.boxes.push(bbox);
    self.labels.push(label);
    self.scores.push(score);
    self.masks.push(mask);
  }

  pub fn len(&self) -> usize {
    self.boxes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.boxes.is_empty()
  }

  pub fn boxes(&self) -> &[BBox] {
    &self.boxes
  }

  pub fn labels(&self) -> &[u32] {
    &self.labels
  }

  pub fn scores(&self) -> &[f32] {
    &self.scores
  }

  pub fn masks(&self) -> &[Mask] {
    &self.masks
  }

  pub fn areas(&self) -> Vec<f32> {
    self.boxes.iter().map(BBox::area).collect()
  }

  pub fn get(&self, index: usize) -> Option<DetectionRef<'_>> {
    Some(DetectionRef {
      bbox: self.boxes.get(index)?,
      label: *self.labels.get(index)?,
      score: *self.scores.get(index)?,
      mask: self.masks.get(index)?,
    })
  }

  pub fn iter(&self) -> impl Iterator<Item = DetectionRef<'_>> {
    (0..self.len()).filter_map(|i| self.get(i))
  }

  /// 按下标子序列重新采样，四个序列使用同一组下标
  pub fn select(&self, indices: &[usize]) -> DetectionSet {
    DetectionSet {
      boxes: indices.iter().map(|&i| self.boxes[i]).collect(),
      labels: indices.iter().map(|&i| self.labels[i]).collect(),
      scores: indices.iter().map(|&i| self.scores[i]).collect(),
      masks: indices.iter().map(|&i| self.masks[i].clone()).collect(),
    }
  }

  /// 保留满足条件的项，保持原有顺序
  pub fn retain_where(&self, keep: impl Fn(DetectionRef<'_>) -> bool) -> DetectionSet {
    let indices: Vec<usize> = (0..self.len())
      .filter(|&i| self.get(i).is_some_and(&keep))
      .collect();
    self.select(&indices)
  }
}
