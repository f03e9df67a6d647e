// 该文件是 Quyu （区域提取） 项目的一部分。
// src/filter.rs - 检测结果后处理：类别、面积与重叠过滤
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
use tracing::debug;

use crate::{
  config::RegionExtractorConfig,
  detection::{Batch, DetectionSet},
  model::PERSON_LABEL,
};

/// 后处理过滤参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessFilter {
  /// 仅保留该类别；为 None 时不做类别过滤
  pub target_label: Option<u32>,
  pub min_area: f32,
  pub max_overlap: f32,
}

impl From<&RegionExtractorConfig> for PostProcessFilter {
  fn from(config: &RegionExtractorConfig) -> Self {
    Self {
      target_label: config.persons_only.then_some(PERSON_LABEL),
      min_area: config.min_bbox_area,
      max_overlap: config.max_bbox_overlap,
    }
  }
}

impl PostProcessFilter {
  /// 依次执行类别过滤、面积过滤与重叠过滤，顺序不可交换
  pub fn apply(&self, detections: &DetectionSet) -> DetectionSet {
    let before = detections.len();

    let labeled = match self.target_label {
      Some(label) => keep_only_label(detections, label),
      None => detections.clone(),
    };
    let sized = filter_by_area(&labeled, self.min_area);
    let result = delete_overlapping_boxes(&sized, self.max_overlap);

    debug!(
      "后处理: {} -> 类别 {} -> 面积 {} -> 重叠 {}",
      before,
      labeled.len(),
      sized.len(),
      result.len()
    );
    result
  }

  pub fn apply_batch(&self, batch: &[DetectionSet]) -> Batch {
    #[cfg(feature = "parallel")]
    let filtered = batch.par_iter().map(|set| self.apply(set)).collect();

    #[cfg(not(feature = "parallel"))]
    let filtered = batch.iter().map(|set| self.apply(set)).collect();

    filtered
  }
}

/// 仅保留指定类别的检测
pub fn keep_only_label(detections: &DetectionSet, label: u32) -> DetectionSet {
  detections.retain_where(|d| d.label == label)
}

/// 删除面积不大于 min_area 的检测（严格大于才保留）
pub fn filter_by_area(detections: &DetectionSet, min_area: f32) -> DetectionSet {
  detections.retain_where(|d| d.bbox.area() > min_area)
}

/// 删除相互重叠的检测框。
///
/// 按面积升序处理，每个框只与排在其后（面积相同或更大）的框比较，
/// 交集面积与自身面积之比超过阈值即删除当前框。
/// 结果按面积升序排列。
pub fn delete_overlapping_boxes(detections: &DetectionSet, threshold: f32) -> DetectionSet {
  let areas = detections.areas();
  let boxes = detections.boxes();

  let mut order: Vec<usize> = (0..detections.len()).collect();
  order.sort_by(|&a, &b| areas[a].total_cmp(&areas[b]));

  let mut keep = Vec::with_capacity(order.len());
  for (pos, &current) in order.iter().enumerate() {
    let suppressed = order[pos + 1..].iter().any(|&other| {
      let overlap = boxes[current].overlap_area(&boxes[other]);
      overlap / areas[current] > threshold
    });
    if !suppressed {
      keep.push(current);
    }
  }

  detections.select(&keep)
}
