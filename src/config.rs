// 该文件是 Quyu （区域提取） 项目的一部分。
// src/config.rs - 区域提取配置
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

pub const DEFAULT_BOX_SCORE_THRESH: f32 = 0.8;
pub const DEFAULT_MIN_BBOX_AREA: f32 = 100.0;
pub const DEFAULT_MAX_BBOX_OVERLAP: f32 = 0.65;
pub const DEFAULT_FOREGROUND_KERNEL_SIZE: usize = 3;
pub const DEFAULT_FOREGROUND_BINARY_THRESHOLD: u8 = 18;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("置信度阈值必须在 [0, 1] 内, 实际为 {0}")]
  BoxScoreThresh(f32),
  #[error("最小面积不能为负数, 实际为 {0}")]
  MinBboxArea(f32),
  #[error("最大重叠比例不能为负数, 实际为 {0}")]
  MaxBboxOverlap(f32),
  #[error("前景高斯核大小必须为正奇数, 实际为 {0}")]
  ForegroundKernelSize(usize),
}

/// 区域提取配置
#[derive(Debug, Clone, PartialEq)]
pub struct RegionExtractorConfig {
  /// 检测器置信度阈值，由检测后端自行使用
  pub box_score_thresh: f32,
  /// 仅保留人物类别
  pub persons_only: bool,
  /// 面积不大于该值的区域被移除
  pub min_bbox_area: f32,
  /// 相对重叠比例上限
  pub max_bbox_overlap: f32,
  /// 是否追加基于帧差的前景区域
  pub enable_foreground_detections: bool,
  /// 前景检测高斯核大小
  pub foreground_kernel_size: usize,
  /// 前景检测二值化阈值 (0-255)
  pub foreground_binary_threshold: u8,
}

impl Default for RegionExtractorConfig {
  fn default() -> Self {
    Self {
      box_score_thresh: DEFAULT_BOX_SCORE_THRESH,
      persons_only: false,
      min_bbox_area: DEFAULT_MIN_BBOX_AREA,
      max_bbox_overlap: DEFAULT_MAX_BBOX_OVERLAP,
      enable_foreground_detections: true,
      foreground_kernel_size: DEFAULT_FOREGROUND_KERNEL_SIZE,
      foreground_binary_threshold: DEFAULT_FOREGROUND_BINARY_THRESHOLD,
    }
  }
}

impl RegionExtractorConfig {
  pub fn with_box_score_thresh(mut self, box_score_thresh: f32) -> Self {
    self.box_score_thresh = box_score_thresh;
    self
  }

  pub fn with_persons_only(mut self, persons_only: bool) -> Self {
    self.persons_only = persons_only;
    self
  }

  pub fn with_min_bbox_area(mut self, min_bbox_area: f32) -> Self {
    self.min_bbox_area = min_bbox_area;
    self
  }

  pub fn with_max_bbox_overlap(mut self, max_bbox_overlap: f32) -> Self {
    self.max_bbox_overlap = max_bbox_overlap;
    self
  }

  pub fn with_foreground_detections(mut self, enable: bool) -> Self {
    self.enable_foreground_detections = enable;
    self
  }

  pub fn with_foreground_kernel_size(mut self, kernel_size: usize) -> Self {
    self.foreground_kernel_size = kernel_size;
    self
  }

  pub fn with_foreground_binary_threshold(mut self, threshold: u8) -> Self {
    self.foreground_binary_threshold = threshold;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&self.box_score_thresh) {
      return Err(ConfigError::BoxScoreThresh(self.box_score_thresh));
    }
    if self.min_bbox_area.is_nan() || self.min_bbox_area < 0.0 {
      return Err(ConfigError::MinBboxArea(self.min_bbox_area));
    }
    if self.max_bbox_overlap.is_nan() || self.max_bbox_overlap < 0.0 {
      return Err(ConfigError::MaxBboxOverlap(self.max_bbox_overlap));
    }
    if self.foreground_kernel_size == 0 || self.foreground_kernel_size % 2 == 0 {
      return Err(ConfigError::ForegroundKernelSize(
        self.foreground_kernel_size,
      ));
    }
    Ok(())
  }
}
