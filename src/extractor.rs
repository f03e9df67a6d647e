// 该文件是 Quyu （区域提取） 项目的一部分。
// src/extractor.rs - 区域提取流程
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
use tracing::{debug, error};

use crate::{
  config::{ConfigError, RegionExtractorConfig},
  detection::Batch,
  filter::PostProcessFilter,
  frame::RgbNchwFrame,
  fusion::{ForegroundFusion, FusionError},
  model::Detector,
};

#[derive(Error, Debug)]
pub enum ExtractError<E> {
  #[error("输入形状无效: {0}")]
  InvalidInputShape(String),
  #[error(transparent)]
  Detector(E),
  #[error("检测器输出不符合约定: {0}")]
  DetectorOutput(String),
  #[error("前景融合错误: {0}")]
  Fusion(#[from] FusionError),
}

/// 区域提取器：目标检测、前景融合、后处理过滤
pub struct RegionExtractor<D> {
  config: RegionExtractorConfig,
  detector: D,
  fusion: ForegroundFusion,
  filter: PostProcessFilter,
}

impl<D: Detector> RegionExtractor<D> {
  pub fn new(config: RegionExtractorConfig, detector: D) -> Result<Self, ConfigError> {
    config.validate()?;
    let fusion = ForegroundFusion::new(
      config.foreground_kernel_size,
      config.foreground_binary_threshold,
    )
    .map_err(|_| ConfigError::ForegroundKernelSize(config.foreground_kernel_size))?;
    let filter = PostProcessFilter::from(&config);

    Ok(Self {
      config,
      detector,
      fusion,
      filter,
    })
  }

  pub fn config(&self) -> &RegionExtractorConfig {
    &self.config
  }

  pub fn detector(&self) -> &D {
    &self.detector
  }

  /// 对一批帧对提取区域。
  ///
  /// 目标检测只在末帧上运行，整个批次调用一次检测器。
  pub fn extract(
    &self,
    first_frames: &[RgbNchwFrame],
    last_frames: &[RgbNchwFrame],
  ) -> Result<Batch, ExtractError<D::Error>> {
    validate_inputs(first_frames, last_frames)?;
    if last_frames.is_empty() {
      return Ok(Vec::new());
    }

    let batch = self
      .detector
      .detect(last_frames)
      .map_err(ExtractError::Detector)?;
    validate_detections(&batch, last_frames)?;
    debug!(
      "目标检测完成: {:?}",
      batch.iter().map(|set| set.len()).collect::<Vec<_>>()
    );

    let batch = if self.config.enable_foreground_detections {
      self.fusion.fuse(batch, first_frames, last_frames)?
    } else {
      batch
    };

    Ok(self.filter.apply_batch(&batch))
  }
}

fn validate_inputs<E>(
  first_frames: &[RgbNchwFrame],
  last_frames: &[RgbNchwFrame],
) -> Result<(), ExtractError<E>> {
  if first_frames.len() != last_frames.len() {
    error!(
      "批次大小不一致: 首帧 {}, 末帧 {}",
      first_frames.len(),
      last_frames.len()
    );
    return Err(ExtractError::InvalidInputShape(format!(
      "批次大小不一致: 首帧 {}, 末帧 {}",
      first_frames.len(),
      last_frames.len()
    )));
  }

  let Some(expected) = first_frames.first().map(RgbNchwFrame::shape) else {
    return Ok(());
  };
  for (idx, frame) in first_frames.iter().chain(last_frames).enumerate() {
    if frame.shape() != expected {
      return Err(ExtractError::InvalidInputShape(format!(
        "第 {} 帧形状为 {:?}, 期望 {:?}",
        idx,
        frame.shape(),
        expected
      )));
    }
  }
  Ok(())
}

fn validate_detections<E>(batch: &Batch, frames: &[RgbNchwFrame]) -> Result<(), ExtractError<E>> {
  if batch.len() != frames.len() {
    return Err(ExtractError::DetectorOutput(format!(
      "期望 {} 个检测集合, 实际 {} 个",
      frames.len(),
      batch.len()
    )));
  }

  for (idx, (set, frame)) in batch.iter().zip(frames).enumerate() {
    let bad_mask = set
      .masks()
      .iter()
      .any(|mask| mask.height() != frame.height() || mask.width() != frame.width());
    if bad_mask {
      return Err(ExtractError::DetectorOutput(format!(
        "第 {} 帧的掩码尺寸与帧尺寸 {}x{} 不一致",
        idx,
        frame.width(),
        frame.height()
      )));
    }
  }
  Ok(())
}
