// 该文件是 Quyu （区域提取） 项目的一部分。
// src/args.rs - 命令行参数配置
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

use clap::Parser;
use url::Url;

use crate::config::{
  DEFAULT_BOX_SCORE_THRESH, DEFAULT_FOREGROUND_BINARY_THRESHOLD, DEFAULT_FOREGROUND_KERNEL_SIZE,
  DEFAULT_MAX_BBOX_OVERLAP, DEFAULT_MIN_BBOX_AREA, RegionExtractorConfig,
};

/// Quyu 区域提取参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测后端
  /// 支持:
  /// - none:// 不使用目标检测，仅前景检测
  /// - fixture:///path/to/detections.json 固定检测结果
  #[arg(long, value_name = "MODEL", default_value = "none://")]
  pub model: Url,

  /// 输入来源
  /// 支持:
  /// - image:///path/to/first.png?last=/path/to/last.png 两张图像组成的帧对
  /// - folder:///path/to/frames 按文件名排序的图像序列
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// 支持:
  /// - json:// 标准输出，或 json:///path/to/regions.jsonl
  /// - image:///path/to/out.png
  /// - folder:///path/to/dir[?record][&always]
  #[arg(long, value_name = "OUTPUT", default_value = "json://")]
  pub output: Url,

  /// 帧对中两帧的间隔
  #[arg(long, default_value_t = 1, value_name = "FRAMES")]
  pub gap: usize,

  /// 检测器置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_BOX_SCORE_THRESH, value_name = "THRESHOLD")]
  pub box_score_thresh: f32,

  /// 仅保留人物区域
  #[arg(long)]
  pub persons_only: bool,

  /// 最小区域面积（像素）
  #[arg(long, default_value_t = DEFAULT_MIN_BBOX_AREA, value_name = "AREA")]
  pub min_bbox_area: f32,

  /// 最大相对重叠比例 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_MAX_BBOX_OVERLAP, value_name = "RATIO")]
  pub max_bbox_overlap: f32,

  /// 关闭基于帧差的前景检测
  #[arg(long)]
  pub disable_foreground: bool,

  /// 前景检测高斯核大小（正奇数）
  #[arg(long, default_value_t = DEFAULT_FOREGROUND_KERNEL_SIZE, value_name = "SIZE")]
  pub foreground_kernel_size: usize,

  /// 前景检测二值化阈值 (0 - 255)
  #[arg(long, default_value_t = DEFAULT_FOREGROUND_BINARY_THRESHOLD, value_name = "THRESHOLD")]
  pub foreground_binary_threshold: u8,
}

impl Args {
  pub fn to_config(&self) -> RegionExtractorConfig {
    RegionExtractorConfig::default()
      .with_box_score_thresh(self.box_score_thresh)
      .with_persons_only(self.persons_only)
      .with_min_bbox_area(self.min_bbox_area)
      .with_max_bbox_overlap(self.max_bbox_overlap)
      .with_foreground_detections(!self.disable_foreground)
      .with_foreground_kernel_size(self.foreground_kernel_size)
      .with_foreground_binary_threshold(self.foreground_binary_threshold)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_match_config() {
    let args = Args::parse_from(["quyu", "--input", "folder:///frames"]);
    assert_eq!(args.to_config(), RegionExtractorConfig::default());
    assert_eq!(args.model.scheme(), "none");
    assert_eq!(args.output.scheme(), "json");
  }

  #[test]
  fn test_flags() {
    let args = Args::parse_from([
      "quyu",
      "--input",
      "folder:///frames",
      "--persons-only",
      "--disable-foreground",
      "--foreground-binary-threshold",
      "30",
    ]);
    let config = args.to_config();
    assert!(config.persons_only);
    assert!(!config.enable_foreground_detections);
    assert_eq!(config.foreground_binary_threshold, 30);
  }
}
