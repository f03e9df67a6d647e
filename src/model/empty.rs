// 该文件是 Quyu （区域提取） 项目的一部分。
// src/model/empty.rs - 空检测后端（仅前景检测）
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

use std::convert::Infallible;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::{Batch, DetectionSet},
  frame::RgbNchwFrame,
  model::{Detector, DetectorError},
};

/// 不产生任何检测结果，区域完全来自前景检测
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDetector;

impl FromUrlWithScheme for EmptyDetector {
  const SCHEME: &'static str = "none";
}

impl FromUrl for EmptyDetector {
  type Error = DetectorError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DetectorError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(EmptyDetector)
  }
}

impl Detector for EmptyDetector {
  type Error = Infallible;

  fn detect(&self, frames: &[RgbNchwFrame]) -> Result<Batch, Self::Error> {
    Ok(vec![DetectionSet::new(); frames.len()])
  }
}
