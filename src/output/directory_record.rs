// 该文件是 Quyu （区域提取） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike, Utc};
use image::RgbImage;
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::DetectionSet,
  frame::RgbNchwFrame,
  output::{
    Render,
    draw::{Draw, DrawRegionsOnFrame, FrameRecord, ToRgbImage},
  },
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

pub enum DrawWrapper {
  /// 保存叠加了区域的图像
  Draw(Box<Draw>),
  /// 保存原始帧，区域写入同名 .json 文件
  Record,
}

impl DrawWrapper {
  pub fn save_result(
    &self,
    path: &Path,
    frame: &RgbNchwFrame,
    record: &FrameRecord,
    result: &DetectionSet,
  ) -> Result<(), DirectoryRecordOutputError> {
    match self {
      DrawWrapper::Draw(draw) => {
        let image: RgbImage = draw.draw_regions(frame, result);
        image.save(path)?;
      }
      DrawWrapper::Record => {
        frame.to_rgb_image().save(path)?;
        std::fs::write(path.with_extension("json"), serde_json::to_vec_pretty(record)?)?;
      }
    };

    Ok(())
  }

  pub fn with(kind: &str) -> Self {
    match kind {
      "record" => DrawWrapper::Record,
      _ => DrawWrapper::Draw(Box::default()),
    }
  }
}

/// 按日期分目录保存每个帧对的结果
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: DrawWrapper,
  frame_counter: AtomicU64,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let kind = if uri.query_pairs().any(|(k, _)| k == "record") {
      "record"
    } else {
      "draw"
    };
    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      draw: DrawWrapper::with(kind),
      frame_counter: AtomicU64::new(0),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_path(&self, frame_id: u64) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:06X}.png",
      now.format("%H-%M-%S"),
      frame_id
    )))
  }
}

impl Render<RgbNchwFrame, DetectionSet> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &RgbNchwFrame, result: &DetectionSet) -> Result<(), Self::Error> {
    let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
    if !self.always && result.is_empty() {
      return Ok(());
    }

    let path = self.frame_path(frame_id)?;
    let record = FrameRecord::new(frame_id, frame, result);
    self.draw.save_result(&path, frame, &record, result)?;
    debug!("记录帧对 {} 到 {}", frame_id, path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{BBox, boxes_to_mask};

  fn count_files(dir: &Path, ext: &str) -> usize {
    let mut count = 0;
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        count += count_files(&path, ext);
      } else if path.extension().is_some_and(|e| e == ext) {
        count += 1;
      }
    }
    count
  }

  #[test]
  fn test_record_mode_skips_empty_results() {
    let dir = std::env::temp_dir().join(format!("quyu-record-{}", std::process::id()));
    let url = url::Url::parse(&format!("folder://{}?record", dir.display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();

    let frame = RgbNchwFrame::with_shape(8, 8);
    output.render_result(&frame, &DetectionSet::new()).unwrap();

    let bbox = BBox::new(1.0, 1.0, 5.0, 5.0);
    let mut set = DetectionSet::new();
    set.push(bbox, 0, 0.5, boxes_to_mask(&[bbox], 8, 8));
    output.render_result(&frame, &set).unwrap();

    assert_eq!(count_files(&dir, "png"), 1);
    assert_eq!(count_files(&dir, "json"), 1);
    std::fs::remove_dir_all(&dir).unwrap();
  }
}
