// 该文件是 Quyu （区域提取） 项目的一部分。
// src/output/json_record.rs - JSON Lines 记录输出
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

use std::{
  fs::OpenOptions,
  io::Write,
  sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
  },
};

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::DetectionSet,
  frame::RgbNchwFrame,
  output::{Render, draw::FrameRecord},
};

#[derive(Error, Debug)]
pub enum JsonRecordError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("输出流已损坏")]
  Poisoned,
}

/// 每个帧对输出一行 JSON；`json://` 写到标准输出，`json:///path` 追加到文件
pub struct JsonRecordOutput {
  writer: Mutex<Box<dyn Write + Send>>,
  frame_counter: AtomicU64,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonRecordError::SchemeMismatch);
    }

    let path = url.path();
    let writer: Box<dyn Write + Send> = if path.is_empty() || path == "/" {
      Box::new(std::io::stdout())
    } else {
      info!("区域记录写入文件: {}", path);
      Box::new(OpenOptions::new().create(true).append(true).open(path)?)
    };

    Ok(Self::with_writer(writer))
  }
}

impl JsonRecordOutput {
  pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
    Self {
      writer: Mutex::new(writer),
      frame_counter: AtomicU64::new(0),
    }
  }
}

impl Render<RgbNchwFrame, DetectionSet> for JsonRecordOutput {
  type Error = JsonRecordError;

  fn render_result(&self, frame: &RgbNchwFrame, result: &DetectionSet) -> Result<(), Self::Error> {
    let index = self.frame_counter.fetch_add(1, Ordering::Relaxed);
    let line = serde_json::to_string(&FrameRecord::new(index, frame, result))?;

    let mut writer = self.writer.lock().map_err(|_| JsonRecordError::Poisoned)?;
    writeln!(writer, "{}", line)?;
    writer.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{BBox, Mask};

  #[test]
  fn test_one_line_per_frame() {
    let path = std::env::temp_dir().join(format!("quyu-json-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let url = Url::parse(&format!("json://{}", path.display())).unwrap();
    let output = JsonRecordOutput::from_url(&url).unwrap();

    let frame = RgbNchwFrame::with_shape(8, 8);
    let mut set = DetectionSet::new();
    set.push(BBox::new(0.0, 0.0, 4.0, 4.0), 0, 0.5, Mask::zeros(8, 8));
    output.render_result(&frame, &set).unwrap();
    output.render_result(&frame, &DetectionSet::new()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["frame_index"], 0);
    assert_eq!(first["regions"][0]["score"], 0.5);
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["frame_index"], 1);
    assert_eq!(second["regions"].as_array().map(Vec::len), Some(0));

    std::fs::remove_file(&path).unwrap();
  }
}
