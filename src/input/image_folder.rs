// 该文件是 Quyu （区域提取） 项目的一部分。
// src/input/image_folder.rs - 图像目录输入（按文件名排序的帧序列）
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

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, frame::RgbNchwFrame, input::read_image_file::load_rgb_image,
};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

#[derive(Error, Debug)]
pub enum ImageFolderInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录中没有图像文件: {0}")]
  Empty(String),
}

fn is_image_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
    .unwrap_or(false)
}

/// 目录中的图像按文件名排序后依次作为视频帧
pub struct ImageFolderInput {
  files: std::vec::IntoIter<PathBuf>,
}

impl FromUrlWithScheme for ImageFolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ImageFolderInput {
  type Error = ImageFolderInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ImageFolderInputError::SchemeMismatch);
    }
    Self::open(Path::new(url.path()))
  }
}

impl ImageFolderInput {
  pub fn open(directory: &Path) -> Result<Self, ImageFolderInputError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
      let path = entry?.path();
      if path.is_file() && is_image_file(&path) {
        files.push(path);
      }
    }
    if files.is_empty() {
      return Err(ImageFolderInputError::Empty(directory.display().to_string()));
    }
    files.sort();

    info!("目录 {} 中共有 {} 帧", directory.display(), files.len());
    Ok(Self {
      files: files.into_iter(),
    })
  }
}

impl Iterator for ImageFolderInput {
  type Item = RgbNchwFrame;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      match load_rgb_image(&path) {
        Ok(image) => {
          debug!("读取帧: {}", path.display());
          return Some(RgbNchwFrame::from(image));
        }
        Err(e) => error!("跳过无法读取的帧 {}: {}", path.display(), e),
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn test_frames_sorted_by_name() {
    let dir = std::env::temp_dir().join(format!("quyu-folder-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    for (name, value) in [("b.png", 20u8), ("a.png", 10u8), ("notes.txt", 0u8)] {
      let path = dir.join(name);
      if name.ends_with(".png") {
        RgbImage::from_pixel(4, 3, Rgb([value; 3])).save(&path).unwrap();
      } else {
        std::fs::write(&path, "not a frame").unwrap();
      }
    }

    let frames: Vec<RgbNchwFrame> = ImageFolderInput::open(&dir).unwrap().collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].plane(0)[0], 10);
    assert_eq!(frames[1].plane(0)[0], 20);
    assert_eq!(frames[0].shape(), (3, 3, 4));

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn test_empty_folder_is_error() {
    let dir = std::env::temp_dir().join(format!("quyu-empty-folder-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    assert!(matches!(
      ImageFolderInput::open(&dir),
      Err(ImageFolderInputError::Empty(_))
    ));
    std::fs::remove_dir_all(&dir).unwrap();
  }
}
