// 该文件是 Quyu （区域提取） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::{collections::VecDeque, path::Path};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RgbNchwFrame};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("Missing `last` query parameter, expected image:///first.png?last=/last.png")]
  MissingLastFrame,
  #[error("Frame size mismatch: first {0:?}, last {1:?}")]
  SizeMismatch((u32, u32), (u32, u32)),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 读取并解码一张 RGB 图像
pub(crate) fn load_rgb_image(path: &Path) -> Result<RgbImage, ImageFileInputError> {
  let image = ImageReader::open(path)?.decode()?;
  Ok(image.to_rgb8())
}

/// 两张图像组成的帧对：`image:///first.png?last=/last.png`，依次产生首帧和末帧
pub struct ImageFileInput {
  frames: VecDeque<RgbImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let last_path = url
      .query_pairs()
      .find(|(k, _)| k == "last")
      .map(|(_, v)| v.into_owned())
      .ok_or(ImageFileInputError::MissingLastFrame)?;

    Self::open(Path::new(url.path()), Path::new(&last_path))
  }
}

impl ImageFileInput {
  pub fn open(first: &Path, last: &Path) -> Result<Self, ImageFileInputError> {
    let first_image = load_rgb_image(first)?;
    let last_image = load_rgb_image(last)?;
    if first_image.dimensions() != last_image.dimensions() {
      return Err(ImageFileInputError::SizeMismatch(
        first_image.dimensions(),
        last_image.dimensions(),
      ));
    }
    info!(
      "读取图像帧对 {} -> {}: {}x{}",
      first.display(),
      last.display(),
      first_image.width(),
      first_image.height()
    );

    Ok(ImageFileInput {
      frames: VecDeque::from([first_image, last_image]),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = RgbNchwFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frames.pop_front().map(RgbNchwFrame::from)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn test_missing_last_frame() {
    let url = Url::parse("image:///tmp/first.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::MissingLastFrame)
    ));
  }

  #[test]
  fn test_size_mismatch() {
    let dir = std::env::temp_dir().join(format!("quyu-image-size-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    RgbImage::from_pixel(4, 3, Rgb([0; 3])).save(dir.join("a.png")).unwrap();
    RgbImage::from_pixel(5, 3, Rgb([0; 3])).save(dir.join("b.png")).unwrap();

    assert!(matches!(
      ImageFileInput::open(&dir.join("a.png"), &dir.join("b.png")),
      Err(ImageFileInputError::SizeMismatch((4, 3), (5, 3)))
    ));
    std::fs::remove_dir_all(&dir).unwrap();
  }
}
