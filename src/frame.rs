// 该文件是 Quyu （区域提取） 项目的一部分。
// src/frame.rs - NCHW 帧定义
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

use image::RgbImage;
use thiserror::Error;

use crate::input::AsNchwFrame;

pub const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 平面存储的 RGB 帧，形状为 (3, H, W)，像素取值 0-255
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbNchwFrame {
  height: usize,
  width: usize,
  data: Box<[u8]>,
}

impl RgbNchwFrame {
  pub fn with_shape(height: usize, width: usize) -> Self {
    let data = vec![0u8; RGB_CHANNELS * height * width].into_boxed_slice();
    Self {
      height,
      width,
      data,
    }
  }

  pub fn from_raw(height: usize, width: usize, data: Vec<u8>) -> Result<Self, FrameError> {
    let expected = RGB_CHANNELS * height * width;
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      height,
      width,
      data: data.into_boxed_slice(),
    })
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// (C, H, W)
  pub fn shape(&self) -> (usize, usize, usize) {
    (RGB_CHANNELS, self.height, self.width)
  }

  /// 单个通道的像素平面
  pub fn plane(&self, channel: usize) -> &[u8] {
    let size = self.height * self.width;
    &self.data[channel * size..(channel + 1) * size]
  }

  pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
    let size = self.height * self.width;
    let idx = y * self.width + x;
    for (c, value) in rgb.into_iter().enumerate() {
      self.data[c * size + idx] = value;
    }
  }
}

impl AsMut<[u8]> for RgbNchwFrame {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl AsNchwFrame for RgbNchwFrame {
  fn as_nchw(&self) -> &[u8] {
    &self.data
  }
}

impl From<&RgbImage> for RgbNchwFrame {
  fn from(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let mut frame = RgbNchwFrame::with_shape(height as usize, width as usize);

    for (x, y, pixel) in image.enumerate_pixels() {
      frame.set_pixel(x as usize, y as usize, pixel.0);
    }
    frame
  }
}

impl From<RgbImage> for RgbNchwFrame {
  fn from(image: RgbImage) -> Self {
    RgbNchwFrame::from(&image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn test_from_raw_rejects_wrong_length() {
    let err = RgbNchwFrame::from_raw(2, 2, vec![0u8; 11]).unwrap_err();
    assert!(matches!(
      err,
      FrameError::LengthMismatch {
        expected: 12,
        actual: 11
      }
    ));
  }

  #[test]
  fn test_from_rgb_image_is_planar() {
    let mut image = RgbImage::new(2, 1);
    image.put_pixel(0, 0, Rgb([1, 2, 3]));
    image.put_pixel(1, 0, Rgb([4, 5, 6]));

    let frame = RgbNchwFrame::from(&image);
    assert_eq!(frame.shape(), (3, 1, 2));
    assert_eq!(frame.as_nchw(), &[1, 4, 2, 5, 3, 6]);
    assert_eq!(frame.plane(1), &[2, 5]);
  }
}
