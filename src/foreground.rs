// 该文件是 Quyu （区域提取） 项目的一部分。
// src/foreground.rs - 基于帧差的前景检测
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
use tracing::debug;

use crate::{frame::RgbNchwFrame, geometry::Mask};

/// 灰度转换权重 (R, G, B)
const GRAYSCALE_WEIGHTS: [f32; 3] = [0.2989, 0.587, 0.114];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ForegroundError {
  #[error("高斯核大小必须为正奇数, 实际为 {0}")]
  InvalidKernelSize(usize),
  #[error("两帧形状不一致: {0:?} 与 {1:?}")]
  ShapeMismatch((usize, usize, usize), (usize, usize, usize)),
}

/// 阈值以 0-255 给出，像素在 [0, 1] 范围内比较
pub fn normalized_threshold(binary_threshold: u8) -> f32 {
  binary_threshold as f32 / 255.0
}

/// 与 torchvision 相同的默认 sigma
fn default_sigma(kernel_size: usize) -> f32 {
  0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
  let sigma = default_sigma(kernel_size);
  let half = (kernel_size as f32 - 1.0) * 0.5;
  let pdf: Vec<f32> = (0..kernel_size)
    .map(|i| {
      let x = (i as f32 - half) / sigma;
      (-0.5 * x * x).exp()
    })
    .collect();
  let sum: f32 = pdf.iter().sum();
  pdf.into_iter().map(|v| v / sum).collect()
}

/// 反射填充下标（不重复边缘像素）
fn reflect(index: isize, len: usize) -> usize {
  if len == 1 {
    return 0;
  }
  let period = 2 * (len as isize - 1);
  let mut i = index.rem_euclid(period);
  if i >= len as isize {
    i = period - i;
  }
  i as usize
}

/// 帧差前景检测器：高斯模糊、绝对差、灰度化、二值化
#[derive(Debug, Clone)]
pub struct ForegroundDetector {
  kernel: Vec<f32>,
  binary_threshold: u8,
}

impl ForegroundDetector {
  pub fn new(kernel_size: usize, binary_threshold: u8) -> Result<Self, ForegroundError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
      return Err(ForegroundError::InvalidKernelSize(kernel_size));
    }

    Ok(Self {
      kernel: gaussian_kernel_1d(kernel_size),
      binary_threshold,
    })
  }

  pub fn kernel_size(&self) -> usize {
    self.kernel.len()
  }

  pub fn binary_threshold(&self) -> u8 {
    self.binary_threshold
  }

  pub fn detect(&self, first: &RgbNchwFrame, last: &RgbNchwFrame) -> Result<Mask, ForegroundError> {
    if first.shape() != last.shape() {
      return Err(ForegroundError::ShapeMismatch(first.shape(), last.shape()));
    }

    let (height, width) = (first.height(), first.width());
    let threshold = normalized_threshold(self.binary_threshold);

    let mut gray = vec![0.0f32; height * width];
    for (c, weight) in GRAYSCALE_WEIGHTS.iter().enumerate() {
      let a = self.blur_plane(first.plane(c), height, width);
      let b = self.blur_plane(last.plane(c), height, width);
      for ((g, a), b) in gray.iter_mut().zip(a).zip(b) {
        *g += weight * (a - b).abs();
      }
    }

    let mut mask = Mask::zeros(height, width);
    for (idx, value) in gray.iter().enumerate() {
      if *value > threshold {
        mask.set(idx % width, idx / width, true);
      }
    }

    debug!("前景像素数量: {} / {}", mask.count(), height * width);
    Ok(mask)
  }

  /// 可分离高斯模糊，输入 0-255，输出 [0, 1]
  fn blur_plane(&self, plane: &[u8], height: usize, width: usize) -> Vec<f32> {
    let half = (self.kernel.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; height * width];
    for y in 0..height {
      let row = &plane[y * width..(y + 1) * width];
      for x in 0..width {
        let mut acc = 0.0f32;
        for (k, weight) in self.kernel.iter().enumerate() {
          let sx = reflect(x as isize + k as isize - half, width);
          acc += weight * (row[sx] as f32 / 255.0);
        }
        horizontal[y * width + x] = acc;
      }
    }

    let mut out = vec![0.0f32; height * width];
    for y in 0..height {
      for x in 0..width {
        let mut acc = 0.0f32;
        for (k, weight) in self.kernel.iter().enumerate() {
          let sy = reflect(y as isize + k as isize - half, height);
          acc += weight * horizontal[sy * width + x];
        }
        out[y * width + x] = acc;
      }
    }
    out
  }
}

/// 单次前景检测
pub fn detect_foreground(
  first: &RgbNchwFrame,
  last: &RgbNchwFrame,
  kernel_size: usize,
  binary_threshold: u8,
) -> Result<Mask, ForegroundError> {
  ForegroundDetector::new(kernel_size, binary_threshold)?.detect(first, last)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn solid(height: usize, width: usize, value: u8) -> RgbNchwFrame {
    RgbNchwFrame::from_raw(height, width, vec![value; 3 * height * width]).unwrap()
  }

  #[test]
  fn test_kernel_is_normalized_and_symmetric() {
    let kernel = gaussian_kernel_1d(3);
    assert_eq!(kernel.len(), 3);
    assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    assert!((kernel[0] - kernel[2]).abs() < 1e-7);
    assert!(kernel[1] > kernel[0]);
  }

  #[test]
  fn test_reflect_padding() {
    assert_eq!(reflect(-1, 5), 1);
    assert_eq!(reflect(-2, 5), 2);
    assert_eq!(reflect(5, 5), 3);
    assert_eq!(reflect(6, 5), 2);
    assert_eq!(reflect(3, 5), 3);
    assert_eq!(reflect(-1, 1), 0);
  }

  #[test]
  fn test_even_kernel_rejected() {
    assert_eq!(
      ForegroundDetector::new(4, 18).unwrap_err(),
      ForegroundError::InvalidKernelSize(4)
    );
    assert!(ForegroundDetector::new(0, 18).is_err());
  }

  #[test]
  fn test_identical_frames_have_no_foreground() {
    let frame = solid(16, 16, 120);
    let mask = detect_foreground(&frame, &frame, 3, 18).unwrap();
    assert!(mask.is_empty());
  }

  #[test]
  fn test_threshold_is_strict_on_normalized_scale() {
    // 均匀差值 18 在灰度权重和为 0.9999 时略小于 18/255
    let mask = detect_foreground(&solid(8, 8, 0), &solid(8, 8, 18), 3, 18).unwrap();
    assert!(mask.is_empty());

    let mask = detect_foreground(&solid(8, 8, 0), &solid(8, 8, 19), 3, 18).unwrap();
    assert_eq!(mask.count(), 64);
  }

  #[test]
  fn test_moving_square_detected() {
    let first = solid(32, 32, 0);
    let mut last = solid(32, 32, 0);
    for y in 8..16 {
      for x in 8..16 {
        last.set_pixel(x, y, [255, 255, 255]);
      }
    }

    let mask = detect_foreground(&first, &last, 3, 18).unwrap();
    assert!(mask.get(12, 12));
    assert!(!mask.get(0, 0));
    assert!(!mask.get(20, 20));
  }

  #[test]
  fn test_shape_mismatch() {
    let err = detect_foreground(&solid(4, 4, 0), &solid(4, 5, 0), 3, 18).unwrap_err();
    assert!(matches!(err, ForegroundError::ShapeMismatch(_, _)));
  }
}
