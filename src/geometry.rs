// 该文件是 Quyu （区域提取） 项目的一部分。
// src/geometry.rs - 边界框与掩码几何运算
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

use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

/// 轴对齐边界框，坐标为像素 [x_min, y_min, x_max, y_max]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
  pub x1: f32,
  pub y1: f32,
  pub x2: f32,
  pub y2: f32,
}

impl BBox {
  pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
    Self { x1, y1, x2, y2 }
  }

  /// 面积，退化框为 0
  pub fn area(&self) -> f32 {
    (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
  }

  /// 将坐标限制在图像范围 [0, width] x [0, height] 内
  pub fn clip_to_image(&self, height: usize, width: usize) -> BBox {
    let (h, w) = (height as f32, width as f32);
    BBox {
      x1: self.x1.clamp(0.0, w),
      y1: self.y1.clamp(0.0, h),
      x2: self.x2.clamp(0.0, w),
      y2: self.y2.clamp(0.0, h),
    }
  }

  /// 各方向外扩 margin 像素
  pub fn expand(&self, margin: f32) -> BBox {
    BBox {
      x1: self.x1 - margin,
      y1: self.y1 - margin,
      x2: self.x2 + margin,
      y2: self.y2 + margin,
    }
  }

  /// 原始交集坐标，不相交时结果为退化框
  pub fn intersection(&self, other: &BBox) -> BBox {
    BBox {
      x1: self.x1.max(other.x1),
      y1: self.y1.max(other.y1),
      x2: self.x2.min(other.x2),
      y2: self.y2.min(other.y2),
    }
  }

  /// 交集面积，只有 x1 < x2 且 y1 < y2 时才计入
  pub fn overlap_area(&self, other: &BBox) -> f32 {
    let inter = self.intersection(other);
    if inter.is_valid() { inter.area() } else { 0.0 }
  }

  pub fn is_valid(&self) -> bool {
    self.x1 < self.x2 && self.y1 < self.y2
  }

  pub fn to_array(&self) -> [f32; 4] {
    [self.x1, self.y1, self.x2, self.y2]
  }
}

impl From<[f32; 4]> for BBox {
  fn from(bbox: [f32; 4]) -> Self {
    BBox::new(bbox[0], bbox[1], bbox[2], bbox[3])
  }
}

/// 二值掩码，像素值为 0 或 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
  image: GrayImage,
}

impl Mask {
  pub fn zeros(height: usize, width: usize) -> Self {
    Self {
      image: GrayImage::new(width as u32, height as u32),
    }
  }

  /// 任意灰度图二值化，非零即前景
  pub fn from_image(mut image: GrayImage) -> Self {
    for pixel in image.pixels_mut() {
      pixel.0[0] = u8::from(pixel.0[0] != 0);
    }
    Self { image }
  }

  pub fn height(&self) -> usize {
    self.image.height() as usize
  }

  pub fn width(&self) -> usize {
    self.image.width() as usize
  }

  pub fn get(&self, x: usize, y: usize) -> bool {
    self.image.get_pixel(x as u32, y as u32).0[0] != 0
  }

  pub fn set(&mut self, x: usize, y: usize, value: bool) {
    self.image.put_pixel(x as u32, y as u32, Luma([u8::from(value)]));
  }

  /// 前景像素数量
  pub fn count(&self) -> usize {
    self.image.as_raw().iter().filter(|&&v| v != 0).count()
  }

  pub fn is_empty(&self) -> bool {
    self.image.as_raw().iter().all(|&v| v == 0)
  }

  /// 逐像素与
  pub fn and(&self, other: &Mask) -> Mask {
    self.zip_with(other, |a, b| a & b)
  }

  /// 逐像素 self AND NOT other
  pub fn and_not(&self, other: &Mask) -> Mask {
    self.zip_with(other, |a, b| a & (1 - b))
  }

  fn zip_with(&self, other: &Mask, op: impl Fn(u8, u8) -> u8) -> Mask {
    debug_assert_eq!(self.image.dimensions(), other.image.dimensions());
    let mut image = self.image.clone();
    for (dst, src) in image.pixels_mut().zip(other.image.pixels()) {
      dst.0[0] = op(dst.0[0], src.0[0]);
    }
    Mask { image }
  }

  pub fn as_image(&self) -> &GrayImage {
    &self.image
  }
}

/// 查找 8 连通前景区域，每个区域返回一个紧致边界框。
///
/// 坐标为包含式像素下标 (min_x, min_y, max_x, max_y)，
/// 顺序为各区域在行优先扫描中首次出现的顺序。
pub fn masks_to_boxes(mask: &Mask) -> Vec<BBox> {
  let labels = connected_components(mask.as_image(), Connectivity::Eight, Luma([0u8]));

  let mut order: HashMap<u32, usize> = HashMap::new();
  let mut boxes: Vec<BBox> = Vec::new();

  for (x, y, label) in labels.enumerate_pixels() {
    let label = label.0[0];
    if label == 0 {
      continue;
    }
    let (x, y) = (x as f32, y as f32);
    match order.get(&label) {
      Some(&idx) => {
        let bbox = &mut boxes[idx];
        bbox.x1 = bbox.x1.min(x);
        bbox.y1 = bbox.y1.min(y);
        bbox.x2 = bbox.x2.max(x);
        bbox.y2 = bbox.y2.max(y);
      }
      None => {
        order.insert(label, boxes.len());
        boxes.push(BBox::new(x, y, x, y));
      }
    }
  }

  boxes
}

/// 将若干边界框的并集栅格化为掩码。
///
/// 坐标截断取整，行列范围均为包含式，超出部分裁剪到掩码内。
pub fn boxes_to_mask(boxes: &[BBox], height: usize, width: usize) -> Mask {
  let mut mask = Mask::zeros(height, width);
  if height == 0 || width == 0 {
    return mask;
  }

  for bbox in boxes {
    let Some((x_start, x_end)) = inclusive_span(bbox.x1, bbox.x2, width) else {
      continue;
    };
    let Some((y_start, y_end)) = inclusive_span(bbox.y1, bbox.y2, height) else {
      continue;
    };
    for y in y_start..=y_end {
      for x in x_start..=x_end {
        mask.set(x, y, true);
      }
    }
  }

  mask
}

fn inclusive_span(start: f32, end: f32, len: usize) -> Option<(usize, usize)> {
  let start = (start.trunc() as i64).max(0);
  let end = (end.trunc() as i64).min(len as i64 - 1);
  if start > end {
    None
  } else {
    Some((start as usize, end as usize))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_area_of_degenerate_box_is_zero() {
    assert_eq!(BBox::new(0.0, 0.0, 10.0, 5.0).area(), 50.0);
    assert_eq!(BBox::new(10.0, 0.0, 0.0, 5.0).area(), 0.0);
    assert_eq!(BBox::new(0.0, 5.0, 10.0, 0.0).area(), 0.0);
  }

  #[test]
  fn test_clip_to_image() {
    let clipped = BBox::new(-2.0, -2.0, 12.0, 7.0).clip_to_image(5, 10);
    assert_eq!(clipped, BBox::new(0.0, 0.0, 10.0, 5.0));

    // 完全在图像外的框退化为零面积
    let outside = BBox::new(20.0, 20.0, 30.0, 30.0).clip_to_image(5, 10);
    assert_eq!(outside.area(), 0.0);
  }

  #[test]
  fn test_overlap_area_ignores_disjoint_boxes() {
    let a = BBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BBox::new(20.0, 20.0, 30.0, 30.0);
    // 两个负边长相乘为正，但不应计入
    assert!(a.intersection(&b).x1 > a.intersection(&b).x2);
    assert_eq!(a.overlap_area(&b), 0.0);

    let c = BBox::new(5.0, 5.0, 15.0, 15.0);
    assert_eq!(a.overlap_area(&c), 25.0);
  }

  #[test]
  fn test_masks_to_boxes_scan_order_and_connectivity() {
    let mut mask = Mask::zeros(8, 8);
    // 第一个区域：对角相连的两个像素（8 连通）
    mask.set(5, 1, true);
    mask.set(6, 2, true);
    // 第二个区域
    mask.set(1, 4, true);
    mask.set(2, 4, true);
    mask.set(1, 5, true);

    let boxes = masks_to_boxes(&mask);
    assert_eq!(
      boxes,
      vec![BBox::new(5.0, 1.0, 6.0, 2.0), BBox::new(1.0, 4.0, 2.0, 5.0)]
    );
  }

  #[test]
  fn test_masks_to_boxes_empty() {
    assert!(masks_to_boxes(&Mask::zeros(4, 4)).is_empty());
  }

  #[test]
  fn test_boxes_to_mask_inclusive_and_clamped() {
    let mask = boxes_to_mask(
      &[BBox::new(1.0, 1.0, 2.0, 2.0), BBox::new(3.0, 0.0, 4.0, 4.0)],
      4,
      4,
    );
    assert_eq!(mask.count(), 4 + 4);
    assert!(mask.get(1, 1) && mask.get(2, 2));
    assert!(mask.get(3, 3));
    assert!(!mask.get(0, 0));
  }

  #[test]
  fn test_mask_and_not() {
    let full = boxes_to_mask(&[BBox::new(0.0, 0.0, 3.0, 3.0)], 4, 4);
    let part = boxes_to_mask(&[BBox::new(0.0, 0.0, 1.0, 3.0)], 4, 4);
    let rest = full.and_not(&part);
    assert_eq!(rest.count(), 8);
    assert!(!rest.get(0, 0));
    assert_eq!(full.and(&part), part);
  }
}
