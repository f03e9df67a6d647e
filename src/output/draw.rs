// 该文件是 Quyu （区域提取） 项目的一部分。
// src/output/draw.rs - 区域提取结果可视化与记录
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

use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use serde::Serialize;

use crate::{
  detection::{DetectionRef, DetectionSet},
  frame::RgbNchwFrame,
  input::AsNchwFrame,
  model::{BACKGROUND_LABEL, coco_label_name},
};

const PALETTE_SIZE: usize = 16;
const BOX_THICKNESS: u32 = 2;
const MASK_ALPHA: f32 = 0.4;
const FOREGROUND_COLOR: [u8; 3] = [255, 0, 255]; // 品红

pub trait ToRgbImage {
  fn to_rgb_image(&self) -> RgbImage;
}

impl ToRgbImage for RgbNchwFrame {
  fn to_rgb_image(&self) -> RgbImage {
    let width = self.width();
    let height = self.height();
    let data = self.as_nchw();
    let plane = width * height;

    // 将 NCHW 转为 RGB 图像
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
      let idx = y as usize * width + x as usize;
      Rgb([data[idx], data[plane + idx], data[2 * plane + idx]])
    })
  }
}

pub struct Draw {
  colors: Vec<Rgb<u8>>,
}

impl Default for Draw {
  fn default() -> Self {
    let colors = (0..PALETTE_SIZE)
      .map(|i| hsv_to_rgb(i as f32 / PALETTE_SIZE as f32 * 360.0, 0.8, 0.9))
      .collect();
    Self { colors }
  }
}

/// HSV 转 RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = match h {
    h if h < 60.0 => (c, x, 0.0),
    h if h < 120.0 => (x, c, 0.0),
    h if h < 180.0 => (0.0, c, x),
    h if h < 240.0 => (0.0, x, c),
    h if h < 300.0 => (x, 0.0, c),
    _ => (c, 0.0, x),
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}

impl Draw {
  fn color_of(&self, label: u32) -> Rgb<u8> {
    if label == BACKGROUND_LABEL {
      Rgb(FOREGROUND_COLOR)
    } else {
      self.colors[label as usize % self.colors.len()]
    }
  }

  fn draw_region(&self, image: &mut RgbImage, region: DetectionRef<'_>) {
    let color = self.color_of(region.label);
    let (w, h) = image.dimensions();

    // 掩码半透明着色
    if region.mask.width() == w as usize && region.mask.height() == h as usize {
      for (x, y, pixel) in image.enumerate_pixels_mut() {
        if region.mask.get(x as usize, y as usize) {
          for c in 0..3 {
            let blended = pixel[c] as f32 * (1.0 - MASK_ALPHA) + color[c] as f32 * MASK_ALPHA;
            pixel[c] = blended as u8;
          }
        }
      }
    }

    let x_min = region.bbox.x1.floor().max(0.0) as i32;
    let y_min = region.bbox.y1.floor().max(0.0) as i32;
    let x_max = (region.bbox.x2.ceil() as i32).min(w as i32 - 1);
    let y_max = (region.bbox.y2.ceil() as i32).min(h as i32 - 1);
    if x_min >= x_max || y_min >= y_max {
      return;
    }

    // 加粗边框
    for t in 0..BOX_THICKNESS as i32 {
      let width = (x_max - x_min + 1 - 2 * t).max(0) as u32;
      let height = (y_max - y_min + 1 - 2 * t).max(0) as u32;
      if width == 0 || height == 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width, height);
      draw_hollow_rect_mut(image, rect, color);
    }
  }

  pub fn draw_regions_on_image(&self, image: &mut RgbImage, result: &DetectionSet) {
    for region in result.iter() {
      self.draw_region(image, region);
    }
  }
}

pub trait DrawRegionsOnFrame<Frame> {
  fn draw_regions(&self, frame: &Frame, result: &DetectionSet) -> RgbImage;
}

impl<Frame: ToRgbImage> DrawRegionsOnFrame<Frame> for Draw {
  fn draw_regions(&self, frame: &Frame, result: &DetectionSet) -> RgbImage {
    let mut image = frame.to_rgb_image();
    self.draw_regions_on_image(&mut image, result);
    image
  }
}

/// 单个区域的文本记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRecord {
  pub bbox: [f32; 4],
  pub label: u32,
  pub label_name: &'static str,
  pub score: f32,
  pub mask_pixels: usize,
}

/// 一个帧对的文本记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
  pub frame_index: u64,
  pub width: usize,
  pub height: usize,
  pub regions: Vec<RegionRecord>,
}

impl FrameRecord {
  pub fn new(frame_index: u64, frame: &RgbNchwFrame, result: &DetectionSet) -> Self {
    let regions = result
      .iter()
      .map(|region| RegionRecord {
        bbox: region.bbox.to_array(),
        label: region.label,
        label_name: coco_label_name(region.label),
        score: region.score,
        mask_pixels: region.mask.count(),
      })
      .collect();

    Self {
      frame_index,
      width: frame.width(),
      height: frame.height(),
      regions,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{BBox, boxes_to_mask};

  #[test]
  fn test_to_rgb_image_roundtrip_pixel() {
    let mut frame = RgbNchwFrame::with_shape(2, 3);
    frame.set_pixel(2, 1, [7, 8, 9]);
    let image = frame.to_rgb_image();
    assert_eq!(image.dimensions(), (3, 2));
    assert_eq!(image.get_pixel(2, 1), &Rgb([7, 8, 9]));
  }

  #[test]
  fn test_draw_marks_box_border() {
    let frame = RgbNchwFrame::with_shape(20, 20);
    let bbox = BBox::new(4.0, 4.0, 12.0, 12.0);
    let mut set = DetectionSet::new();
    set.push(bbox, BACKGROUND_LABEL, 0.5, boxes_to_mask(&[bbox], 20, 20));

    let image = Draw::default().draw_regions(&frame, &set);
    assert_eq!(image.get_pixel(4, 4), &Rgb(FOREGROUND_COLOR));
    assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
    // 内部被掩码着色
    assert_ne!(image.get_pixel(8, 8), &Rgb([0, 0, 0]));
  }

  #[test]
  fn test_frame_record() {
    let frame = RgbNchwFrame::with_shape(10, 10);
    let bbox = BBox::new(1.0, 1.0, 3.0, 3.0);
    let mut set = DetectionSet::new();
    set.push(bbox, 1, 0.9, boxes_to_mask(&[bbox], 10, 10));

    let record = FrameRecord::new(3, &frame, &set);
    assert_eq!(record.regions.len(), 1);
    assert_eq!(record.regions[0].label_name, "person");
    assert_eq!(record.regions[0].mask_pixels, 9);
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"frame_index\":3"));
  }
}
