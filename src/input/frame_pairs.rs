// 该文件是 Quyu （区域提取） 项目的一部分。
// src/input/frame_pairs.rs - 帧流转为帧对
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

use std::collections::VecDeque;

use crate::frame::RgbNchwFrame;

/// 将帧序列转换为 (第 t-gap 帧, 第 t 帧) 的帧对
pub struct FramePairs<I> {
  inner: I,
  gap: usize,
  window: VecDeque<RgbNchwFrame>,
}

impl<I: Iterator<Item = RgbNchwFrame>> FramePairs<I> {
  /// gap 为 0 时按 1 处理
  pub fn new(inner: I, gap: usize) -> Self {
    let gap = gap.max(1);
    Self {
      inner,
      gap,
      window: VecDeque::with_capacity(gap + 1),
    }
  }
}

impl<I: Iterator<Item = RgbNchwFrame>> Iterator for FramePairs<I> {
  type Item = (RgbNchwFrame, RgbNchwFrame);

  fn next(&mut self) -> Option<Self::Item> {
    while self.window.len() < self.gap + 1 {
      self.window.push_back(self.inner.next()?);
    }
    let first = self.window.pop_front()?;
    let last = self.window.back()?.clone();
    Some((first, last))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frames(n: u8) -> Vec<RgbNchwFrame> {
    (0..n)
      .map(|v| RgbNchwFrame::from_raw(1, 1, vec![v; 3]).unwrap())
      .collect()
  }

  fn ids(pairs: impl Iterator<Item = (RgbNchwFrame, RgbNchwFrame)>) -> Vec<(u8, u8)> {
    pairs.map(|(a, b)| (a.plane(0)[0], b.plane(0)[0])).collect()
  }

  #[test]
  fn test_consecutive_pairs() {
    let pairs = FramePairs::new(frames(4).into_iter(), 1);
    assert_eq!(ids(pairs), vec![(0, 1), (1, 2), (2, 3)]);
  }

  #[test]
  fn test_pairs_with_gap() {
    let pairs = FramePairs::new(frames(5).into_iter(), 2);
    assert_eq!(ids(pairs), vec![(0, 2), (1, 3), (2, 4)]);
  }

  #[test]
  fn test_too_few_frames() {
    let pairs = FramePairs::new(frames(1).into_iter(), 1);
    assert!(ids(pairs).is_empty());
  }
}
