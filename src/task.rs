// 该文件是 Quyu （区域提取） 项目的一部分。
// src/task.rs - 帧对处理任务
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

use std::{thread, time::Duration};
use tracing::{info, warn};

use crate::{
  detection::DetectionSet, extractor::RegionExtractor, frame::RgbNchwFrame, model::Detector,
  output::Render,
};

pub trait Task<I, D, O>: Sized {
  type Error;
  fn run_task(self, input: I, extractor: RegionExtractor<D>, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<
  DE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = (RgbNchwFrame, RgbNchwFrame)>,
  D: Detector<Error = DE>,
  O: Render<RgbNchwFrame, DetectionSet, Error = RE>,
> Task<I, D, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, extractor: RegionExtractor<D>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (first, last) = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧对"))?;
    info!("输入帧对获取成功，开始提取区域...");
    let now = std::time::Instant::now();
    let regions = extractor.extract(std::slice::from_ref(&first), std::slice::from_ref(&last))?;
    let elapsed = now.elapsed();
    let regions = regions
      .into_iter()
      .next()
      .ok_or_else(|| anyhow::anyhow!("区域提取结果为空"))?;
    info!("区域提取完成，共 {} 个区域，耗时: {:.2?}", regions.len(), elapsed);
    output.render_result(&last, &regions)?;
    info!("渲染完成");

    Ok(())
  }
}

#[derive(Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  batch_size: usize,
}

impl Default for ContinuousTask {
  fn default() -> Self {
    Self {
      frame_number: None,
      batch_size: 1,
    }
  }
}

impl ContinuousTask {
  /// 最多处理的帧对数量
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 每次调用检测器的帧对数量
  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size.max(1);
    self
  }
}

impl<
  DE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = (RgbNchwFrame, RgbNchwFrame)>,
  D: Detector<Error = DE>,
  O: Render<RgbNchwFrame, DetectionSet, Error = RE>,
> Task<I, D, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, extractor: RegionExtractor<D>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let limit = self.frame_number.unwrap_or(usize::MAX);
    let mut processed = 0usize;
    let mut total_regions = 0usize;

    while processed < limit {
      let take = self.batch_size.min(limit - processed);
      let (first, last): (Vec<_>, Vec<_>) = input.by_ref().take(take).unzip();
      if last.is_empty() {
        break;
      }

      let now = std::time::Instant::now();
      let batch = extractor.extract(&first, &last)?;
      let elapsed_a = now.elapsed();
      for (frame, regions) in last.iter().zip(&batch) {
        total_regions += regions.len();
        output.render_result(frame, regions)?;
      }
      let elapsed_b = now.elapsed();
      processed += last.len();
      info!(
        "第 {} 个帧对处理完成，耗时: {:.2?} / {:.2?}",
        processed, elapsed_a, elapsed_b
      );

      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共处理 {} 个帧对，{} 个区域", processed, total_regions);
    Ok(())
  }
}
