// 该文件是 Quyu （区域提取） 项目的一部分。
// src/bin/region_continueshot.rs - 连续帧对的区域提取
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

use anyhow::Result;
use clap::Parser;

use quyu::{
  FromUrl, RegionExtractor,
  args::Args,
  input::InputWrapper,
  model::DetectorBuilder,
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};
use tracing::info;

/// Quyu 连续区域提取参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ContinueArgs {
  #[command(flatten)]
  pub common: Args,

  /// 最多处理的帧对数量
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 每次调用检测器的帧对数量
  #[arg(long, default_value_t = 1, value_name = "SIZE")]
  pub batch_size: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = ContinueArgs::parse();

  info!("检测后端: {}", args.common.model);
  info!("输入来源: {}", args.common.input);
  info!("输出路径: {}", args.common.output);

  let config = args.common.to_config();
  let detector = DetectorBuilder::from_url(&args.common.model)?
    .box_score_thresh(config.box_score_thresh)
    .build()?;
  let extractor = RegionExtractor::new(config, detector)?;
  let input = InputWrapper::from_url(&args.common.input)?;
  let output = OutputWrapper::from_url(&args.common.output)?;

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_batch_size(args.batch_size)
    .run_task(input.into_pairs(args.common.gap), extractor, output)?;

  Ok(())
}
