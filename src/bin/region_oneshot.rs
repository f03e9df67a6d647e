// 该文件是 Quyu （区域提取） 项目的一部分。
// src/bin/region_oneshot.rs - 单个帧对的区域提取
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
  task::{OneShotTask, Task},
};
use tracing::info;

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测后端: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = args.to_config();
  let detector = DetectorBuilder::from_url(&args.model)?
    .box_score_thresh(config.box_score_thresh)
    .build()?;
  let extractor = RegionExtractor::new(config, detector)?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input.into_pairs(args.gap), extractor, output)?;

  Ok(())
}
