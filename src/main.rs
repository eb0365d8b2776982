// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use qianmu::{
  FromUrl,
  config::DetectConfig,
  input::ImageFileInput,
  labels::LabelTable,
  model::ReplayBackend,
  output::{Draw, Render, SaveDetectOutput},
  pipeline::Detector,
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型来源: {}", args.model);
  info!("输入图像: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {}", args.nms_threshold);

  let config = DetectConfig {
    conf_thres: args.confidence,
    iou_thres: args.nms_threshold,
    input_shape: args.input_shape,
    scale_up: !args.no_scale_up,
    max_det: (args.max_det > 0).then_some(args.max_det),
  };

  let labels = match &args.labels {
    Some(path) => LabelTable::from_file(path)?,
    None => LabelTable::default(),
  };

  let backend = ReplayBackend::from_url(&args.model)?;
  let detector = Detector::new(backend, labels, config)?;

  let input = ImageFileInput::from_url(&args.input)?;

  let mut draw = Draw::default();
  if let Some(font) = &args.font {
    draw = draw.with_font_file(font)?;
  }
  let output = SaveDetectOutput::from_url(&args.output)?.with_draw(draw);

  for frame in input {
    info!("开始推理...");
    let now = std::time::Instant::now();
    let detections = detector.detect(&frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    for det in &detections {
      info!(
        "  - {}: {:.2}% at {:?}",
        det.class_name,
        det.confidence * 100.0,
        det.bbox
      );
    }

    // 落盘失败不中止进程，按状态上报
    if let Err(e) = output.render_result(&frame, &detections) {
      warn!("结果保存失败: {}", e);
    }
  }

  info!("处理完成");
  Ok(())
}
