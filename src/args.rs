// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/args.rs - 项目参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use clap::Parser;
use url::Url;

/// Qianmu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型来源
  /// 支持格式:
  /// - 回放转储: replay:///path/to/output.bin?classes=80
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入图像（image:///path/to/picture.jpg）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径（image:///path/to/result.png，
  /// 同名 .txt/.json 旁车报告一并写出）
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 标签文件路径，每行一个类别名；缺省使用内置 COCO 80 类
  #[arg(long, value_name = "FILE")]
  pub labels: Option<String>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.4", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.45", value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 模型输入边长（正方形）
  #[arg(long, default_value = "640", value_name = "SIZE")]
  pub input_shape: u32,

  /// 禁止放大小图（缩放系数上限 1.0）
  #[arg(long)]
  pub no_scale_up: bool,

  /// 检测数量上限（0 表示不限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_det: usize,

  /// 标签字体文件路径，缺省时只画框不写字
  #[arg(long, value_name = "FILE")]
  pub font: Option<String>,
}
