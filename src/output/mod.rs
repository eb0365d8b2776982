// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/output/mod.rs - 输出模块
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

pub mod draw;
mod save_detect;

pub use draw::Draw;
pub use save_detect::{SaveDetectError, SaveDetectOutput};

use image::RgbImage;

use crate::pipeline::Detection;

/// 结果输出接口
///
/// 持久化失败以错误形式上报，由调用方决定是否继续，
/// 不应中止检测进程本身。
pub trait Render {
  type Error;

  fn render_result(&self, image: &RgbImage, detections: &[Detection]) -> Result<(), Self::Error>;
}
