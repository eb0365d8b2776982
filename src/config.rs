// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/config.rs - 检测流水线配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;

/// 默认置信度阈值
pub const DEFAULT_CONF_THRES: f32 = 0.4;
/// 默认 NMS IOU 阈值
pub const DEFAULT_IOU_THRES: f32 = 0.45;
/// 默认模型输入边长（正方形）
pub const DEFAULT_INPUT_SHAPE: u32 = 640;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("置信度阈值必须为正数: {0}")]
  NonPositiveConfThres(f32),
  #[error("IOU 阈值必须为正数: {0}")]
  NonPositiveIouThres(f32),
  #[error("模型输入边长必须为正数: {0}")]
  NonPositiveInputShape(u32),
}

/// 检测流水线配置
#[derive(Debug, Clone)]
pub struct DetectConfig {
  /// 置信度阈值，低于该值的锚点被丢弃
  pub conf_thres: f32,
  /// NMS IOU 阈值，重叠高于该值的同类框被抑制
  pub iou_thres: f32,
  /// 模型输入边长（正方形画布）
  pub input_shape: u32,
  /// 是否允许放大小图（关闭时缩放系数被限制为 1.0）
  pub scale_up: bool,
  /// 可选的全局检测数量上限，按置信度保留
  pub max_det: Option<usize>,
}

impl Default for DetectConfig {
  fn default() -> Self {
    Self {
      conf_thres: DEFAULT_CONF_THRES,
      iou_thres: DEFAULT_IOU_THRES,
      input_shape: DEFAULT_INPUT_SHAPE,
      scale_up: true,
      max_det: None,
    }
  }
}

impl DetectConfig {
  /// 校验配置，非法取值在流水线运行前被拒绝
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(self.conf_thres > 0.0) {
      return Err(ConfigError::NonPositiveConfThres(self.conf_thres));
    }
    if !(self.iou_thres > 0.0) {
      return Err(ConfigError::NonPositiveIouThres(self.iou_thres));
    }
    if self.input_shape == 0 {
      return Err(ConfigError::NonPositiveInputShape(self.input_shape));
    }
    Ok(())
  }
}
