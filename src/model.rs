// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/model.rs - 推理后端抽象与原始预测定义
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RgbNchwTensor};

/// 每个锚点的几何与目标性字段数: cx, cy, w, h, objectness
pub const ANCHOR_FIELDS: usize = 5;

/// 加速器的原始预测输出
///
/// 连续的 f32 缓冲，按锚点排列，每个锚点为
/// `[cx, cy, w, h, objectness, class_scores..]`，坐标位于信箱画布坐标系。
#[derive(Debug, Clone)]
pub struct RawOutput {
  data: Box<[f32]>,
  num_classes: usize,
}

#[derive(Error, Debug)]
pub enum RawOutputError {
  #[error("预测缓冲长度 {len} 不是锚点步长 {stride} 的整数倍")]
  ShapeMismatch { len: usize, stride: usize },
}

impl RawOutput {
  pub fn new(data: Vec<f32>, num_classes: usize) -> Result<Self, RawOutputError> {
    let stride = ANCHOR_FIELDS + num_classes;
    if stride == ANCHOR_FIELDS || data.len() % stride != 0 {
      return Err(RawOutputError::ShapeMismatch {
        len: data.len(),
        stride,
      });
    }
    Ok(Self {
      data: data.into_boxed_slice(),
      num_classes,
    })
  }

  /// 锚点步长: 5 + 类别数
  pub fn stride(&self) -> usize {
    ANCHOR_FIELDS + self.num_classes
  }

  pub fn num_anchors(&self) -> usize {
    self.data.len() / self.stride()
  }

  pub fn num_classes(&self) -> usize {
    self.num_classes
  }

  /// 第 index 个锚点的字段切片
  pub fn anchor(&self, index: usize) -> &[f32] {
    let stride = self.stride();
    &self.data[index * stride..(index + 1) * stride]
  }
}

/// 推理后端能力接口
///
/// 流水线只依赖这一个窄接口：张量进，原始预测出。
/// 真实的 NPU 驱动、软件回退等都在该接口之后实现，核心不感知设备 API。
pub trait Backend {
  type Error: std::error::Error + Send + Sync + 'static;

  fn infer(&self, input: &RgbNchwTensor) -> Result<RawOutput, Self::Error>;

  /// 该模型的类别数，决定锚点步长
  fn num_classes(&self) -> usize;
}

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("预测形状无效: {0}")]
  ShapeInvalid(#[from] RawOutputError),
}

/// 回放后端：从转储文件读取一次真实推理的原始输出
///
/// 用于在没有加速器硬件的环境里离线驱动整条流水线。
/// 文件内容为小端 f32 的平铺预测缓冲。
pub struct ReplayBackend {
  output: RawOutput,
}

const REPLAY_SCHEME: &str = "replay";
const REPLAY_DEFAULT_CLASSES: usize = 80;

impl FromUrlWithScheme for ReplayBackend {
  const SCHEME: &'static str = REPLAY_SCHEME;
}

impl FromUrl for ReplayBackend {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != REPLAY_SCHEME {
      return Err(ReplayError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        REPLAY_SCHEME
      )));
    }

    let num_classes = url
      .query_pairs()
      .find(|(k, _)| k == "classes")
      .and_then(|(_, v)| v.parse().ok())
      .unwrap_or(REPLAY_DEFAULT_CLASSES);

    info!("加载预测转储文件: {}", url.path());
    let bytes = std::fs::read(url.path())?;
    debug!("转储文件大小: {:.2} KB", bytes.len() as f64 / 1024.0);

    let data = bytes
      .chunks_exact(4)
      .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
      .collect::<Vec<_>>();

    let output = RawOutput::new(data, num_classes)?;
    info!(
      "转储加载完成: {} 个锚点, {} 个类别",
      output.num_anchors(),
      output.num_classes()
    );

    Ok(ReplayBackend { output })
  }
}

impl Backend for ReplayBackend {
  type Error = ReplayError;

  fn infer(&self, input: &RgbNchwTensor) -> Result<RawOutput, Self::Error> {
    debug!("回放推理: 输入形状 {:?}", input.shape());
    Ok(self.output.clone())
  }

  fn num_classes(&self) -> usize {
    self.output.num_classes()
  }
}
