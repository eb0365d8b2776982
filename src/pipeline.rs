// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/pipeline.rs - 单帧检测流水线
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

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  config::{ConfigError, DetectConfig},
  frame::RgbNchwTensor,
  labels::LabelTable,
  letterbox::Letterbox,
  model::Backend,
  postprocess::{decode, nms},
};

/// 最终检测结果，坐标位于源图像素坐标系
#[derive(Debug, Clone)]
pub struct Detection {
  /// 类别索引
  pub class_id: usize,
  /// 类别名称
  pub class_name: String,
  /// 置信度
  pub confidence: f32,
  /// 整数像素边界框 [x1, y1, x2, y2]，x1 < x2, y1 < y2
  pub bbox: [i32; 4],
}

#[derive(Error, Debug)]
pub enum DetectError<E: std::error::Error + Send + Sync + 'static> {
  #[error("无效图像: {0}")]
  InvalidImage(String),
  #[error("配置错误: {0}")]
  Config(#[from] ConfigError),
  #[error("推理失败: {0}")]
  Inference(#[source] E),
}

/// 单帧检测器
///
/// 预处理、推理、后处理构成一次阻塞调用序列，调用之间不共享可变状态；
/// 需要吞吐的调用方应在独立线程中各自持有一个检测器实例。
pub struct Detector<B: Backend> {
  backend: B,
  labels: LabelTable,
  config: DetectConfig,
  letterbox: Letterbox,
}

impl<B: Backend> Detector<B> {
  pub fn new(
    backend: B,
    labels: LabelTable,
    config: DetectConfig,
  ) -> Result<Self, DetectError<B::Error>> {
    config.validate()?;
    let letterbox = Letterbox::new(config.input_shape, config.scale_up);
    Ok(Self {
      backend,
      labels,
      config,
      letterbox,
    })
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  pub fn config(&self) -> &DetectConfig {
    &self.config
  }

  /// 对单张图像执行完整检测
  ///
  /// 变换参数与中间张量都是调用局部的，随本次调用结束而丢弃。
  pub fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectError<B::Error>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(DetectError::InvalidImage(format!(
        "图像尺寸为零: {}x{}",
        width, height
      )));
    }

    let (canvas, params) = self.letterbox.apply(image);
    let tensor = RgbNchwTensor::pack(&canvas);
    debug!("输入张量形状: {:?}", tensor.shape());

    let now = std::time::Instant::now();
    let raw = self.backend.infer(&tensor).map_err(DetectError::Inference)?;
    debug!("推理完成，耗时: {:.2?}", now.elapsed());

    let items = decode(&raw, self.config.conf_thres);
    let items = nms(items, self.config.iou_thres, self.config.max_det);

    // 坐标还原：信箱变换的逆映射 + 裁剪
    let detections = items
      .into_iter()
      .filter_map(|item| {
        params
          .recover_box(item.bbox, width, height)
          .map(|bbox| Detection {
            class_id: item.class_id,
            class_name: self.labels.name(item.class_id),
            confidence: item.score,
            bbox,
          })
      })
      .collect::<Vec<_>>();

    info!("检测到 {} 个物体", detections.len());
    Ok(detections)
  }
}
