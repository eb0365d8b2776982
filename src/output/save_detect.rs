// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/output/save_detect.rs - 保存检测结果（图像 + 旁车报告）
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

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::RgbImage;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, draw::Draw},
  pipeline::Detection,
};

#[derive(Error, Debug)]
pub enum SaveDetectError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("报告序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 检测结果落盘输出
///
/// 写出标注图像、`.txt` 旁车报告（计数 + 每个检测一行）
/// 和携带时间戳的 `.json` 报告。
pub struct SaveDetectOutput {
  path: PathBuf,
  draw: Draw,
}

const SAVE_DETECT_SCHEME: &str = "image";

impl FromUrlWithScheme for SaveDetectOutput {
  const SCHEME: &'static str = SAVE_DETECT_SCHEME;
}

impl FromUrl for SaveDetectOutput {
  type Error = SaveDetectError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveDetectError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveDetectOutput {
      path: PathBuf::from(uri.path()),
      draw: Draw::default(),
    })
  }
}

impl SaveDetectOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      draw: Draw::default(),
    }
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), SaveDetectError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;
    info!("保存图像到文件: {}", self.path.display());
    Ok(())
  }

  fn save_text_report(&self, detections: &[Detection]) -> Result<(), SaveDetectError> {
    let path = self.path.with_extension("txt");
    let mut file = std::fs::File::create(&path)?;

    writeln!(file, "Count: {}", detections.len())?;
    for det in detections {
      writeln!(
        file,
        "{} {:.4} {:?}",
        det.class_name, det.confidence, det.bbox
      )?;
    }

    info!("保存文本报告: {}", path.display());
    Ok(())
  }

  fn save_json_report(&self, detections: &[Detection]) -> Result<(), SaveDetectError> {
    let path = self.path.with_extension("json");
    let report = json!({
      "time": Utc::now().to_rfc3339(),
      "count": detections.len(),
      "detections": detections.iter().map(|det| json!({
        "class": det.class_name,
        "class_id": det.class_id,
        "confidence": det.confidence,
        "bbox": det.bbox,
      })).collect::<Vec<_>>(),
    });

    std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    info!("保存 JSON 报告: {}", path.display());
    Ok(())
  }
}

impl Render for SaveDetectOutput {
  type Error = SaveDetectError;

  fn render_result(&self, image: &RgbImage, detections: &[Detection]) -> Result<(), Self::Error> {
    let annotated = self.draw.draw_detections(image, detections);
    self.save_image(&annotated)?;
    self.save_text_report(detections)?;
    if let Err(e) = self.save_json_report(detections) {
      // JSON 报告是补充产物，失败降级为告警
      warn!("JSON 报告写入失败: {}", e);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn detection(name: &str, confidence: f32, bbox: [i32; 4]) -> Detection {
    Detection {
      class_id: 0,
      class_name: name.to_string(),
      confidence,
      bbox,
    }
  }

  #[test]
  fn writes_image_and_sidecar_reports() {
    let dir = std::env::temp_dir().join("qianmu_save_detect_test");
    let path = dir.join("result.png");
    let output = SaveDetectOutput::new(&path);

    let image = RgbImage::from_pixel(32, 32, image::Rgb([10, 10, 10]));
    let detections = vec![
      detection("person", 0.8765, [1, 2, 20, 30]),
      detection("dog", 0.5, [4, 4, 10, 10]),
    ];

    output.render_result(&image, &detections).unwrap();

    let text = std::fs::read_to_string(dir.join("result.txt")).unwrap();
    assert!(text.starts_with("Count: 2\n"));
    assert!(text.contains("person 0.8765 [1, 2, 20, 30]"));

    let report: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(dir.join("result.json")).unwrap()).unwrap();
    assert_eq!(report["count"], 2);
    assert_eq!(report["detections"][1]["class"], "dog");
    assert!(report["time"].is_string());

    assert!(dir.join("result.png").exists());
    let _ = std::fs::remove_dir_all(&dir);
  }
}
