// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/labels.rs - 类别标签表
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("标签文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 类别索引到名称的映射，加载后只读
///
/// 缺失的索引回退为合成名称 `class_{id}`，不会失败。
#[derive(Debug, Clone)]
pub struct LabelTable {
  names: Vec<String>,
}

impl Default for LabelTable {
  fn default() -> Self {
    Self {
      names: COCO_CLASSES.iter().map(|s| s.to_string()).collect(),
    }
  }
}

impl LabelTable {
  /// 从标签文件加载，每行一个类别名，索引从 0 开始密集排列
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    if !path.exists() {
      warn!("标签文件不存在: {}，将只使用合成名称", path.display());
      return Ok(Self { names: Vec::new() });
    }

    let content = std::fs::read_to_string(path)?;
    let names = content
      .lines()
      .map(|line| line.trim().to_string())
      .collect::<Vec<_>>();

    info!("加载 {} 个类别标签: {}", names.len(), path.display());
    Ok(Self { names })
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// 查询类别名称，缺失索引返回合成名称
  pub fn name(&self, class_id: usize) -> String {
    self
      .names
      .get(class_id)
      .filter(|name| !name.is_empty())
      .cloned()
      .unwrap_or_else(|| format!("class_{}", class_id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_table_is_coco() {
    let table = LabelTable::default();
    assert_eq!(table.len(), 80);
    assert_eq!(table.name(0), "person");
    assert_eq!(table.name(79), "toothbrush");
  }

  #[test]
  fn missing_index_synthesizes_name() {
    let table = LabelTable::default();
    assert_eq!(table.name(80), "class_80");

    let empty = LabelTable { names: Vec::new() };
    assert_eq!(empty.name(3), "class_3");
  }

  #[test]
  fn missing_file_yields_empty_table() {
    let table = LabelTable::from_file("/no/such/label/file.txt").unwrap();
    assert!(table.is_empty());
    assert_eq!(table.name(0), "class_0");
  }
}
