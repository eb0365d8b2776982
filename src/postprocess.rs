// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/postprocess.rs - 预测解码与非极大值抑制
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::collections::HashMap;

use tracing::debug;

use crate::model::{ANCHOR_FIELDS, RawOutput};

const IOU_EPSILON: f32 = 1e-7;

/// 画布坐标系下的候选检测
#[derive(Debug, Clone)]
pub struct DetectItem {
  pub class_id: usize,
  pub score: f32,
  /// 角点形式 [x_min, y_min, x_max, y_max]，画布坐标
  pub bbox: [f32; 4],
}

/// 解码原始预测：目标性 × 最高类别分作为置信度，低于阈值的锚点丢弃
///
/// 中心形式 (cx, cy, w, h) 在此转换为角点形式；
/// 类别取分数最高者，同分时取较小的类别索引。
pub fn decode(raw: &RawOutput, conf_thres: f32) -> Vec<DetectItem> {
  let mut items = Vec::new();

  for index in 0..raw.num_anchors() {
    let anchor = raw.anchor(index);
    let objectness = anchor[4];
    // 目标性本身低于阈值时类别分不可能再抬高置信度
    if objectness < conf_thres {
      continue;
    }

    let mut best_score = f32::MIN;
    let mut best_class = 0usize;
    for (class_id, &score) in anchor[ANCHOR_FIELDS..].iter().enumerate() {
      if score > best_score {
        best_score = score;
        best_class = class_id;
      }
    }

    let score = objectness * best_score;
    if score < conf_thres {
      continue;
    }

    let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
    items.push(DetectItem {
      class_id: best_class,
      score,
      bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
    });
  }

  debug!("解码得到 {} 个候选框", items.len());
  items
}

/// 角点形式边界框的交并比，退化框按零面积处理
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
  let union = area_a + area_b - intersection;

  if union > IOU_EPSILON {
    intersection / union
  } else {
    0.0
  }
}

/// 按类别执行贪心非极大值抑制
///
/// 不同类别之间不做抑制：同一位置上不同类别的两个框都会保留。
/// 候选先按类别分组再逐类抑制，代价与候选数成正比而非类别数 × 锚点数。
/// `max_det` 为可选的全局上限，抑制完成后按置信度截断。
pub fn nms(items: Vec<DetectItem>, iou_thres: f32, max_det: Option<usize>) -> Vec<DetectItem> {
  let mut by_class: HashMap<usize, Vec<DetectItem>> = HashMap::new();
  for item in items {
    by_class.entry(item.class_id).or_default().push(item);
  }

  let mut kept = Vec::new();
  for (_, mut candidates) in by_class {
    // 按置信度降序
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    while !candidates.is_empty() {
      let best = candidates.remove(0);
      candidates.retain(|other| iou(&best.bbox, &other.bbox) <= iou_thres);
      kept.push(best);
    }
  }

  kept.sort_by(|a, b| b.score.total_cmp(&a.score));
  if let Some(cap) = max_det {
    kept.truncate(cap);
  }

  debug!("NMS 后保留 {} 个框", kept.len());
  kept
}
