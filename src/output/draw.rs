// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use thiserror::Error;
use tracing::warn;

use crate::pipeline::Detection;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BOX_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const BOX_THICKNESS: i32 = 2;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  FontInvalid(#[from] ab_glyph::InvalidFont),
}

/// 检测框绘制器
///
/// 字体为可选项：未提供字体时只画边框，标签文字落在旁车报告里。
pub struct Draw {
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  box_color: [u8; 3],
  font: Option<FontVec>,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      box_color: BOX_COLOR,
      font: None,
    }
  }
}

impl Draw {
  /// 从字体文件加载标签字体
  pub fn with_font_file(mut self, path: &str) -> Result<Self, DrawError> {
    let font_data = std::fs::read(path)?;
    self.font = Some(FontVec::try_from_vec(font_data)?);
    Ok(self)
  }

  /// 在源图副本上绘制全部检测框
  pub fn draw_detections(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut annotated = image.clone();
    for detection in detections {
      self.draw_bbox_with_label(&mut annotated, detection);
    }
    annotated
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, detection: &Detection) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let [x_min, y_min, x_max, y_max] = detection.bbox;

    if x_min >= x_max || y_min >= y_max {
      warn!("跳过退化检测框: {:?}", detection.bbox);
      return;
    }

    // 绘制边框（加粗为 2 像素，向框内收缩）
    for thickness in 0..BOX_THICKNESS {
      let x_min_t = (x_min + thickness).min(w - 1);
      let y_min_t = (y_min + thickness).min(h - 1);
      let x_max_t = (x_max - 1 - thickness).max(0);
      let y_max_t = (y_max - 1 - thickness).max(0);

      for x in x_min_t..=x_max_t {
        if (x as u32) < image.width() {
          if (y_min_t as u32) < image.height() {
            *image.get_pixel_mut(x as u32, y_min_t as u32) = Rgb(self.box_color);
          }
          if (y_max_t as u32) < image.height() {
            *image.get_pixel_mut(x as u32, y_max_t as u32) = Rgb(self.box_color);
          }
        }
      }

      for y in y_min_t..=y_max_t {
        if (y as u32) < image.height() {
          if (x_min_t as u32) < image.width() {
            *image.get_pixel_mut(x_min_t as u32, y as u32) = Rgb(self.box_color);
          }
          if (x_max_t as u32) < image.width() {
            *image.get_pixel_mut(x_max_t as u32, y as u32) = Rgb(self.box_color);
          }
        }
      }
    }

    // 无字体时只画框
    let Some(font) = &self.font else {
      return;
    };

    let label = format!("{} {:.2}", detection.class_name, detection.confidence);
    let scale = PxScale::from(self.font_size);
    let text_color = Rgb([0u8, 0u8, 0u8]);

    // 估算文本大小（粗略估计）
    let text_width = (label.len() as f32 * self.label_char_width) as i32;
    let text_height = self.label_text_height;

    // 标签背景位于边框上方，顶边出界时退回框内
    let label_x = x_min.max(0);
    let label_y = (y_min - text_height).max(0);

    let max_width = (w - label_x).max(0);
    let label_width = text_width.min(max_width) as u32;
    let label_height = text_height as u32;

    if label_width > 0 && label_height > 0 {
      let rect = imageproc::rect::Rect::at(label_x, label_y).of_size(label_width, label_height);
      draw_filled_rect_mut(image, rect, Rgb(self.box_color));
      draw_text_mut(
        image,
        text_color,
        label_x,
        label_y + self.label_text_vertical_padding,
        scale,
        font,
        &label,
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn detection(bbox: [i32; 4]) -> Detection {
    Detection {
      class_id: 0,
      class_name: "person".to_string(),
      confidence: 0.9,
      bbox,
    }
  }

  #[test]
  fn draws_border_pixels() {
    let image = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
    let draw = Draw::default();
    let annotated = draw.draw_detections(&image, &[detection([4, 4, 20, 20])]);

    assert_eq!(*annotated.get_pixel(4, 4), Rgb(BOX_COLOR));
    assert_eq!(*annotated.get_pixel(10, 4), Rgb(BOX_COLOR));
    assert_eq!(*annotated.get_pixel(4, 10), Rgb(BOX_COLOR));
    // 框内部不受影响
    assert_eq!(*annotated.get_pixel(10, 10), Rgb([0, 0, 0]));
    // 源图不被修改
    assert_eq!(*image.get_pixel(4, 4), Rgb([0, 0, 0]));
  }

  #[test]
  fn degenerate_box_is_skipped() {
    let image = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
    let draw = Draw::default();
    let annotated = draw.draw_detections(&image, &[detection([5, 5, 5, 10])]);
    assert_eq!(annotated, image);
  }
}
