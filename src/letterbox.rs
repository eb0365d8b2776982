// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/letterbox.rs - 信箱式缩放变换及其逆变换
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

use image::{Rgb, RgbImage, imageops};
use tracing::debug;

/// 填充区域的灰度值
pub const LETTERBOX_FILL: [u8; 3] = [114, 114, 114];

/// 信箱式变换参数，坐标还原时按原样使用
///
/// 不变量: `round(W * scale_x + 2 * pad_x) == target`（高度同理）。
#[derive(Debug, Clone, Copy)]
pub struct LetterboxParams {
  /// 统一缩放系数
  pub scale: f32,
  /// 实际横向缩放（取整后的 new_w / W）
  pub scale_x: f32,
  /// 实际纵向缩放（取整后的 new_h / H）
  pub scale_y: f32,
  /// 横向半填充（可为 .5）
  pub pad_x: f32,
  /// 纵向半填充（可为 .5）
  pub pad_y: f32,
  /// 画布边长
  pub target: u32,
}

/// 信箱式缩放变换
///
/// 将任意分辨率图像等比缩放到 target×target 正方形画布内，
/// 短边两侧以灰色对称填充，奇数余量多出的一像素落在下/右侧。
#[derive(Debug, Clone)]
pub struct Letterbox {
  target: u32,
  scale_up: bool,
  fill: [u8; 3],
}

impl Letterbox {
  pub fn new(target: u32, scale_up: bool) -> Self {
    Self {
      target,
      scale_up,
      fill: LETTERBOX_FILL,
    }
  }

  pub fn target(&self) -> u32 {
    self.target
  }

  /// 计算变换参数，不触碰像素
  pub fn params(&self, width: u32, height: u32) -> LetterboxParams {
    let target = self.target as f32;
    let mut scale = (target / width as f32).min(target / height as f32);
    if !self.scale_up {
      scale = scale.min(1.0);
    }

    let new_w = (width as f32 * scale).round();
    let new_h = (height as f32 * scale).round();

    LetterboxParams {
      scale,
      scale_x: new_w / width as f32,
      scale_y: new_h / height as f32,
      pad_x: (target - new_w) / 2.0,
      pad_y: (target - new_h) / 2.0,
      target: self.target,
    }
  }

  /// 执行变换，返回画布和逆变换所需的参数
  pub fn apply(&self, image: &RgbImage) -> (RgbImage, LetterboxParams) {
    let (width, height) = image.dimensions();
    let params = self.params(width, height);

    // 源图已是目标尺寸时不做任何像素操作
    if width == self.target && height == self.target {
      debug!("输入尺寸与画布一致，跳过信箱变换");
      return (image.clone(), params);
    }

    let new_w = (width as f32 * params.scale_x).round() as u32;
    let new_h = (height as f32 * params.scale_y).round() as u32;

    let resized = if new_w == width && new_h == height {
      image.clone()
    } else {
      imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle)
    };

    // 余量为奇数时多出的一像素放在下/右侧
    let left = (params.pad_x - 0.1).round() as i64;
    let top = (params.pad_y - 0.1).round() as i64;

    let mut canvas = RgbImage::from_pixel(self.target, self.target, Rgb(self.fill));
    imageops::replace(&mut canvas, &resized, left, top);

    debug!(
      "信箱变换: {}x{} -> {}x{}, 填充 ({:.1}, {:.1})",
      width, height, new_w, new_h, params.pad_x, params.pad_y
    );

    (canvas, params)
  }
}

impl LetterboxParams {
  /// 将画布坐标系的一个角点映射回源图坐标系
  pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
    ((x - self.pad_x) / self.scale_x, (y - self.pad_y) / self.scale_y)
  }

  /// 将画布坐标系的边界框还原为源图整数像素框
  ///
  /// x1/y1 向下取整、x2/y2 向上取整，避免裁掉目标边缘；
  /// 越界部分被裁剪到图像内，裁剪后退化的框（零宽或零高）被丢弃。
  pub fn recover_box(&self, bbox: [f32; 4], width: u32, height: u32) -> Option<[i32; 4]> {
    let (x1, y1) = self.unmap(bbox[0], bbox[1]);
    let (x2, y2) = self.unmap(bbox[2], bbox[3]);

    let x1 = (x1.floor() as i32).clamp(0, width as i32 - 1);
    let y1 = (y1.floor() as i32).clamp(0, height as i32 - 1);
    let x2 = (x2.ceil() as i32).clamp(0, width as i32);
    let y2 = (y2.ceil() as i32).clamp(0, height as i32);

    if x1 >= x2 || y1 >= y2 {
      return None;
    }

    Some([x1, y1, x2, y2])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn checker(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
      if (x + y) % 2 == 0 {
        Rgb([255, 0, 0])
      } else {
        Rgb([0, 0, 255])
      }
    })
  }

  #[test]
  fn noop_when_source_matches_target() {
    let letterbox = Letterbox::new(640, true);
    let image = checker(640, 640);
    let (canvas, params) = letterbox.apply(&image);

    assert_eq!(params.scale, 1.0);
    assert_eq!(params.pad_x, 0.0);
    assert_eq!(params.pad_y, 0.0);
    assert_eq!(canvas, image);
  }

  #[test]
  fn pad_invariant_holds() {
    let letterbox = Letterbox::new(640, true);
    for (w, h) in [(1000, 500), (123, 77), (640, 1), (1920, 1080), (33, 641)] {
      let params = letterbox.params(w, h);
      let covered_w = (w as f32 * params.scale_x + 2.0 * params.pad_x).round() as u32;
      let covered_h = (h as f32 * params.scale_y + 2.0 * params.pad_y).round() as u32;
      assert_eq!(covered_w, 640, "宽度不变量失败: {}x{}", w, h);
      assert_eq!(covered_h, 640, "高度不变量失败: {}x{}", w, h);
    }
  }

  #[test]
  fn odd_remainder_goes_bottom_right() {
    let letterbox = Letterbox::new(10, true);
    let image = checker(10, 7); // 缩放 1.0, 纵向余量 3: 上 1 下 2
    let (canvas, params) = letterbox.apply(&image);

    assert_eq!(params.pad_y, 1.5);
    // 上侧 1 行填充，下侧 2 行填充
    assert_eq!(*canvas.get_pixel(0, 0), Rgb(LETTERBOX_FILL));
    assert_ne!(*canvas.get_pixel(0, 1), Rgb(LETTERBOX_FILL));
    assert_ne!(*canvas.get_pixel(0, 7), Rgb(LETTERBOX_FILL));
    assert_eq!(*canvas.get_pixel(0, 8), Rgb(LETTERBOX_FILL));
    assert_eq!(*canvas.get_pixel(0, 9), Rgb(LETTERBOX_FILL));
  }

  #[test]
  fn scale_up_disabled_caps_scale() {
    let letterbox = Letterbox::new(640, false);
    let params = letterbox.params(320, 200);
    assert_eq!(params.scale, 1.0);
    assert_eq!(params.pad_x, 160.0);
    assert_eq!(params.pad_y, 220.0);

    // 允许放大时小图被放大
    let letterbox = Letterbox::new(640, true);
    let params = letterbox.params(320, 200);
    assert!(params.scale > 1.0);
  }

  #[test]
  fn tall_image_scenario() {
    // 500 宽 1000 高，目标 640: scale = min(640/1000, 640/500) = 0.64
    let letterbox = Letterbox::new(640, false);
    let params = letterbox.params(500, 1000);
    assert!((params.scale - 0.64).abs() < 1e-6);
    assert_eq!(params.pad_x, 160.0);
    assert_eq!(params.pad_y, 0.0);

    // 画布 y 方向无填充: (0,0)-(64,64) 的 y 区间还原为 0..100
    let (_, y) = params.unmap(0.0, 64.0);
    assert!((y - 100.0).abs() < 1e-3);
  }

  #[test]
  fn corner_round_trip_within_one_pixel() {
    let letterbox = Letterbox::new(640, true);
    for (w, h) in [(1000u32, 500u32), (333, 777), (640, 640), (50, 1200)] {
      let params = letterbox.params(w, h);
      // 画布内图像区域的四角
      let left = params.pad_x;
      let top = params.pad_y;
      let right = params.pad_x + w as f32 * params.scale_x;
      let bottom = params.pad_y + h as f32 * params.scale_y;

      let (x0, y0) = params.unmap(left, top);
      let (x1, y1) = params.unmap(right, bottom);

      assert!(x0.abs() <= 1.0 && y0.abs() <= 1.0, "{}x{}", w, h);
      assert!((x1 - w as f32).abs() <= 1.0, "{}x{}", w, h);
      assert!((y1 - h as f32).abs() <= 1.0, "{}x{}", w, h);
    }
  }

  #[test]
  fn recover_clips_and_drops_degenerate() {
    let letterbox = Letterbox::new(640, true);
    let params = letterbox.params(500, 1000);

    // 落在左侧填充区内的框裁剪后退化，被丢弃
    assert!(params.recover_box([0.0, 0.0, 64.0, 64.0], 500, 1000).is_none());

    // 部分越界的框被裁剪而非丢弃
    let recovered = params
      .recover_box([100.0, -32.0, 300.0, 64.0], 500, 1000)
      .unwrap();
    assert_eq!(recovered[1], 0);
    assert!(recovered[0] < recovered[2] && recovered[1] < recovered[3]);
    assert!(recovered[2] <= 500 && recovered[3] <= 1000);
  }
}
