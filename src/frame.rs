// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/frame.rs - NCHW 浮点张量定义
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

const RGB_CHANNELS: usize = 3;

/// 加速器输入张量，NCHW 排布，批次维固定为 1
///
/// 像素值保持 0..255 的原始幅度，不做归一化——
/// 归一化由加速器侧（模型首层/AIPP 配置）承担，属于模型约定。
#[derive(Debug, Clone)]
pub struct RgbNchwTensor {
  data: Box<[f32]>,
  width: u32,
  height: u32,
}

impl RgbNchwTensor {
  /// 将 HWC 交错排布的 RGB 画布打包为 NCHW 浮点张量
  pub fn pack(canvas: &RgbImage) -> Self {
    let (width, height) = canvas.dimensions();
    let plane = (width as usize) * (height as usize);
    let mut data = vec![0f32; RGB_CHANNELS * plane].into_boxed_slice();

    let raw = canvas.as_raw();
    for h in 0..height as usize {
      for w in 0..width as usize {
        let pixel = (h * width as usize + w) * RGB_CHANNELS;
        let spatial = h * width as usize + w;
        for c in 0..RGB_CHANNELS {
          data[c * plane + spatial] = raw[pixel + c] as f32;
        }
      }
    }

    Self {
      data,
      width,
      height,
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 含批次维的形状 (N, C, H, W)
  pub fn shape(&self) -> [usize; 4] {
    [1, RGB_CHANNELS, self.height as usize, self.width as usize]
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn packs_channel_major() {
    let mut image = RgbImage::new(2, 2);
    image.put_pixel(0, 0, Rgb([10, 20, 30]));
    image.put_pixel(1, 0, Rgb([40, 50, 60]));
    image.put_pixel(0, 1, Rgb([70, 80, 90]));
    image.put_pixel(1, 1, Rgb([100, 110, 120]));

    let tensor = RgbNchwTensor::pack(&image);
    assert_eq!(tensor.shape(), [1, 3, 2, 2]);
    // R 平面，再 G 平面，再 B 平面
    assert_eq!(
      tensor.as_slice(),
      &[
        10.0, 40.0, 70.0, 100.0, // R
        20.0, 50.0, 80.0, 110.0, // G
        30.0, 60.0, 90.0, 120.0, // B
      ]
    );
  }

  #[test]
  fn keeps_raw_value_range() {
    let image = RgbImage::from_pixel(4, 4, Rgb([255, 114, 0]));
    let tensor = RgbNchwTensor::pack(&image);
    let plane = 16;
    assert!(tensor.as_slice()[..plane].iter().all(|&v| v == 255.0));
    assert!(tensor.as_slice()[plane..2 * plane].iter().all(|&v| v == 114.0));
    assert!(tensor.as_slice()[2 * plane..].iter().all(|&v| v == 0.0));
  }
}
