// 该文件是 Qianmu （千目观澜） 项目的一部分。
// src/input.rs - 图像文件输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像加载错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("无效图像: {0}")]
  InvalidImage(String),
}

const IMAGE_FILE_SCHEME: &str = "image";

/// 单张图像文件输入源
pub struct ImageFileInput {
  image: Option<RgbImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = IMAGE_FILE_SCHEME;
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != IMAGE_FILE_SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        IMAGE_FILE_SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch);
    }

    let path = url.path();
    let image: RgbImage = ImageReader::open(path)?.decode()?.into();

    // 零尺寸图像在进入流水线之前拒绝
    if image.width() == 0 || image.height() == 0 {
      return Err(ImageFileInputError::InvalidImage(format!(
        "图像尺寸为零: {}",
        path
      )));
    }

    Ok(ImageFileInput { image: Some(image) })
  }
}

impl Iterator for ImageFileInput {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_wrong_scheme() {
    let url = Url::parse("video:///tmp/a.mp4").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemeMismatch)
    ));
  }

  #[test]
  fn yields_single_frame() {
    let path = std::env::temp_dir().join("qianmu_input_test.png");
    let image = RgbImage::from_pixel(8, 6, image::Rgb([1, 2, 3]));
    image.save(&path).unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let mut input = ImageFileInput::from_url(&url).unwrap();
    let frame = input.next().unwrap();
    assert_eq!(frame.dimensions(), (8, 6));
    assert!(input.next().is_none());

    let _ = std::fs::remove_file(&path);
  }
}
