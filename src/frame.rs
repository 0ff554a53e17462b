// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - 原始 RGB 帧与 NCHW 模型输入帧定义
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

use image::{DynamicImage, RgbImage};
use ndarray::{Array4, ArrayView4};
use thiserror::Error;

const RGB_CHANNELS: usize = 3;

/// 宿主像素缓冲区的通道排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
  Rgb8,
  Bgr8,
  Rgba8,
  Bgra8,
}

impl PixelFormat {
  pub fn channels(self) -> usize {
    match self {
      PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
      PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
    }
  }

  /// R, G, B 在单个像素内的偏移
  fn rgb_offsets(self) -> [usize; 3] {
    match self {
      PixelFormat::Rgb8 | PixelFormat::Rgba8 => [0, 1, 2],
      PixelFormat::Bgr8 | PixelFormat::Bgra8 => [2, 1, 0],
    }
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
  #[error("不支持的像素格式: {0}（仅支持 RGB8 或 RGBA8）")]
  UnsupportedPixelFormat(String),
  #[error("图像尺寸无效: {width}x{height}")]
  InvalidDimensions { width: u32, height: u32 },
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {got}")]
  BufferSizeMismatch { expected: usize, got: usize },
}

/// 原始尺寸的 RGB 帧，通道顺序固定为 R, G, B
#[derive(Debug, Clone)]
pub struct RgbFrame {
  image: RgbImage,
}

impl RgbFrame {
  /// 从宿主提供的交错像素缓冲区构建帧
  ///
  /// BGR 排列在此转换为 RGB，4 通道时丢弃 alpha。
  pub fn from_raw(
    width: u32,
    height: u32,
    format: PixelFormat,
    data: &[u8],
  ) -> Result<Self, FrameError> {
    if width == 0 || height == 0 {
      return Err(FrameError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * format.channels();
    if data.len() != expected {
      return Err(FrameError::BufferSizeMismatch {
        expected,
        got: data.len(),
      });
    }

    let [r, g, b] = format.rgb_offsets();
    let rgb = data
      .chunks_exact(format.channels())
      .flat_map(|px| [px[r], px[g], px[b]])
      .collect();

    let image = RgbImage::from_raw(width, height, rgb).ok_or(FrameError::BufferSizeMismatch {
      expected,
      got: data.len(),
    })?;
    Ok(Self { image })
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }
}

impl TryFrom<RgbImage> for RgbFrame {
  type Error = FrameError;

  fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
    if image.width() == 0 || image.height() == 0 {
      return Err(FrameError::InvalidDimensions {
        width: image.width(),
        height: image.height(),
      });
    }
    Ok(Self { image })
  }
}

impl TryFrom<DynamicImage> for RgbFrame {
  type Error = FrameError;

  fn try_from(image: DynamicImage) -> Result<Self, Self::Error> {
    match image {
      DynamicImage::ImageRgb8(rgb) => RgbFrame::try_from(rgb),
      DynamicImage::ImageRgba8(_) => RgbFrame::try_from(image.to_rgb8()),
      other => Err(FrameError::UnsupportedPixelFormat(format!(
        "{:?}",
        other.color()
      ))),
    }
  }
}

/// 归一化后的 NCHW 浮点输入，形状为 `[1, 3, S, S]`
#[derive(Debug, Clone)]
pub struct NchwFrame {
  data: Array4<f32>,
}

impl NchwFrame {
  pub fn zeros(size: usize) -> Self {
    Self {
      data: Array4::zeros((1, RGB_CHANNELS, size, size)),
    }
  }

  pub fn size(&self) -> usize {
    self.data.shape()[2]
  }

  pub fn channels(&self) -> usize {
    self.data.shape()[1]
  }

  pub fn view(&self) -> ArrayView4<'_, f32> {
    self.data.view()
  }

  pub fn data_mut(&mut self) -> &mut Array4<f32> {
    &mut self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{GrayImage, Rgba, RgbaImage};

  #[test]
  fn rgba_buffer_drops_alpha() {
    let data = [10u8, 20, 30, 255, 40, 50, 60, 0];
    let frame = RgbFrame::from_raw(2, 1, PixelFormat::Rgba8, &data).unwrap();
    assert_eq!(frame.image().as_raw(), &vec![10u8, 20, 30, 40, 50, 60]);
  }

  #[test]
  fn bgr_buffers_match_rgb_buffer() {
    let rgb = [10u8, 20, 30, 40, 50, 60];
    let bgr = [30u8, 20, 10, 60, 50, 40];
    let bgra = [30u8, 20, 10, 255, 60, 50, 40, 0];

    let expected = RgbFrame::from_raw(2, 1, PixelFormat::Rgb8, &rgb).unwrap();
    let from_bgr = RgbFrame::from_raw(2, 1, PixelFormat::Bgr8, &bgr).unwrap();
    let from_bgra = RgbFrame::from_raw(2, 1, PixelFormat::Bgra8, &bgra).unwrap();
    assert_eq!(from_bgr.image(), expected.image());
    assert_eq!(from_bgra.image(), expected.image());
    assert_eq!(from_bgr.into_image().get_pixel(1, 0).0, [40, 50, 60]);
  }

  #[test]
  fn raw_buffer_rejects_bad_input() {
    assert_eq!(
      RgbFrame::from_raw(0, 4, PixelFormat::Rgb8, &[]).unwrap_err(),
      FrameError::InvalidDimensions {
        width: 0,
        height: 4
      }
    );
    assert_eq!(
      RgbFrame::from_raw(2, 2, PixelFormat::Bgr8, &[0u8; 11]).unwrap_err(),
      FrameError::BufferSizeMismatch {
        expected: 12,
        got: 11
      }
    );
    assert_eq!(
      RgbFrame::from_raw(1, 1, PixelFormat::Bgra8, &[0u8; 3]).unwrap_err(),
      FrameError::BufferSizeMismatch {
        expected: 4,
        got: 3
      }
    );
  }

  #[test]
  fn dynamic_image_formats() {
    let rgba = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
    let frame = RgbFrame::try_from(DynamicImage::ImageRgba8(rgba)).unwrap();
    assert_eq!((frame.width(), frame.height()), (3, 2));
    assert_eq!(frame.image().get_pixel(2, 1).0, [1, 2, 3]);

    let gray = GrayImage::new(3, 2);
    assert!(matches!(
      RgbFrame::try_from(DynamicImage::ImageLuma8(gray)),
      Err(FrameError::UnsupportedPixelFormat(_))
    ));
  }

  #[test]
  fn nchw_frame_shape() {
    let mut frame = NchwFrame::zeros(8);
    assert_eq!(frame.size(), 8);
    assert_eq!(frame.channels(), 3);
    frame.data_mut()[[0, 2, 7, 7]] = 1.0;
    assert_eq!(frame.view().shape(), &[1, 3, 8, 8]);
    assert_eq!(frame.view()[[0, 2, 7, 7]], 1.0);
  }
}
