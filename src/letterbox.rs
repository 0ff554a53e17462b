// 该文件是 Shanan （山南西风） 项目的一部分。
// src/letterbox.rs - 信箱变换：等比缩放、居中填充与归一化
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

use image::{RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

use crate::frame::NchwFrame;

/// 填充区域的像素值（Ultralytics 默认灰色）
pub const LETTERBOX_PAD_VALUE: u8 = 114;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LetterboxError {
  #[error("图像尺寸无效: {width}x{height}")]
  InvalidDimensions { width: u32, height: u32 },
  #[error("模型输入尺寸无效: {0}")]
  InvalidTargetSize(u32),
}

/// 每通道归一化常量：`(v - mean) * norm`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
  pub mean: [f32; 3],
  pub norm: [f32; 3],
}

impl Default for Normalization {
  fn default() -> Self {
    Self {
      mean: [0.0; 3],
      norm: [1.0 / 255.0; 3],
    }
  }
}

/// 单次检测调用内有效的信箱变换参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
  pub scale: f32,
  pub pad_left: u32,
  pub pad_top: u32,
  pub resized_width: u32,
  pub resized_height: u32,
  pub target_size: u32,
  pub original_width: u32,
  pub original_height: u32,
}

impl LetterboxTransform {
  pub fn compute(
    original_width: u32,
    original_height: u32,
    target_size: u32,
  ) -> Result<Self, LetterboxError> {
    if original_width == 0 || original_height == 0 {
      return Err(LetterboxError::InvalidDimensions {
        width: original_width,
        height: original_height,
      });
    }
    if target_size == 0 {
      return Err(LetterboxError::InvalidTargetSize(target_size));
    }

    let target = target_size as f32;
    let scale = (target / original_width as f32).min(target / original_height as f32);
    let resized_width = ((original_width as f32 * scale).round() as u32).clamp(1, target_size);
    let resized_height = ((original_height as f32 * scale).round() as u32).clamp(1, target_size);

    let transform = Self {
      scale,
      pad_left: (target_size - resized_width) / 2,
      pad_top: (target_size - resized_height) / 2,
      resized_width,
      resized_height,
      target_size,
      original_width,
      original_height,
    };
    debug!("信箱变换: {:?}", transform);
    Ok(transform)
  }

  pub fn pad_right(&self) -> u32 {
    self.target_size - self.resized_width - self.pad_left
  }

  pub fn pad_bottom(&self) -> u32 {
    self.target_size - self.resized_height - self.pad_top
  }

  /// 将模型输入坐标映射回原图坐标（不裁剪）
  pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
    (
      (x - self.pad_left as f32) / self.scale,
      (y - self.pad_top as f32) / self.scale,
    )
  }

  /// 缩放并填充原图，输出归一化的 NCHW 模型输入
  pub fn apply(&self, image: &RgbImage, normalization: &Normalization) -> NchwFrame {
    let resized = image::imageops::resize(
      image,
      self.resized_width,
      self.resized_height,
      FilterType::Triangle,
    );

    let size = self.target_size as usize;
    let mut frame = NchwFrame::zeros(size);
    let data = frame.data_mut();

    for c in 0..3 {
      let mean = normalization.mean[c];
      let norm = normalization.norm[c];
      data
        .slice_mut(ndarray::s![0, c, .., ..])
        .fill((LETTERBOX_PAD_VALUE as f32 - mean) * norm);

      for (x, y, pixel) in resized.enumerate_pixels() {
        let row = (y + self.pad_top) as usize;
        let col = (x + self.pad_left) as usize;
        data[[0, c, row, col]] = (pixel[c] as f32 - mean) * norm;
      }
    }

    frame
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn landscape_image_is_padded_vertically() {
    let t = LetterboxTransform::compute(1280, 720, 640).unwrap();
    assert_eq!(t.scale, 0.5);
    assert_eq!((t.resized_width, t.resized_height), (640, 360));
    assert_eq!((t.pad_left, t.pad_top), (0, 140));
    assert_eq!((t.pad_right(), t.pad_bottom()), (0, 140));
  }

  #[test]
  fn odd_padding_goes_right_and_bottom() {
    let t = LetterboxTransform::compute(100, 200, 64).unwrap();
    assert_eq!(t.scale, 0.32);
    assert_eq!((t.resized_width, t.resized_height), (32, 64));
    assert_eq!((t.pad_left, t.pad_right()), (16, 16));

    let t = LetterboxTransform::compute(3, 10, 10).unwrap();
    assert_eq!(t.resized_width, 3);
    assert_eq!((t.pad_left, t.pad_right()), (3, 4));
  }

  #[test]
  fn rejects_empty_images() {
    assert_eq!(
      LetterboxTransform::compute(0, 480, 640).unwrap_err(),
      LetterboxError::InvalidDimensions {
        width: 0,
        height: 480
      }
    );
    assert_eq!(
      LetterboxTransform::compute(10, 10, 0).unwrap_err(),
      LetterboxError::InvalidTargetSize(0)
    );
  }

  #[test]
  fn unmap_inverts_the_forward_transform() {
    let t = LetterboxTransform::compute(640, 480, 320).unwrap();
    let (x, y) = (123.0f32, 45.0f32);
    let forward = (x * t.scale + t.pad_left as f32, y * t.scale + t.pad_top as f32);
    let (bx, by) = t.unmap(forward.0, forward.1);
    assert!((bx - x).abs() < 1e-3);
    assert!((by - y).abs() < 1e-3);
  }

  #[test]
  fn apply_fills_border_and_normalizes() {
    let image = RgbImage::from_pixel(4, 2, Rgb([255, 0, 51]));
    let t = LetterboxTransform::compute(4, 2, 4).unwrap();
    assert_eq!((t.pad_top, t.pad_bottom()), (1, 1));

    let frame = t.apply(&image, &Normalization::default());
    let view = frame.view();
    assert_eq!(view.shape(), &[1, 3, 4, 4]);

    let pad = 114.0 / 255.0;
    assert!((view[[0, 0, 0, 0]] - pad).abs() < 1e-6);
    assert!((view[[0, 2, 3, 3]] - pad).abs() < 1e-6);
    assert!((view[[0, 0, 1, 0]] - 1.0).abs() < 1e-6);
    assert!(view[[0, 1, 2, 3]].abs() < 1e-6);
    assert!((view[[0, 2, 2, 1]] - 0.2).abs() < 1e-6);
  }
}
