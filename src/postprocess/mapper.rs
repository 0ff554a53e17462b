// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/mapper.rs - 坐标映射回原图
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

use super::{BoundingBox, Detection};
use crate::letterbox::LetterboxTransform;

fn clamp_to(value: f32, upper: f32) -> f32 {
  value.min(upper).max(0.0)
}

/// 将模型输入坐标下的检测框映射回原图，两个角点分别裁剪到 `[0, dim - 1]`
///
/// 裁剪后宽高若为负则置 0。
pub fn map_detection(detection: &Detection, transform: &LetterboxTransform) -> Detection {
  let max_x = transform.original_width.saturating_sub(1) as f32;
  let max_y = transform.original_height.saturating_sub(1) as f32;

  let (x0, y0) = transform.unmap(detection.bbox.x, detection.bbox.y);
  let (x1, y1) = transform.unmap(detection.bbox.right(), detection.bbox.bottom());

  let x0 = clamp_to(x0, max_x);
  let y0 = clamp_to(y0, max_y);
  let x1 = clamp_to(x1, max_x);
  let y1 = clamp_to(y1, max_y);

  Detection {
    bbox: BoundingBox::new(x0, y0, (x1 - x0).max(0.0), (y1 - y0).max(0.0)),
    ..*detection
  }
}

pub fn map_to_original(detections: Vec<Detection>, transform: &LetterboxTransform) -> Vec<Detection> {
  detections
    .iter()
    .map(|d| map_detection(d, transform))
    .collect()
}
