// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess.rs - 检测后处理流水线
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

//! 将模型原始输出转换为原图坐标下的检测框：
//! 解码 -> 置信度排序 -> NMS -> 坐标映射 -> 面积排序。

use thiserror::Error;
use tracing::debug;

use crate::{letterbox::LetterboxTransform, tensor::RawTensor};

mod decode;
mod mapper;
mod nms;
mod sort;

pub use self::decode::{BOX_FEATURES, Proposals, decode_proposals};
pub use self::mapper::{map_detection, map_to_original};
pub use self::nms::{intersection_over_union, nms_sorted_indices, non_maximum_suppression};
pub use self::sort::{sort_by_area, sort_by_confidence};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.50;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostprocessError {
  #[error("输出形状不匹配: 期望 {expected_features} 个特征行（4 + 类别数）, 实际 {got_features} 行")]
  ShapeMismatch {
    expected_features: usize,
    got_features: usize,
  },
}

/// 轴对齐矩形 (x, y, width, height)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl BoundingBox {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
    Self::new(cx - width * 0.5, cy - height * 0.5, width, height)
  }

  pub fn right(&self) -> f32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.y + self.height
  }

  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  /// 交集面积，不相交时为 0
  pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
    let w = self.right().min(other.right()) - self.x.max(other.x);
    let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
    if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
  }
}

/// 一个候选或最终检测结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
  pub bbox: BoundingBox,
  pub class_id: usize,
  pub confidence: f32,
}

/// 单次检测调用的阈值参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
  pub confidence_threshold: f32,
  /// 小于等于 0 时关闭 NMS
  pub iou_threshold: f32,
  /// 跨类别抑制
  pub agnostic: bool,
}

impl Default for DetectParams {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      agnostic: false,
    }
  }
}

/// 完整的后处理：从原始张量到按面积降序排列的原图坐标检测框
pub fn postprocess(
  tensor: &RawTensor,
  transform: &LetterboxTransform,
  num_classes: usize,
  params: &DetectParams,
) -> Result<Vec<Detection>, PostprocessError> {
  let Proposals {
    mut detections,
    global_max,
  } = decode_proposals(tensor, num_classes, params.confidence_threshold)?;
  debug!(
    "候选框数量: {}（全局最高分 {:.4}, 阈值 {:.2}）",
    detections.len(),
    global_max,
    params.confidence_threshold
  );

  if detections.is_empty() {
    return Ok(detections);
  }

  sort_by_confidence(&mut detections);
  let kept = non_maximum_suppression(detections, params.iou_threshold, params.agnostic);
  debug!("NMS 后剩余: {}", kept.len());

  let mut mapped = map_to_original(kept, transform);
  sort_by_area(&mut mapped);
  Ok(mapped)
}
