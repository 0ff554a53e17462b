// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/nms.rs - 非极大值抑制
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

use tracing::warn;

use super::{BoundingBox, Detection};

/// 计算两个边界框的 IoU，并集面积不大于 0 时返回 0
pub fn intersection_over_union(a: &BoundingBox, b: &BoundingBox) -> f32 {
  iou_with_areas(a, b, a.area(), b.area())
}

fn iou_with_areas(a: &BoundingBox, b: &BoundingBox, area_a: f32, area_b: f32) -> f32 {
  let inter = a.intersection_area(b);
  let union = area_a + area_b - inter;
  if union > 0.0 { inter / union } else { 0.0 }
}

/// 对已按置信度降序排列的候选框做贪心 NMS，返回保留下来的下标（保持输入顺序）
///
/// `agnostic` 为 false 时不同类别的框互不抑制。
pub fn nms_sorted_indices(detections: &[Detection], iou_threshold: f32, agnostic: bool) -> Vec<usize> {
  let areas: Vec<f32> = detections.iter().map(|d| d.bbox.area()).collect();
  let mut picked: Vec<usize> = Vec::new();

  for (i, a) in detections.iter().enumerate() {
    let suppressed = picked.iter().any(|&j| {
      let b = &detections[j];
      if !agnostic && a.class_id != b.class_id {
        return false;
      }
      iou_with_areas(&a.bbox, &b.bbox, areas[i], areas[j]) > iou_threshold
    });

    if !suppressed {
      picked.push(i);
    }
  }

  picked
}

/// 非极大值抑制，`iou_threshold <= 0` 时关闭抑制并原样返回
pub fn non_maximum_suppression(
  detections: Vec<Detection>,
  iou_threshold: f32,
  agnostic: bool,
) -> Vec<Detection> {
  if iou_threshold <= 0.0 {
    warn!("NMS 已关闭（IoU 阈值 {}）, 保留全部 {} 个候选框", iou_threshold, detections.len());
    return detections;
  }

  nms_sorted_indices(&detections, iou_threshold, agnostic)
    .into_iter()
    .map(|i| detections[i])
    .collect()
}
