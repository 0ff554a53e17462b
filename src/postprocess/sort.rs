// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/sort.rs - 置信度排序与面积排序
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

use super::Detection;

/// 按置信度降序原地排序（不稳定），NMS 之前必须调用
pub fn sort_by_confidence(detections: &mut [Detection]) {
  detections.sort_unstable_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

/// 按面积降序原地排序，仅用于展示
pub fn sort_by_area(detections: &mut [Detection]) {
  detections.sort_unstable_by(|a, b| b.bbox.area().total_cmp(&a.bbox.area()));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::postprocess::BoundingBox;

  fn det(size: f32, confidence: f32) -> Detection {
    Detection {
      bbox: BoundingBox::new(0.0, 0.0, size, size),
      class_id: 0,
      confidence,
    }
  }

  #[test]
  fn confidence_descending() {
    let mut dets = vec![det(1.0, 0.3), det(2.0, 0.9), det(3.0, 0.5), det(4.0, 0.9)];
    sort_by_confidence(&mut dets);
    let scores: Vec<f32> = dets.iter().map(|d| d.confidence).collect();
    assert_eq!(scores, vec![0.9, 0.9, 0.5, 0.3]);
  }

  #[test]
  fn area_descending_is_independent_of_confidence() {
    let mut dets = vec![det(1.0, 0.9), det(5.0, 0.1), det(3.0, 0.5)];
    sort_by_area(&mut dets);
    let sizes: Vec<f32> = dets.iter().map(|d| d.bbox.width).collect();
    assert_eq!(sizes, vec![5.0, 3.0, 1.0]);
  }
}
