// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/decode.rs - 候选框解码
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

use tracing::{debug, error};

use super::{BoundingBox, Detection, PostprocessError};
use crate::tensor::RawTensor;

/// 每个候选框的回归行数：cx, cy, w, h
pub const BOX_FEATURES: usize = 4;

/// 解码结果
#[derive(Debug, Clone, Default)]
pub struct Proposals {
  /// 通过阈值的候选框（模型输入坐标，无序）
  pub detections: Vec<Detection>,
  /// 所有候选框中的最高类别得分，仅用于调试与标定
  pub global_max: f32,
}

/// 按列解码原始张量
///
/// 每列取得分最高的类别（并列时取索引最小者），得分低于
/// `confidence_threshold` 的列被整体丢弃。
/// 张量行数必须恰好为 `4 + num_classes`，否则返回 [`PostprocessError::ShapeMismatch`]。
pub fn decode_proposals(
  tensor: &RawTensor,
  num_classes: usize,
  confidence_threshold: f32,
) -> Result<Proposals, PostprocessError> {
  let expected_features = BOX_FEATURES + num_classes;
  let got_features = tensor.num_features();
  if num_classes == 0 || got_features != expected_features {
    error!(
      "输出形状不匹配: 期望 {} 行（4 + {}）, 实际 {} 行",
      expected_features, num_classes, got_features
    );
    return Err(PostprocessError::ShapeMismatch {
      expected_features,
      got_features,
    });
  }

  let num_proposals = tensor.num_proposals();
  debug!(
    "解码输出: {} 个特征行, {} 个候选",
    got_features, num_proposals
  );

  // 按类别整行扫描，保持内存连续访问；NaN 得分永远不会胜出
  let mut best_score = vec![f32::NEG_INFINITY; num_proposals];
  let mut best_class = vec![0usize; num_proposals];
  for class_id in 0..num_classes {
    let scores = tensor.row(BOX_FEATURES + class_id);
    for ((best, label), &score) in best_score.iter_mut().zip(best_class.iter_mut()).zip(scores) {
      if score > *best {
        *best = score;
        *label = class_id;
      }
    }
  }

  let global_max = best_score.iter().copied().fold(0.0f32, f32::max);

  let cx = tensor.row(0);
  let cy = tensor.row(1);
  let w = tensor.row(2);
  let h = tensor.row(3);

  let detections = (0..num_proposals)
    .filter(|&i| best_score[i] >= confidence_threshold)
    .map(|i| Detection {
      bbox: BoundingBox::from_center(cx[i], cy[i], w[i], h[i]),
      class_id: best_class[i],
      confidence: best_score[i],
    })
    .collect();

  Ok(Proposals {
    detections,
    global_max,
  })
}
