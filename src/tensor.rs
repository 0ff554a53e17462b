// 该文件是 Shanan （山南西风） 项目的一部分。
// src/tensor.rs - 模型原始输出张量
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

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
  #[error("张量维度无效: 期望 2 维（或批大小为 1 的 3 维）, 实际形状 {0:?}")]
  InvalidRank(Vec<usize>),
  #[error("张量数据长度不匹配: 形状 {shape:?} 需要 {expected} 个元素, 实际 {got} 个")]
  LengthMismatch {
    shape: Vec<usize>,
    expected: usize,
    got: usize,
  },
}

/// 检测模型的原始输出，形状为 `[num_features, num_proposals]`
///
/// 第 0..4 行依次为 cx, cy, w, h（模型输入坐标），
/// 其余每行是一个类别经过 sigmoid 的置信度。
/// 数据始终以行主序连续存储，便于按类别整行扫描。
#[derive(Debug, Clone, PartialEq)]
pub struct RawTensor {
  data: Array2<f32>,
}

impl RawTensor {
  pub fn new(data: Array2<f32>) -> Self {
    let data = if data.is_standard_layout() {
      data
    } else {
      data.as_standard_layout().into_owned()
    };
    Self { data }
  }

  /// 根据推理引擎给出的形状构建张量，去掉大小为 1 的批维度
  pub fn from_shape_vec(shape: &[usize], values: Vec<f32>) -> Result<Self, TensorError> {
    let (rows, cols) = match *shape {
      [rows, cols] => (rows, cols),
      [1, rows, cols] => (rows, cols),
      _ => return Err(TensorError::InvalidRank(shape.to_vec())),
    };

    let expected = rows * cols;
    if values.len() != expected {
      return Err(TensorError::LengthMismatch {
        shape: shape.to_vec(),
        expected,
        got: values.len(),
      });
    }

    Array2::from_shape_vec((rows, cols), values)
      .map(Self::new)
      .map_err(|_| TensorError::LengthMismatch {
        shape: shape.to_vec(),
        expected,
        got: rows * cols,
      })
  }

  pub fn num_features(&self) -> usize {
    self.data.nrows()
  }

  pub fn num_proposals(&self) -> usize {
    self.data.ncols()
  }

  pub fn shape(&self) -> [usize; 2] {
    [self.num_features(), self.num_proposals()]
  }

  /// 第 `index` 行的连续切片
  pub fn row(&self, index: usize) -> &[f32] {
    let cols = self.num_proposals();
    match self.data.as_slice() {
      Some(values) => &values[index * cols..(index + 1) * cols],
      None => &[],
    }
  }

  pub fn view(&self) -> ArrayView2<'_, f32> {
    self.data.view()
  }
}
