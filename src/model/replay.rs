// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/replay.rs - 张量转储回放引擎
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

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
  config::ModelConfig,
  engine::{EngineError, InferenceEngine},
};
use crate::{
  frame::NchwFrame,
  tensor::{RawTensor, TensorError},
};

/// 张量的 JSON 转储格式：`{"shape": [84, 8400], "data": [...]}`，数据按行主序排列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorDump {
  pub shape: Vec<usize>,
  pub data: Vec<f32>,
}

impl TensorDump {
  pub fn from_tensor(tensor: &RawTensor) -> Self {
    Self {
      shape: tensor.shape().to_vec(),
      data: tensor.view().iter().copied().collect(),
    }
  }

  pub fn into_tensor(self) -> Result<RawTensor, TensorError> {
    RawTensor::from_shape_vec(&self.shape, self.data)
  }
}

/// 每次推理都返回同一个预先录制的输出张量，用于离线调试阈值与标定
#[derive(Debug, Clone)]
pub struct ReplayEngine {
  tensor: RawTensor,
  input_size: Option<usize>,
}

impl ReplayEngine {
  pub fn new(tensor: RawTensor) -> Self {
    Self {
      tensor,
      input_size: None,
    }
  }

  /// 要求输入为 `size x size`
  pub fn with_input_size(mut self, size: usize) -> Self {
    self.input_size = Some(size);
    self
  }

  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
    let path = path.as_ref();
    info!("加载张量转储: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let dump: TensorDump = serde_json::from_str(&content)?;
    let tensor = dump.into_tensor()?;
    debug!("张量转储形状: {:?}", tensor.shape());
    Ok(Self::new(tensor))
  }
}

impl InferenceEngine for ReplayEngine {
  fn load(config: &ModelConfig) -> Result<Self, EngineError> {
    Ok(Self::from_file(&config.model)?.with_input_size(config.input_size as usize))
  }

  fn infer(&mut self, input: &NchwFrame) -> Result<RawTensor, EngineError> {
    if let Some(expected) = self.input_size
      && input.size() != expected
    {
      return Err(EngineError::InputSizeMismatch {
        expected,
        got: input.size(),
      });
    }
    Ok(self.tensor.clone())
  }
}
