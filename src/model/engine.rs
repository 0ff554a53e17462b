// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/engine.rs - 推理引擎接口
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

use thiserror::Error;

use super::config::{Backend, ModelConfig};
use crate::{frame::NchwFrame, tensor::{RawTensor, TensorError}};

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("模型加载错误: {0}")]
  ModelLoad(String),
  #[error("推理错误: {0}")]
  Inference(String),
  #[error("模型输出无效: {0}")]
  InvalidOutput(#[from] TensorError),
  #[error("输入尺寸不匹配: 期望 {expected}, 实际 {got}")]
  InputSizeMismatch { expected: usize, got: usize },
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("张量转储解析错误: {0}")]
  DumpError(#[from] serde_json::Error),
}

/// 推理引擎：加载模型，将归一化输入转换为原始输出张量
///
/// `infer` 需要独占访问，引擎内部的临时缓冲区不可重入。
pub trait InferenceEngine {
  fn load(config: &ModelConfig) -> Result<Self, EngineError>
  where
    Self: Sized;

  fn infer(&mut self, input: &NchwFrame) -> Result<RawTensor, EngineError>;

  /// 实际使用的后端
  fn backend(&self) -> Backend {
    Backend::Cpu
  }
}
