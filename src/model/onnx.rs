// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 推理引擎
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

use ort::{session::Session, value::TensorRef};
use tracing::{debug, info};

use super::{
  config::{Backend, ModelConfig},
  engine::{EngineError, InferenceEngine},
};
use crate::{frame::NchwFrame, tensor::RawTensor};

pub struct OrtEngine {
  session: Session,
  backend: Backend,
}

impl InferenceEngine for OrtEngine {
  fn load(config: &ModelConfig) -> Result<Self, EngineError> {
    info!("加载模型文件: {}", config.model.display());
    let builder = Session::builder().map_err(|e| EngineError::ModelLoad(e.to_string()))?;

    #[cfg(feature = "cuda")]
    let (builder, backend) = if config.backend == Backend::Gpu {
      use ort::execution_providers::CUDAExecutionProvider;
      let builder = builder
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
      (builder, Backend::Gpu)
    } else {
      (builder, Backend::Cpu)
    };
    #[cfg(not(feature = "cuda"))]
    let backend = Backend::Cpu;

    let session = builder
      .commit_from_file(&config.model)
      .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
    info!("模型加载完成");

    Ok(Self { session, backend })
  }

  fn infer(&mut self, input: &NchwFrame) -> Result<RawTensor, EngineError> {
    let tensor =
      TensorRef::from_array_view(input.view()).map_err(|e| EngineError::Inference(e.to_string()))?;

    let outputs = self
      .session
      .run(ort::inputs![tensor])
      .map_err(|e| EngineError::Inference(e.to_string()))?;

    let (shape, data) = outputs[0]
      .try_extract_tensor::<f32>()
      .map_err(|e| EngineError::Inference(e.to_string()))?;
    let dims: &[i64] = shape.as_ref();
    debug!("ONNX 输出形状: {:?}", dims);

    let dims: Vec<usize> = dims.iter().map(|&d| d.max(0) as usize).collect();
    Ok(RawTensor::from_shape_vec(&dims, data.to_vec())?)
  }

  fn backend(&self) -> Backend {
    self.backend
  }
}
