// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/yolo26.rs - YOLO26 检测器
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
use tracing::{debug, info, warn};
use url::Url;

use super::{
  CocoLabel, DetectResult, Model, WithLabel,
  config::{Backend, ConfigError, EngineKind, ModelConfig, YOLO26_SCHEME, parse_model_url},
  engine::{EngineError, InferenceEngine},
  replay::ReplayEngine,
};
use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RgbFrame,
  letterbox::{LetterboxError, LetterboxTransform, Normalization},
  postprocess::{DetectParams, PostprocessError, postprocess},
};

#[derive(Error, Debug)]
pub enum Yolo26Error {
  #[error("模型配置错误: {0}")]
  ConfigError(#[from] ConfigError),
  #[error("推理引擎错误: {0}")]
  EngineError(#[from] EngineError),
  #[error("推理引擎不可用: {0}（未启用对应的编译特性）")]
  EngineUnavailable(&'static str),
  #[error("输入图像错误: {0}")]
  InputError(#[from] LetterboxError),
  #[error("后处理错误: {0}")]
  PostprocessError(#[from] PostprocessError),
}

/// 已加载的 YOLO26 检测器句柄
///
/// 检测需要 `&mut self`：同一句柄上的推理天然串行；
/// 多线程共享时由调用方自行加锁。
pub struct Yolo26<T = CocoLabel> {
  engine: Box<dyn InferenceEngine + Send>,
  config: ModelConfig,
  params: DetectParams,
  _phantom: std::marker::PhantomData<T>,
}

pub struct Yolo26Builder {
  config: ModelConfig,
  params: DetectParams,
}

impl FromUrlWithScheme for Yolo26Builder {
  const SCHEME: &'static str = YOLO26_SCHEME;
}

impl FromUrl for Yolo26Builder {
  type Error = Yolo26Error;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let (config, params) = parse_model_url(url)?;
    Ok(Yolo26Builder { config, params })
  }
}

impl Yolo26Builder {
  pub fn new(config: ModelConfig) -> Self {
    Self {
      config,
      params: DetectParams::default(),
    }
  }

  pub fn config(&self) -> &ModelConfig {
    &self.config
  }

  pub fn backend(mut self, backend: Backend) -> Self {
    self.config.backend = backend;
    self
  }

  pub fn input_size(mut self, size: u32) -> Self {
    self.config.input_size = size;
    self
  }

  pub fn num_classes(mut self, num_classes: usize) -> Self {
    self.config.num_classes = num_classes;
    self
  }

  pub fn normalization(mut self, normalization: Normalization) -> Self {
    self.config.normalization = normalization;
    self
  }

  pub fn params(mut self, params: DetectParams) -> Self {
    self.params = params;
    self
  }

  pub fn confidence_threshold(mut self, threshold: f32) -> Self {
    self.params.confidence_threshold = threshold;
    self
  }

  pub fn iou_threshold(mut self, threshold: f32) -> Self {
    self.params.iou_threshold = threshold;
    self
  }

  pub fn agnostic(mut self, agnostic: bool) -> Self {
    self.params.agnostic = agnostic;
    self
  }

  /// 按配置中的引擎类型加载模型
  pub fn build<T: WithLabel>(self) -> Result<Yolo26<T>, Yolo26Error> {
    info!("创建推理引擎: {:?}", self.config.engine);
    let engine: Box<dyn InferenceEngine + Send> = match self.config.engine {
      EngineKind::Replay => Box::new(ReplayEngine::load(&self.config)?),
      EngineKind::Onnx => load_onnx(&self.config)?,
    };
    self.finish(engine)
  }

  /// 使用调用方提供的推理引擎
  pub fn build_with_engine<T: WithLabel, E: InferenceEngine + Send + 'static>(
    self,
    engine: E,
  ) -> Result<Yolo26<T>, Yolo26Error> {
    self.finish(Box::new(engine))
  }

  fn finish<T: WithLabel>(
    self,
    engine: Box<dyn InferenceEngine + Send>,
  ) -> Result<Yolo26<T>, Yolo26Error> {
    if self.config.input_size == 0 {
      return Err(LetterboxError::InvalidTargetSize(0).into());
    }
    if self.config.num_classes == 0 {
      return Err(
        ConfigError::InvalidValue {
          key: "classes".to_string(),
          value: "0".to_string(),
        }
        .into(),
      );
    }

    if self.config.backend == Backend::Gpu && engine.backend() != Backend::Gpu {
      warn!("GPU 不可用，回退到 CPU");
    }

    debug!("模型配置: {:?}", self.config);
    debug!("检测参数: {:?}", self.params);
    info!("模型加载完成");

    Ok(Yolo26 {
      engine,
      config: self.config,
      params: self.params,
      _phantom: std::marker::PhantomData,
    })
  }
}

#[cfg(feature = "onnxruntime")]
fn load_onnx(config: &ModelConfig) -> Result<Box<dyn InferenceEngine + Send>, Yolo26Error> {
  Ok(Box::new(super::onnx::OrtEngine::load(config)?))
}

#[cfg(not(feature = "onnxruntime"))]
fn load_onnx(_config: &ModelConfig) -> Result<Box<dyn InferenceEngine + Send>, Yolo26Error> {
  Err(Yolo26Error::EngineUnavailable("onnx"))
}

impl<T: WithLabel> Yolo26<T> {
  pub fn config(&self) -> &ModelConfig {
    &self.config
  }

  pub fn params(&self) -> &DetectParams {
    &self.params
  }

  /// 推理引擎实际使用的后端，GPU 不可用时为 CPU
  pub fn backend(&self) -> Backend {
    self.engine.backend()
  }

  /// 使用加载时的默认阈值检测
  pub fn detect(&mut self, frame: &RgbFrame) -> Result<DetectResult<T>, Yolo26Error> {
    let params = self.params;
    self.detect_with(frame, &params)
  }

  pub fn detect_with(
    &mut self,
    frame: &RgbFrame,
    params: &DetectParams,
  ) -> Result<DetectResult<T>, Yolo26Error> {
    let transform =
      LetterboxTransform::compute(frame.width(), frame.height(), self.config.input_size)?;

    debug!("设置模型输入");
    let input = transform.apply(frame.image(), &self.config.normalization);

    debug!("执行模型推理");
    let tensor = self.engine.infer(&input)?;
    debug!("模型输出形状: {:?}", tensor.shape());

    let detections = postprocess(&tensor, &transform, self.config.num_classes, params)?;
    debug!("检测到 {} 个物体", detections.len());

    Ok(detections.into())
  }
}

impl<T: WithLabel> Model for Yolo26<T> {
  type Input = RgbFrame;
  type Output = DetectResult<T>;
  type Error = Yolo26Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.detect(input)
  }
}
