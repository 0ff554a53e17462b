// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/config.rs - 模型加载配置
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

use std::{path::PathBuf, str::FromStr};

use thiserror::Error;
use url::Url;

use crate::{decode_url_path, letterbox::Normalization, postprocess::DetectParams};

pub const YOLO26_SCHEME: &str = "yolo26";
pub const YOLO26_INPUT_SIZE: u32 = 640;
pub const YOLO26_CLASS_NUM: usize = 80;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("模型路径必须使用 {expected} 方案, 实际为 {got}")]
  SchemeMismatch { expected: &'static str, got: String },
  #[error("未知的推理引擎: {0}")]
  UnknownEngine(String),
  #[error("参数 {key} 的值无效: {value}")]
  InvalidValue { key: String, value: String },
  #[error("未知参数: {0}")]
  UnknownKey(String),
}

/// 推理硬件后端偏好，具体选择由推理引擎决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
  #[default]
  Cpu,
  Gpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
  /// 回放 JSON 张量转储
  Replay,
  /// ONNX Runtime
  #[default]
  Onnx,
}

impl FromStr for EngineKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "replay" => Ok(EngineKind::Replay),
      "onnx" => Ok(EngineKind::Onnx),
      other => Err(ConfigError::UnknownEngine(other.to_string())),
    }
  }
}

/// 加载时确定、之后只读的模型配置
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
  pub engine: EngineKind,
  pub model: PathBuf,
  pub input_size: u32,
  pub num_classes: usize,
  pub normalization: Normalization,
  pub backend: Backend,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      engine: EngineKind::default(),
      model: PathBuf::from("yolo26n.onnx"),
      input_size: YOLO26_INPUT_SIZE,
      num_classes: YOLO26_CLASS_NUM,
      normalization: Normalization::default(),
      backend: Backend::default(),
    }
  }
}

fn invalid(key: &str, value: &str) -> ConfigError {
  ConfigError::InvalidValue {
    key: key.to_string(),
    value: value.to_string(),
  }
}

fn parse_value<V: FromStr>(key: &str, value: &str) -> Result<V, ConfigError> {
  value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value {
    "" | "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" => Ok(false),
    _ => Err(invalid(key, value)),
  }
}

fn parse_triplet(key: &str, value: &str) -> Result<[f32; 3], ConfigError> {
  let parts = value
    .split(',')
    .map(|v| parse_value::<f32>(key, v))
    .collect::<Result<Vec<_>, _>>()?;
  parts.try_into().map_err(|_| invalid(key, value))
}

/// 解析形如 `yolo26://onnx/models/yolo26n.onnx?size=640&gpu=1&conf=0.4` 的模型地址
///
/// 支持的参数：`size`、`classes`、`gpu`、`mean`、`norm`、`conf`、`iou`、`agnostic`。
pub fn parse_model_url(url: &Url) -> Result<(ModelConfig, DetectParams), ConfigError> {
  if url.scheme() != YOLO26_SCHEME {
    return Err(ConfigError::SchemeMismatch {
      expected: YOLO26_SCHEME,
      got: url.scheme().to_string(),
    });
  }

  let engine = url.host_str().unwrap_or_default().parse::<EngineKind>()?;
  let mut config = ModelConfig {
    engine,
    model: PathBuf::from(decode_url_path(url)),
    ..ModelConfig::default()
  };
  let mut params = DetectParams::default();

  for (key, value) in url.query_pairs() {
    match key.as_ref() {
      "size" => config.input_size = parse_value(&key, &value)?,
      "classes" => config.num_classes = parse_value(&key, &value)?,
      "gpu" => {
        config.backend = if parse_flag(&key, &value)? {
          Backend::Gpu
        } else {
          Backend::Cpu
        }
      }
      "mean" => config.normalization.mean = parse_triplet(&key, &value)?,
      "norm" => config.normalization.norm = parse_triplet(&key, &value)?,
      "conf" => params.confidence_threshold = parse_value(&key, &value)?,
      "iou" => params.iou_threshold = parse_value(&key, &value)?,
      "agnostic" => params.agnostic = parse_flag(&key, &value)?,
      other => return Err(ConfigError::UnknownKey(other.to_string())),
    }
  }

  if config.input_size == 0 {
    return Err(invalid("size", "0"));
  }
  if config.num_classes == 0 {
    return Err(invalid("classes", "0"));
  }

  Ok((config, params))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_reference_model() {
    let url = Url::parse("yolo26://onnx/models/yolo26n.onnx").unwrap();
    let (config, params) = parse_model_url(&url).unwrap();
    assert_eq!(config.engine, EngineKind::Onnx);
    assert_eq!(config.model, PathBuf::from("/models/yolo26n.onnx"));
    assert_eq!(config.input_size, 640);
    assert_eq!(config.num_classes, 80);
    assert_eq!(config.backend, Backend::Cpu);
    assert_eq!(params, DetectParams::default());
    assert_eq!(params.confidence_threshold, 0.5);
    assert_eq!(params.iou_threshold, 0.45);
  }

  #[test]
  fn query_overrides() {
    let url = Url::parse(
      "yolo26://replay/tmp/my%20dump.json?size=320&classes=2&gpu=1&mean=1,2,3&norm=0.5,0.5,0.5&conf=0.25&iou=0&agnostic",
    )
    .unwrap();
    let (config, params) = parse_model_url(&url).unwrap();
    assert_eq!(config.engine, EngineKind::Replay);
    assert_eq!(config.model, PathBuf::from("/tmp/my dump.json"));
    assert_eq!(config.input_size, 320);
    assert_eq!(config.num_classes, 2);
    assert_eq!(config.backend, Backend::Gpu);
    assert_eq!(config.normalization.mean, [1.0, 2.0, 3.0]);
    assert_eq!(config.normalization.norm, [0.5; 3]);
    assert_eq!(params.confidence_threshold, 0.25);
    assert_eq!(params.iou_threshold, 0.0);
    assert!(params.agnostic);
  }

  #[test]
  fn rejects_bad_urls() {
    let parse = |s: &str| parse_model_url(&Url::parse(s).unwrap()).unwrap_err();
    assert!(matches!(parse("image:///a.png"), ConfigError::SchemeMismatch { .. }));
    assert_eq!(
      parse("yolo26://tflite/a.bin"),
      ConfigError::UnknownEngine("tflite".to_string())
    );
    assert!(matches!(parse("yolo26://onnx/a.onnx?size=abc"), ConfigError::InvalidValue { .. }));
    assert!(matches!(parse("yolo26://onnx/a.onnx?size=0"), ConfigError::InvalidValue { .. }));
    assert!(matches!(parse("yolo26://onnx/a.onnx?mean=1,2"), ConfigError::InvalidValue { .. }));
    assert_eq!(
      parse("yolo26://onnx/a.onnx?threads=4"),
      ConfigError::UnknownKey("threads".to_string())
    );
  }
}
