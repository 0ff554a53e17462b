// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/json_record.rs - 检测结果 JSON 记录
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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, decode_url_path,
  frame::RgbFrame,
  model::{DetectResult, WithLabel},
  output::Render,
};

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ImageRecord {
  width: u32,
  height: u32,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
  label: String,
  class_id: u32,
  score: f32,
  /// 原图坐标 `[x, y, width, height]`
  bbox: [f32; 4],
}

#[derive(Debug, Serialize)]
struct FrameRecord {
  timestamp: String,
  image: ImageRecord,
  detections: Vec<DetectionRecord>,
}

/// 将每帧检测结果写成 JSON 文件
///
/// `json:///path/to/result.json?record=id` 时标签记录为类别编号，否则记录类别名称。
pub struct JsonRecordOutput {
  path: PathBuf,
  label_with_name: bool,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonRecordOutputError::SchemeMismatch);
    }

    let label_with_name = !uri.query_pairs().any(|(k, v)| k == "record" && v == "id");

    Ok(JsonRecordOutput {
      path: PathBuf::from(decode_url_path(uri)),
      label_with_name,
    })
  }
}

impl JsonRecordOutput {
  pub fn new<P: Into<PathBuf>>(path: P, label_with_name: bool) -> Self {
    Self {
      path: path.into(),
      label_with_name,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn record<T: WithLabel>(&self, frame: &RgbFrame, result: &DetectResult<T>) -> FrameRecord {
    let detections = result
      .items
      .iter()
      .map(|item| DetectionRecord {
        label: if self.label_with_name {
          item.kind.to_label_str()
        } else {
          item.kind.to_label_id().to_string()
        },
        class_id: item.kind.to_label_id(),
        score: item.score,
        bbox: [item.bbox.x, item.bbox.y, item.bbox.width, item.bbox.height],
      })
      .collect();

    FrameRecord {
      timestamp: Utc::now().to_rfc3339(),
      image: ImageRecord {
        width: frame.width(),
        height: frame.height(),
      },
      detections,
    }
  }
}

impl<T: WithLabel> Render<RgbFrame, DetectResult<T>> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn render_result(&self, frame: &RgbFrame, result: &DetectResult<T>) -> Result<(), Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let record = self.record(frame, result);
    let mut writer = BufWriter::new(File::create(&self.path)?);
    serde_json::to_writer_pretty(&mut writer, &record)?;
    writer.flush()?;

    info!(
      "写入 {} 条检测记录到: {}",
      record.detections.len(),
      self.path.display()
    );
    Ok(())
  }
}
