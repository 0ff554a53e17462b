// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, decode_url_path,
  frame::RgbFrame,
  model::{DetectResult, WithLabel},
  output::{
    Render,
    draw::{Draw, DrawDetectionOnFrame},
  },
};

/// 在原图上绘制检测框并保存为图像文件
///
/// `image:///out.png?font=/path/DejaVuSans.ttf` 时在框顶绘制类别名与得分。
pub struct SaveImageFileOutput {
  path: PathBuf,
  draw: Draw,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("字体加载错误: {0}")]
  FontError(String),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut output = SaveImageFileOutput::new(decode_url_path(uri));
    if let Some((_, font_path)) = uri.query_pairs().find(|(k, _)| k == "font") {
      output = output.with_font_file(font_path.into_owned())?;
    }
    Ok(output)
  }
}

impl SaveImageFileOutput {
  pub fn new<P: Into<PathBuf>>(path: P) -> Self {
    Self {
      path: path.into(),
      draw: Draw::default(),
    }
  }

  /// 加载 TrueType/OpenType 字体用于绘制标签文本
  pub fn with_font_file<P: AsRef<Path>>(
    mut self,
    font_path: P,
  ) -> Result<Self, SaveImageFileError> {
    let font_path = font_path.as_ref();
    let data = std::fs::read(font_path)?;
    let font = FontVec::try_from_vec(data).map_err(|e| {
      SaveImageFileError::FontError(format!("{}: {}", font_path.display(), e))
    })?;
    info!("加载标签字体: {}", font_path.display());
    self.draw = self.draw.with_font(font);
    Ok(self)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;

    warn!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl<T: WithLabel> Render<RgbFrame, DetectResult<T>> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &RgbFrame, result: &DetectResult<T>) -> Result<(), Self::Error> {
    let image = self.draw.draw_detection(frame, result);
    self.save_image(image)
  }
}
