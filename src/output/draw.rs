// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};

use crate::{
  frame::RgbFrame,
  model::{DetectResult, WithLabel},
  postprocess::BoundingBox,
};

const BOX_THICKNESS: i32 = 2;
const LABEL_BAR_HEIGHT: u32 = 6;
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_PADDING: i32 = 2;
const LABEL_TEXT_COLOR: [u8; 3] = [255, 255, 255];

/// 按类别循环取色的调色板，由 BGR 排列的原始色表逐项反转为 RGB
pub const PALETTE: [[u8; 3]; 19] = [
  [244, 54, 67],
  [233, 99, 30],
  [156, 176, 39],
  [103, 183, 58],
  [63, 181, 81],
  [33, 243, 150],
  [3, 244, 169],
  [0, 212, 188],
  [0, 136, 150],
  [76, 80, 175],
  [139, 74, 195],
  [205, 57, 220],
  [255, 59, 235],
  [255, 7, 193],
  [255, 0, 152],
  [255, 34, 87],
  [121, 72, 85],
  [158, 158, 158],
  [96, 139, 125],
];

pub fn class_color(class_id: u32) -> [u8; 3] {
  PALETTE[class_id as usize % PALETTE.len()]
}

/// 标签文本：类别名与得分
pub fn label_text<T: WithLabel>(kind: &T, score: f32) -> String {
  format!("{} {:.2}", kind.to_label_str(), score)
}

/// 检测框绘制；提供字体时在框顶绘制标签文本，否则只绘制类别色条
pub struct Draw {
  thickness: i32,
  label_bar_height: u32,
  font_size: f32,
  text_padding: i32,
  font: Option<FontVec>,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      thickness: BOX_THICKNESS,
      label_bar_height: LABEL_BAR_HEIGHT,
      font_size: LABEL_FONT_SIZE,
      text_padding: LABEL_TEXT_PADDING,
      font: None,
    }
  }
}

/// 框在图像内的整数角点 `(x_min, y_min, x_max, y_max)`
type PixelRect = (i32, i32, i32, i32);

impl Draw {
  pub fn with_font(mut self, font: FontVec) -> Self {
    self.font = Some(font);
    self
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  /// 在原图坐标系下绘制一个边框，返回裁剪后的角点
  fn draw_bbox(
    &self,
    image: &mut RgbImage,
    bbox: &BoundingBox,
    color: [u8; 3],
  ) -> Option<PixelRect> {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return None;
    }

    let x_min = (bbox.x.floor() as i32).clamp(0, w - 1);
    let y_min = (bbox.y.floor() as i32).clamp(0, h - 1);
    let x_max = (bbox.right().ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox.bottom().ceil() as i32).clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
      return None;
    }

    for t in 0..self.thickness {
      let width = x_max - x_min - 2 * t;
      let height = y_max - y_min - 2 * t;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32 + 1, height as u32 + 1);
      draw_hollow_rect_mut(image, rect, Rgb(color));
    }

    Some((x_min, y_min, x_max, y_max))
  }

  fn draw_label_bar(&self, image: &mut RgbImage, corners: PixelRect, color: [u8; 3]) {
    let (x_min, y_min, x_max, _) = corners;
    let bar_width = (x_max - x_min + 1) as u32;
    let bar_top = (y_min - self.label_bar_height as i32).max(0);
    let bar_height = (y_min - bar_top) as u32;
    if bar_height > 0 {
      let bar = Rect::at(x_min, bar_top).of_size(bar_width, bar_height);
      draw_filled_rect_mut(image, bar, Rgb(color));
    }
  }

  fn draw_label_text(
    &self,
    image: &mut RgbImage,
    font: &FontVec,
    corners: PixelRect,
    label: &str,
    color: [u8; 3],
  ) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let (x_min, y_min, _, _) = corners;

    let scale = PxScale::from(self.font_size);
    let (text_width, text_height) = text_size(scale, font, label);
    let label_width = text_width as i32 + 2 * self.text_padding;
    let label_height = text_height as i32 + 2 * self.text_padding;

    // 标签放在框上方，超出右边界时左移
    let label_x = if x_min + label_width > w {
      (w - label_width).max(0)
    } else {
      x_min
    };
    let label_y = (y_min - label_height).max(0);

    let width = label_width.min(w - label_x);
    let height = label_height.min(h - label_y);
    if width <= 0 || height <= 0 {
      return;
    }

    let background = Rect::at(label_x, label_y).of_size(width as u32, height as u32);
    draw_filled_rect_mut(image, background, Rgb(color));
    draw_text_mut(
      image,
      Rgb(LABEL_TEXT_COLOR),
      label_x + self.text_padding,
      label_y + self.text_padding,
      scale,
      font,
      label,
    );
  }
}

pub trait DrawDetectionOnFrame<T: WithLabel> {
  fn draw_detection(&self, frame: &RgbFrame, result: &DetectResult<T>) -> RgbImage;
}

impl<T: WithLabel> DrawDetectionOnFrame<T> for Draw {
  fn draw_detection(&self, frame: &RgbFrame, result: &DetectResult<T>) -> RgbImage {
    let mut image = frame.image().clone();
    for item in result.items.iter() {
      let color = class_color(item.kind.to_label_id());
      let Some(corners) = self.draw_bbox(&mut image, &item.bbox, color) else {
        continue;
      };
      match &self.font {
        Some(font) => {
          let label = label_text(&item.kind, item.score);
          self.draw_label_text(&mut image, font, corners, &label, color);
        }
        None => self.draw_label_bar(&mut image, corners, color),
      }
    }
    image
  }
}
