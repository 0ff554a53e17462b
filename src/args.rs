// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// YOLO26 检测后处理参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址
  /// 示例:
  /// - yolo26://onnx/models/yolo26n.onnx?size=640&gpu=1
  /// - yolo26://replay/dumps/output.json?classes=80
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入来源，如 image:///data/bus.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// 支持格式:
  /// - 图片: image:///out/bus.png
  /// - JSON: json:///out/bus.json[?record=id]
  /// - 日志: log://
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 置信度阈值 (0.0 - 1.0)，覆盖模型地址中的 conf
  #[arg(long, value_name = "THRESHOLD")]
  pub confidence: Option<f32>,

  /// NMS IOU 阈值 (0.0 - 1.0)，覆盖模型地址中的 iou
  #[arg(long, value_name = "THRESHOLD")]
  pub nms_threshold: Option<f32>,

  /// 跨类别 NMS
  #[arg(long)]
  pub agnostic: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_optional_thresholds() {
    let args = Args::try_parse_from([
      "shanan-post",
      "--model",
      "yolo26://replay/tmp/dump.json",
      "--input",
      "image:///tmp/in.png",
      "--output",
      "log://",
      "--confidence",
      "0.3",
    ])
    .unwrap();
    assert_eq!(args.confidence, Some(0.3));
    assert_eq!(args.nms_threshold, None);
    assert!(!args.agnostic);
  }
}
