// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/pipeline_end_to_end.rs - 端到端检测流程测试
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

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use url::Url;

use shanan_post::{
  FromUrl,
  frame::{FrameError, PixelFormat, RgbFrame},
  model::{
    CocoLabel, ModelConfig, ReplayEngine, TensorDump, WithLabel, Yolo26, Yolo26Builder,
    Yolo26Error,
  },
  postprocess::PostprocessError,
  tensor::RawTensor,
};

const INPUT_SIZE: u32 = 64;
const NUM_CLASSES: usize = 2;

/// 一个候选框：中心点、宽高与各类别得分
struct Proposal {
  cx: f32,
  cy: f32,
  w: f32,
  h: f32,
  scores: [f32; NUM_CLASSES],
}

fn tensor_of(proposals: &[Proposal]) -> RawTensor {
  let n = proposals.len();
  let features = 4 + NUM_CLASSES;
  let mut data = vec![0.0f32; features * n];
  for (col, p) in proposals.iter().enumerate() {
    let column = [p.cx, p.cy, p.w, p.h, p.scores[0], p.scores[1]];
    for (row, value) in column.iter().enumerate() {
      data[row * n + col] = *value;
    }
  }
  RawTensor::from_shape_vec(&[1, features, n], data).unwrap()
}

fn config() -> ModelConfig {
  ModelConfig {
    input_size: INPUT_SIZE,
    num_classes: NUM_CLASSES,
    ..ModelConfig::default()
  }
}

fn detector(proposals: &[Proposal]) -> Yolo26<CocoLabel> {
  Yolo26Builder::new(config())
    .build_with_engine(ReplayEngine::new(tensor_of(proposals)))
    .unwrap()
}

fn square_frame() -> RgbFrame {
  RgbFrame::try_from(RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, Rgb([90, 90, 90]))).unwrap()
}

fn overlapping(second_class: usize) -> Vec<Proposal> {
  let mut second = [0.0; NUM_CLASSES];
  second[second_class] = 0.8;
  vec![
    Proposal {
      cx: 20.0,
      cy: 20.0,
      w: 20.0,
      h: 20.0,
      scores: [0.9, 0.0],
    },
    Proposal {
      cx: 22.0,
      cy: 22.0,
      w: 20.0,
      h: 20.0,
      scores: second,
    },
  ]
}

#[test]
fn overlapping_same_class_keeps_highest_score() {
  let mut model = detector(&overlapping(0));
  let result = model.detect(&square_frame()).unwrap();

  assert_eq!(result.len(), 1);
  let item = &result.items[0];
  assert_eq!(item.kind.to_label_id(), 0);
  assert_eq!(item.score, 0.9);
  assert!((item.bbox.x - 10.0).abs() < 1e-4);
  assert!((item.bbox.width - 20.0).abs() < 1e-4);
}

#[test]
fn overlapping_different_classes_are_both_kept() {
  let mut model = detector(&overlapping(1));
  let result = model.detect(&square_frame()).unwrap();

  assert_eq!(result.len(), 2);
  let mut classes: Vec<u32> = result.items.iter().map(|i| i.kind.to_label_id()).collect();
  classes.sort_unstable();
  assert_eq!(classes, vec![0, 1]);
}

#[test]
fn agnostic_suppression_ignores_class() {
  let mut model = Yolo26Builder::new(config())
    .agnostic(true)
    .build_with_engine::<CocoLabel, _>(ReplayEngine::new(tensor_of(&overlapping(1))))
    .unwrap();
  let result = model.detect(&square_frame()).unwrap();

  assert_eq!(result.len(), 1);
  assert_eq!(result.items[0].kind.to_label_id(), 0);
}

#[test]
fn high_threshold_yields_empty_result() {
  let mut model = detector(&overlapping(1));
  let params = shanan_post::postprocess::DetectParams {
    confidence_threshold: 0.99,
    ..*model.params()
  };
  let result = model.detect_with(&square_frame(), &params).unwrap();
  assert!(result.is_empty());
}

#[test]
fn results_are_ordered_by_area() {
  let proposals = vec![
    Proposal {
      cx: 10.0,
      cy: 10.0,
      w: 8.0,
      h: 8.0,
      scores: [0.95, 0.0],
    },
    Proposal {
      cx: 40.0,
      cy: 40.0,
      w: 20.0,
      h: 16.0,
      scores: [0.0, 0.6],
    },
  ];
  let mut model = detector(&proposals);
  let result = model.detect(&square_frame()).unwrap();

  assert_eq!(result.len(), 2);
  assert!(result.items[0].bbox.area() >= result.items[1].bbox.area());
  assert_eq!(result.items[0].kind.to_label_id(), 1);
}

#[test]
fn wrong_class_count_is_shape_mismatch() {
  let mut model = Yolo26Builder::new(config())
    .num_classes(80)
    .build_with_engine::<CocoLabel, _>(ReplayEngine::new(tensor_of(&overlapping(0))))
    .unwrap();

  let err = model.detect(&square_frame()).unwrap_err();
  assert!(matches!(
    err,
    Yolo26Error::PostprocessError(PostprocessError::ShapeMismatch {
      expected_features: 84,
      got_features: 6,
    })
  ));
}

#[test]
fn invalid_frames_are_rejected() {
  assert!(matches!(
    RgbFrame::try_from(RgbImage::new(0, 10)),
    Err(FrameError::InvalidDimensions { .. })
  ));
  assert!(matches!(
    RgbFrame::try_from(DynamicImage::ImageLuma8(GrayImage::new(2, 2))),
    Err(FrameError::UnsupportedPixelFormat(_))
  ));
  assert!(matches!(
    RgbFrame::from_raw(2, 2, PixelFormat::Rgb8, &[0; 11]),
    Err(FrameError::BufferSizeMismatch { .. })
  ));
}

#[test]
fn boxes_stay_inside_non_square_image() {
  // 128x64 缩放为 64x32，上下各填充 16 像素
  let proposals = vec![
    Proposal {
      cx: 60.0,
      cy: 20.0,
      w: 20.0,
      h: 10.0,
      scores: [0.7, 0.0],
    },
    Proposal {
      cx: 2.0,
      cy: 46.0,
      w: 12.0,
      h: 8.0,
      scores: [0.0, 0.8],
    },
  ];
  let mut model = detector(&proposals);
  let frame = RgbFrame::try_from(RgbImage::new(128, 64)).unwrap();
  let result = model.detect(&frame).unwrap();

  assert_eq!(result.len(), 2);
  for item in result.items.iter() {
    assert!(item.bbox.x >= 0.0 && item.bbox.y >= 0.0);
    assert!(item.bbox.width >= 0.0 && item.bbox.height >= 0.0);
    assert!(item.bbox.right() <= 127.0 + 1e-4);
    assert!(item.bbox.bottom() <= 63.0 + 1e-4);
  }

  let right_edge = result
    .items
    .iter()
    .find(|i| i.kind.to_label_id() == 0)
    .unwrap();
  assert!((right_edge.bbox.x - 100.0).abs() < 1e-3);
  assert!((right_edge.bbox.width - 27.0).abs() < 1e-3);
  assert!(right_edge.bbox.y.abs() < 1e-3);
  assert!((right_edge.bbox.height - 18.0).abs() < 1e-3);
}

#[test]
fn replay_model_loads_from_url() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("dump.json");
  let dump = TensorDump::from_tensor(&tensor_of(&overlapping(0)));
  std::fs::write(&path, serde_json::to_string(&dump).unwrap()).unwrap();

  let url = format!(
    "yolo26://replay{}?size={}&classes={}&conf=0.85",
    path.display(),
    INPUT_SIZE,
    NUM_CLASSES
  );
  let mut model: Yolo26<CocoLabel> = Yolo26Builder::from_url(&Url::parse(&url).unwrap())
    .unwrap()
    .build()
    .unwrap();
  assert_eq!(model.params().confidence_threshold, 0.85);

  let result = model.detect(&square_frame()).unwrap();
  assert_eq!(result.len(), 1);
  assert_eq!(result.items[0].kind.to_label_str(), "person");
}

#[cfg(not(feature = "onnxruntime"))]
#[test]
fn onnx_engine_requires_feature() {
  let url = Url::parse("yolo26://onnx/models/yolo26n.onnx").unwrap();
  let err = Yolo26Builder::from_url(&url)
    .unwrap()
    .build::<CocoLabel>()
    .err()
    .unwrap();
  assert!(matches!(err, Yolo26Error::EngineUnavailable("onnx")));
}
