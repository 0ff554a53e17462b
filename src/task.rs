// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 任务定义
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

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 取第一帧，推理一次并输出
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = Instant::now();
    let result = model.infer(&frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 对同一帧重复推理，统计平均耗时
#[derive(Debug, Clone, Copy)]
pub struct RepeatShotTask {
  repeat: usize,
  warmup: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self {
      repeat: 1000,
      warmup: 2,
    }
  }
}

impl RepeatShotTask {
  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat;
    self
  }

  /// 前 `warmup` 次推理不计入平均耗时
  pub fn with_warmup(mut self, warmup: usize) -> Self {
    self.warmup = warmup;
    self
  }
}

/// 跳过预热次数后的平均耗时，样本不足时返回 `None`
pub fn mean_duration(times: &[Duration], warmup: usize) -> Option<Duration> {
  let measured = times.get(warmup..)?;
  if measured.is_empty() {
    return None;
  }
  Some(measured.iter().sum::<Duration>() / measured.len() as u32)
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let mut times = Vec::with_capacity(self.repeat);
    for i in 0..self.repeat {
      let now = Instant::now();
      let result = model.infer(&frame)?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      output.render_result(&frame, &result)?;
      info!("({})渲染完成，耗时: {:.2?}", i, now.elapsed());
      times.push(elapsed);
    }

    match mean_duration(&times, self.warmup) {
      Some(mean) => warn!("平均推理时间: {:.2?}", mean),
      None => warn!("推理次数不足 {} 次，无法统计平均推理时间", self.warmup + 1),
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;
  use std::convert::Infallible;

  struct Doubler;

  impl Model for Doubler {
    type Input = u32;
    type Output = u32;
    type Error = std::io::Error;

    fn infer(&mut self, input: &u32) -> Result<u32, Self::Error> {
      Ok(input * 2)
    }
  }

  #[derive(Default)]
  struct Collect {
    seen: Cell<usize>,
    last: Cell<u32>,
  }

  impl Render<u32, u32> for &Collect {
    type Error = Infallible;

    fn render_result(&self, _frame: &u32, result: &u32) -> Result<(), Self::Error> {
      self.seen.set(self.seen.get() + 1);
      self.last.set(*result);
      Ok(())
    }
  }

  #[test]
  fn one_shot_renders_first_frame() {
    let sink = Collect::default();
    OneShotTask
      .run_task(vec![3u32, 5].into_iter(), Doubler, &sink)
      .unwrap();
    assert_eq!(sink.seen.get(), 1);
    assert_eq!(sink.last.get(), 6);
  }

  #[test]
  fn one_shot_without_frame_fails() {
    let sink = Collect::default();
    let err = OneShotTask.run_task(std::iter::empty::<u32>(), Doubler, &sink);
    assert!(err.is_err());
    assert_eq!(sink.seen.get(), 0);
  }

  #[test]
  fn repeat_shot_runs_requested_times() {
    let sink = Collect::default();
    RepeatShotTask::default()
      .with_repeat(5)
      .run_task(std::iter::once(4u32), Doubler, &sink)
      .unwrap();
    assert_eq!(sink.seen.get(), 5);
    assert_eq!(sink.last.get(), 8);
  }

  #[test]
  fn mean_skips_warmup() {
    let times = [
      Duration::from_millis(100),
      Duration::from_millis(50),
      Duration::from_millis(10),
      Duration::from_millis(20),
    ];
    assert_eq!(mean_duration(&times, 2), Some(Duration::from_millis(15)));
    assert_eq!(mean_duration(&times, 4), None);
    assert_eq!(mean_duration(&times, 9), None);
  }
}
