//! 多张切片的批处理.

use super::{SliceProcessor, SliceResult};
use crate::error::{LoadError, SliceError};
use crate::sink::{MaskKind, MaskSink};
use crate::CtSlice;
use log::{info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 切片来源. 每张切片按下标独立加载, 因此可以被多个线程同时访问.
pub trait SliceSource: Sync {
    /// 切片个数.
    fn len(&self) -> usize;

    /// 是否没有任何切片.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 第 `index` 张切片的 id.
    fn slice_id(&self, index: usize) -> String;

    /// 加载第 `index` 张切片.
    fn load(&self, index: usize) -> Result<CtSlice, LoadError>;
}

/// 批处理结果汇总.
#[derive(Clone, Debug)]
pub struct BatchReport {
    /// 按切片 id 升序排列的全部结果.
    pub results: Vec<SliceResult>,

    /// 保存掩膜失败的次数.
    pub sink_errors: usize,

    /// 总耗时.
    pub elapsed: Duration,
}

impl BatchReport {
    /// 成功分割的切片个数.
    pub fn processed(&self) -> usize {
        self.results.iter().filter(|r| r.is_processed()).count()
    }

    /// 失败的切片个数.
    pub fn failed(&self) -> usize {
        self.results.len() - self.processed()
    }

    fn mean<F: Fn(&SliceResult) -> Option<f64>>(&self, f: F) -> Option<f64> {
        let (sum, n) = self
            .results
            .iter()
            .filter_map(f)
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// 成功切片的平均肺面积.
    pub fn mean_lung_area(&self) -> Option<f64> {
        self.mean(|r| r.lung_area)
    }

    /// 成功切片的平均血管/肺面积比.
    pub fn mean_vessel_ratio(&self) -> Option<f64> {
        self.mean(|r| r.vessel_ratio)
    }

    /// 耗时最长的切片.
    pub fn slowest(&self) -> Option<&SliceResult> {
        self.results.iter().max_by_key(|r| r.elapsed)
    }
}

/// 批处理器. 每张切片相互独立: 加载, 分割, 保存掩膜, 生成一条记录.
///
/// 单张切片的任何失败都只记录在它自己的 [`SliceResult`] 中, 不会中断批处理.
pub struct Batch<'a, S: SliceSource> {
    source: &'a S,
    processor: &'a SliceProcessor,
    masks: Option<&'a dyn MaskSink>,
}

#[cfg(feature = "rayon")]
fn map_indices<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..n).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "rayon"))]
fn map_indices<T, F>(n: usize, f: F) -> Vec<T>
where
    F: Fn(usize) -> T,
{
    (0..n).map(f).collect()
}

impl<'a, S: SliceSource> Batch<'a, S> {
    /// 创建. 默认不保存掩膜.
    pub fn new(source: &'a S, processor: &'a SliceProcessor) -> Self {
        Self {
            source,
            processor,
            masks: None,
        }
    }

    /// 成功分割的切片, 其肺掩膜和血管掩膜会交给 `sink` 保存.
    pub fn with_mask_sink(mut self, sink: &'a dyn MaskSink) -> Self {
        self.masks = Some(sink);
        self
    }

    fn run_one(&self, index: usize, sink_errors: &AtomicUsize) -> SliceResult {
        let start = Instant::now();
        let slice_id = self.source.slice_id(index);
        let slice = match self.source.load(index) {
            Ok(s) => s,
            Err(e) => {
                let e = SliceError::from(e);
                warn!("[{slice_id}] {e}");
                return SliceResult::failed(slice_id, e, start.elapsed());
            }
        };

        let (mut result, outcome) = self.processor.run(&slice_id, &slice);
        match (&outcome, self.masks) {
            (Some(out), Some(sink)) => {
                let masks = [
                    (MaskKind::Lung, &out.lung_mask),
                    (MaskKind::Vessel, &out.vessel_mask),
                ];
                for (kind, mask) in masks {
                    let saved =
                        sink.write_mask(&slice_id, kind, mask, slice.spacing(), slice.affine());
                    if let Err(e) = saved {
                        warn!("[{slice_id}] failed to save {kind:?} mask: {e}");
                        sink_errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            (None, _) => {
                if let Some(e) = result.error() {
                    warn!("[{slice_id}] {e}");
                }
            }
            _ => {}
        }
        result.elapsed = start.elapsed();
        result
    }

    /// 处理全部切片. 打开 `rayon` feature 时并行处理 (使用当前的 rayon 线程池).
    ///
    /// 结果最终按切片 id 排序, 与处理顺序无关.
    pub fn run(&self) -> BatchReport {
        let start = Instant::now();
        let sink_errors = AtomicUsize::new(0);
        let n = self.source.len();
        info!("processing {n} slices");

        let mut results = map_indices(n, |i| self.run_one(i, &sink_errors));
        results.sort_by(|a, b| a.slice_id.cmp(&b.slice_id));

        let report = BatchReport {
            results,
            sink_errors: sink_errors.into_inner(),
            elapsed: start.elapsed(),
        };
        info!(
            "{} processed, {} failed in {:?}",
            report.processed(),
            report.failed(),
            report.elapsed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemorySource;
    use crate::error::SinkError;
    use crate::pipeline::SegmentConfig;
    use crate::{Affine, Mask, SlicePhantom, Spacing};
    use std::sync::Mutex;

    fn lungs(offset: f64) -> CtSlice {
        SlicePhantom::new((200, 200), -1000.0)
            .disc((100.0, 100.0), 90.0, 40.0)
            .disc((100.0, 60.0), 30.0 + offset, -850.0)
            .disc((100.0, 140.0), 30.0, -850.0)
            .build()
    }

    fn source() -> MemorySource {
        let mut src = MemorySource::default();
        src.push("slice003", lungs(2.0));
        // 全是空气: 无法分割.
        src.push("slice001", SlicePhantom::new((50, 50), -1000.0).build());
        src.push("slice002", lungs(0.0));
        src.push(
            "slice000",
            CtSlice::new(ndarray::Array2::zeros((0, 3)), Spacing::unit()),
        );
        src
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, MaskKind)>>);

    impl MaskSink for Recorder {
        fn write_mask(
            &self,
            slice_id: &str,
            kind: MaskKind,
            mask: &Mask,
            _: Spacing,
            _: &Affine,
        ) -> Result<(), SinkError> {
            assert!(mask.view().iter().all(|&p| p <= 1));
            self.0.lock().unwrap().push((slice_id.to_string(), kind));
            Ok(())
        }
    }

    #[test]
    fn test_batch_sorted_and_isolated() {
        let src = source();
        let p = SliceProcessor::new(SegmentConfig::default()).unwrap();
        let rec = Recorder::default();
        let report = Batch::new(&src, &p).with_mask_sink(&rec).run();

        let ids: Vec<_> = report.results.iter().map(|r| r.slice_id.as_str()).collect();
        assert_eq!(ids, ["slice000", "slice001", "slice002", "slice003"]);
        assert_eq!(report.processed(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.sink_errors, 0);
        assert_eq!(report.results[0].status_label(), "invalid-input");
        assert_eq!(report.results[1].status_label(), "unsegmented");
        assert!(report.results[3].lung_area > report.results[2].lung_area);
        assert!(report.mean_lung_area().is_some());
        assert!(report.slowest().is_some());

        let mut written = rec.0.into_inner().unwrap();
        written.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(written.len(), 4);
        let ids: Vec<_> = written.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["slice002", "slice002", "slice003", "slice003"]);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let src = source();
        let p = SliceProcessor::new(SegmentConfig::default()).unwrap();
        let report = Batch::new(&src, &p).run();
        for i in 0..src.len() {
            let id = src.slice_id(i);
            let (expected, _) = p.run(&id, &src.load(i).unwrap());
            let r = report.results.iter().find(|r| r.slice_id == id).unwrap();
            assert_eq!(r.lung_area, expected.lung_area);
            assert_eq!(r.vessel_area, expected.vessel_area);
            assert_eq!(r.status, expected.status);
        }
    }

    #[test]
    fn test_empty_batch() {
        let src = MemorySource::default();
        let p = SliceProcessor::new(SegmentConfig::default()).unwrap();
        let report = Batch::new(&src, &p).run();
        assert!(report.results.is_empty());
        assert_eq!(report.mean_lung_area(), None);
        assert_eq!(report.slowest(), None);
    }
}
