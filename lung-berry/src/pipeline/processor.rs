//! 单张切片的流程编排.

use super::{SegmentConfig, SliceResult};
use crate::contour::{find_contours, Contour};
use crate::error::{ConfigError, SliceError};
use crate::segment::{
    binarize, denoise_vessels, extract_vessels, physical_area, rasterize, LungSelection,
};
use crate::{CtSlice, Mask};
use log::debug;
use std::time::{Duration, Instant};

/// 单张切片的全部中间产物.
#[derive(Clone, Debug)]
pub struct SliceOutcome {
    /// 二值化结果.
    pub binary: Mask,

    /// 选中的肺轮廓.
    pub lungs: Vec<Contour>,

    /// 被剔除的身体外轮廓 (若有).
    pub body: Option<Contour>,

    /// 肺掩膜.
    pub lung_mask: Mask,

    /// 去噪后的血管掩膜.
    pub vessel_mask: Mask,

    /// 去噪时删除的像素个数.
    pub denoised: usize,

    /// 肺面积.
    pub lung_area: f64,

    /// 血管面积.
    pub vessel_area: f64,
}

/// 处理时间预算的计时器.
struct Stopwatch {
    start: Instant,
    budget: Option<Duration>,
}

impl Stopwatch {
    fn start(budget: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// 已超出预算时返回错误.
    fn check(&self) -> Result<(), SliceError> {
        match self.budget {
            Some(budget) if self.start.elapsed() > budget => Err(SliceError::BudgetExceeded {
                elapsed: self.start.elapsed(),
                budget,
            }),
            _ => Ok(()),
        }
    }
}

/// 按固定顺序执行各分割阶段:
/// 二值化 → 等值线提取 → 肺轮廓选取 → 光栅化 (肺掩膜, 肺面积)
/// → 血管提取 → 血管去噪 (血管掩膜, 血管面积) → 面积比.
///
/// 处理器只持有参数, 不持有任何切片数据, 因此可以在线程间共享.
#[derive(Clone, Debug)]
pub struct SliceProcessor {
    cfg: SegmentConfig,
}

impl SliceProcessor {
    /// 以 `cfg` 创建. 参数不合法时返回错误.
    pub fn new(cfg: SegmentConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// 参数.
    #[inline]
    pub fn config(&self) -> &SegmentConfig {
        &self.cfg
    }

    /// 处理单张切片, 返回全部中间产物.
    ///
    /// 找不到有效的肺轮廓对时返回 [`SliceError::Segmentation`], 此时不产生任何掩膜.
    /// 设置了时间预算时, 在每个阶段之间检查是否超时.
    pub fn process(&self, slice: &CtSlice) -> Result<SliceOutcome, SliceError> {
        let cfg = &self.cfg;
        let watch = Stopwatch::start(cfg.slice_budget);
        slice.check()?;

        let binary = binarize(slice.data(), cfg.lung_band.min, cfg.lung_band.max);
        let contours = find_contours(binary.view(), cfg.iso_level);
        debug!("traced {} closed contours", contours.len());
        watch.check()?;

        let (lungs, body) = match cfg.selector().select(contours) {
            LungSelection::Pair(pair) => (Vec::from(pair), None),
            LungSelection::BodyExcluded { lungs, body } => (lungs, Some(body)),
            LungSelection::Rejected(e) => return Err(e.into()),
        };
        watch.check()?;

        let lung_mask = rasterize(slice.shape(), &lungs)?;
        let lung_area = physical_area(&lung_mask, slice.spacing());
        watch.check()?;

        let candidates = extract_vessels(&lung_mask, slice, cfg.vessel_hu_floor, cfg.air_hu);
        let (vessel_mask, denoised) = if cfg.denoise {
            denoise_vessels(&candidates, &lungs, cfg.denoise_tolerance)
        } else {
            (candidates, 0)
        };
        let vessel_area = physical_area(&vessel_mask, slice.spacing());
        debug!(
            "lung area {lung_area:.2}, vessel area {vessel_area:.2}, {denoised} pixels denoised"
        );
        watch.check()?;

        Ok(SliceOutcome {
            binary,
            lungs,
            body,
            lung_mask,
            vessel_mask,
            denoised,
            lung_area,
            vessel_area,
        })
    }

    /// 处理单张切片并生成统计记录. 失败时记录中所有面积均不可用.
    pub fn run(&self, slice_id: &str, slice: &CtSlice) -> (SliceResult, Option<SliceOutcome>) {
        let start = Instant::now();
        match self.process(slice) {
            Ok(out) => {
                let result = SliceResult::processed(
                    slice_id.to_string(),
                    out.lung_area,
                    out.vessel_area,
                    start.elapsed(),
                );
                (result, Some(out))
            }
            Err(e) => (
                SliceResult::failed(slice_id.to_string(), e, start.elapsed()),
                None,
            ),
        }
    }
}
