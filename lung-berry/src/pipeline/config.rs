//! 分割参数.

use crate::consts::{self, hu};
use crate::error::ConfigError;
use crate::segment::LungSelector;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// HU 区间 `[min, max]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HuBand {
    /// 下限.
    pub min: f32,
    /// 上限.
    pub max: f32,
}

impl HuBand {
    /// 直接创建.
    #[inline]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 肺部 HU 窗口 `[-1000, -300]`.
    #[inline]
    pub const fn lung() -> Self {
        Self::new(hu::LUNG_MIN, hu::LUNG_MAX)
    }
}

impl Default for HuBand {
    fn default() -> Self {
        Self::lung()
    }
}

/// 单张切片的分割参数. 默认值与参考行为一致.
///
/// ```
/// use lung_berry::pipeline::SegmentConfig;
///
/// let cfg = SegmentConfig::default().with_min_hull_area(1500.0);
/// assert!(cfg.validate().is_ok());
/// assert_eq!(cfg.vessel_hu_floor, -500.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SegmentConfig {
    /// 二值化所用的肺部 HU 窗口.
    pub lung_band: HuBand,

    /// 二值图上提取等值线的值.
    pub iso_level: f64,

    /// 血管 HU 下限.
    pub vessel_hu_floor: f32,

    /// 肺掩膜外 (以及乘积为 0 处) 填充的空气 HU 值.
    pub air_hu: f32,

    /// 肺轮廓凸包面积下限 (平方像素), 严格大于才通过.
    pub min_hull_area: f64,

    /// 轮廓首尾闭合距离容差 (像素).
    pub closure_tolerance: f64,

    /// 血管去噪距离容差 (像素).
    pub denoise_tolerance: f64,

    /// 是否进行血管去噪.
    pub denoise: bool,

    /// 单张切片的处理时间预算. `None` 表示不限制.
    pub slice_budget: Option<Duration>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            lung_band: HuBand::lung(),
            iso_level: consts::ISO_LEVEL,
            vessel_hu_floor: hu::VESSEL_FLOOR,
            air_hu: hu::AIR,
            min_hull_area: consts::MIN_HULL_AREA,
            closure_tolerance: consts::CLOSURE_TOLERANCE,
            denoise_tolerance: consts::DENOISE_TOLERANCE,
            denoise: true,
            slice_budget: None,
        }
    }
}

impl SegmentConfig {
    /// 设置肺部 HU 窗口.
    pub fn with_lung_band(mut self, min: f32, max: f32) -> Self {
        self.lung_band = HuBand::new(min, max);
        self
    }

    /// 设置血管 HU 下限.
    pub fn with_vessel_hu_floor(mut self, floor: f32) -> Self {
        self.vessel_hu_floor = floor;
        self
    }

    /// 设置凸包面积下限.
    pub fn with_min_hull_area(mut self, area: f64) -> Self {
        self.min_hull_area = area;
        self
    }

    /// 设置闭合距离容差.
    pub fn with_closure_tolerance(mut self, tolerance: f64) -> Self {
        self.closure_tolerance = tolerance;
        self
    }

    /// 设置去噪距离容差.
    pub fn with_denoise_tolerance(mut self, tolerance: f64) -> Self {
        self.denoise_tolerance = tolerance;
        self
    }

    /// 打开或关闭血管去噪.
    pub fn with_denoise(mut self, denoise: bool) -> Self {
        self.denoise = denoise;
        self
    }

    /// 设置单张切片的处理时间预算.
    pub fn with_slice_budget(mut self, budget: Option<Duration>) -> Self {
        self.slice_budget = budget;
        self
    }

    /// 由当前参数构造肺轮廓选取器.
    #[inline]
    pub fn selector(&self) -> LungSelector {
        LungSelector {
            min_hull_area: self.min_hull_area,
            closure_tolerance: self.closure_tolerance,
        }
    }

    /// 检查参数合法性.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = |name: &'static str, value: f64| {
            if value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::NotFinite { name, value })
            }
        };
        let non_negative = |name: &'static str, value: f64| {
            if value < 0.0 {
                Err(ConfigError::Negative { name, value })
            } else {
                Ok(())
            }
        };

        let HuBand { min, max } = self.lung_band;
        finite("lung_band.min", min as f64)?;
        finite("lung_band.max", max as f64)?;
        if min > max {
            return Err(ConfigError::InvertedBand { min, max });
        }
        finite("iso_level", self.iso_level)?;
        if !(0.0 < self.iso_level && self.iso_level < 1.0) {
            return Err(ConfigError::IsoLevelOutOfRange(self.iso_level));
        }
        finite("vessel_hu_floor", self.vessel_hu_floor as f64)?;
        finite("air_hu", self.air_hu as f64)?;
        for (name, value) in [
            ("min_hull_area", self.min_hull_area),
            ("closure_tolerance", self.closure_tolerance),
            ("denoise_tolerance", self.denoise_tolerance),
        ] {
            finite(name, value)?;
            non_negative(name, value)?;
        }
        Ok(())
    }
}
