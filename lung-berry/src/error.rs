//! 运行时错误.
//!
//! 所有切片级别的错误都只影响当前切片, 不会中断批处理.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 输入切片本身不合法. 对该切片是致命的, 对批处理不是.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// 切片没有任何像素.
    #[error("slice is empty")]
    Empty,

    /// 数据不是 2D 平面 (或去掉单元素维度后仍不是).
    #[error("slice is not planar, got shape {shape:?}")]
    NotPlanar {
        /// 原始形状.
        shape: Vec<usize>,
    },

    /// 像素分辨率缺失, 非正或不是有限值.
    #[error("invalid pixel spacing ({sx}, {sy})")]
    InvalidSpacing {
        /// 宽度方向分辨率.
        sx: f64,
        /// 高度方向分辨率.
        sy: f64,
    },
}

/// 找不到有效的肺轮廓对. 切片不会产生任何掩膜,
/// 其面积被标记为不可用 (而不是 0).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentationFailure {
    /// 通过过滤的轮廓少于两个.
    #[error("expected at least 2 lung contours, found {found}")]
    InsufficientContours {
        /// 实际通过过滤的个数.
        found: usize,
    },

    /// 轮廓点数少于 3 个, 无法构成多边形.
    #[error("contour has {points} points, at least 3 required")]
    TooFewPoints {
        /// 实际点数.
        points: usize,
    },
}

/// 凸包不存在 (点数不足, 或所有点共线).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("convex hull is degenerate")]
pub struct GeometryDegenerate;

/// 单张切片处理失败的原因.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SliceError {
    /// 输入不合法.
    #[error(transparent)]
    Input(#[from] InputError),

    /// 分割失败.
    #[error(transparent)]
    Segmentation(#[from] SegmentationFailure),

    /// 处理时间超出了预算.
    #[error("slice budget {budget:?} exceeded after {elapsed:?}")]
    BudgetExceeded {
        /// 已经花费的时间.
        elapsed: Duration,
        /// 预算.
        budget: Duration,
    },

    /// 切片加载失败. 底层错误不可克隆, 因此只保留其描述.
    #[error("failed to load slice: {0}")]
    Load(String),
}

/// 从数据源加载切片时的错误.
#[derive(Debug, Error)]
pub enum LoadError {
    /// nifti 读取错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// npy 读取错误.
    #[error("npy error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// 数据读取成功, 但内容不合法.
    #[error(transparent)]
    Input(#[from] InputError),

    /// 目录或文件访问失败.
    #[error("i/o error at {path:?}: {source}")]
    Io {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },
}

impl From<LoadError> for SliceError {
    fn from(value: LoadError) -> Self {
        match value {
            LoadError::Input(e) => SliceError::Input(e),
            other => SliceError::Load(other.to_string()),
        }
    }
}

/// 结果持久化错误.
#[derive(Debug, Error)]
pub enum SinkError {
    /// nifti 写入错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// CSV 写入错误.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// 图片写入错误.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 其他底层 I/O 错误.
    #[error("i/o error at {path:?}: {source}")]
    Io {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },
}

/// 配置参数不合法.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// 参数不是有限值.
    #[error("`{name}` must be finite, got {value}")]
    NotFinite {
        /// 参数名.
        name: &'static str,
        /// 参数值.
        value: f64,
    },

    /// HU 窗口上下限颠倒.
    #[error("lung band is inverted: min {min} > max {max}")]
    InvertedBand {
        /// 下限.
        min: f32,
        /// 上限.
        max: f32,
    },

    /// 参数不能为负.
    #[error("`{name}` must not be negative, got {value}")]
    Negative {
        /// 参数名.
        name: &'static str,
        /// 参数值.
        value: f64,
    },

    /// 二值图上的等值线必须严格位于 0 和 1 之间.
    #[error("iso level must lie strictly inside (0, 1), got {0}")]
    IsoLevelOutOfRange(f64),
}
