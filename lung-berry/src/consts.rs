//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 内部处理时, 掩膜背景的像素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 内部处理时, 掩膜前景的像素值.
    pub const MASK_FOREGROUND: u8 = 1;

    /// 持久化存储时, 掩膜前景的像素值.
    pub const SINK_FOREGROUND: u8 = 255;

    /// 像素是否是前景? 任何非零值都视为前景.
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p >= MASK_FOREGROUND
    }

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, MASK_BACKGROUND)
    }
}

/// 常用 CT HU 值.
pub mod hu {
    /// 空气.
    pub const AIR: f32 = -1000.0;

    /// 肺部 HU 窗口下限.
    pub const LUNG_MIN: f32 = -1000.0;

    /// 肺部 HU 窗口上限.
    pub const LUNG_MAX: f32 = -300.0;

    /// 血管 HU 下限. 肺内不低于该值的像素被视为血管.
    pub const VESSEL_FLOOR: f32 = -500.0;
}

/// 二值图的等值线提取值.
pub const ISO_LEVEL: f64 = 0.5;

/// 肺轮廓凸包面积的最小值 (平方像素). 不超过该值的轮廓不可能是肺.
pub const MIN_HULL_AREA: f64 = 2000.0;

/// 轮廓首尾闭合距离的容差 (像素).
pub const CLOSURE_TOLERANCE: f64 = 1.0;

/// 血管去噪距离容差 (像素).
pub const DENOISE_TOLERANCE: f64 = 0.1;
