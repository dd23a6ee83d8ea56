/// CT 窗口, 包含窗位 (window level) 和窗宽 (window width).
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CtWindow {
    level: f32,
    width: f32,
}

impl CtWindow {
    /// 构建 CT 窗.
    ///
    /// `level` 和 `width` 必须在合理范围内, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<CtWindow> {
        if (-1e5..=1e5).contains(&level) && 0.0 < width && width <= 1e5 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 由 HU 下限 `min` 和上限 `max` 构建 CT 窗. 要求 `min < max`.
    pub fn from_bounds(min: f32, max: f32) -> Option<CtWindow> {
        Self::new((min + max) / 2.0, max - min)
    }

    /// 肺部分割所用的 HU 区间 `[-1000, -300]`. 窗位为 -650, 窗宽为 700.
    #[inline]
    pub const fn lung_band() -> CtWindow {
        Self {
            level: -650.0,
            width: 700.0,
        }
    }

    /// 常见的肺窗. 窗位为 -600, 窗宽为 1500.
    #[inline]
    pub const fn from_lung_visual() -> CtWindow {
        Self {
            level: -600.0,
            width: 1500.0,
        }
    }

    /// 宽窗, 可以同时看到肺和骨骼. 窗位为 -200, 窗宽为 2000.
    #[inline]
    pub const fn from_wide_visual() -> CtWindow {
        Self {
            level: -200.0,
            width: 2000.0,
        }
    }

    /// 窗位为 -100, 窗宽为 1000.
    #[inline]
    pub const fn from_medium_visual() -> CtWindow {
        Self {
            level: -100.0,
            width: 1000.0,
        }
    }

    /// 纵隔窗, 窗位为 50, 窗宽为 350.
    #[inline]
    pub const fn from_mediastinum_visual() -> CtWindow {
        Self {
            level: 50.0,
            width: 350.0,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 将 `ct` HU 值裁剪到窗口范围内. NaN 原样返回.
    #[inline]
    pub fn clip(&self, ct: f32) -> f32 {
        ct.clamp(self.lower_bound(), self.upper_bound())
    }

    /// 求在当前 CT 窗设置下, `ct` HU 值对应的灰度图像素整数值 (0 <= value <= 255)
    ///
    /// 如果 `ct` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, ct: f32) -> Option<u8> {
        if !ct.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if ct <= lb {
            Some(u8::MIN)
        } else if ct >= self.upper_bound() {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((ct - lb) / self.width()) * 255.0) as u8)
        }
    }

    /// 求在当前 CT 窗设置下, `ct` HU 值对应的灰度图像素分布点 (0.0 <= value <= 255.0).
    ///
    /// 如果 `ct` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_f32(&self, ct: f32) -> Option<f32> {
        if !ct.is_finite() {
            return None;
        }
        Some((self.clip(ct) - self.lower_bound()) / self.width() * 255.0)
    }
}
