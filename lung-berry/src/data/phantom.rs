use super::{CtSlice, Spacing};
use crate::{Idx2d, Idx2dF};
use ndarray::Array2;

/// 合成的 2D CT 切片, 由若干实心圆盘与矩形叠加在均匀背景上构成.
///
/// 后添加的形状覆盖先添加的. 主要用于测试, 以及在没有真实数据时演示整个流程.
///
/// ```
/// use lung_berry::SlicePhantom;
///
/// let slice = SlicePhantom::new((64, 64), 40.0)
///     .disc((32.0, 20.0), 10.0, -850.0)
///     .build();
/// assert_eq!(slice[(32, 20)], -850.0);
/// assert_eq!(slice[(0, 0)], 40.0);
/// ```
#[derive(Clone, Debug)]
pub struct SlicePhantom {
    data: Array2<f32>,
    spacing: Spacing,
}

impl SlicePhantom {
    /// 形状为 `shape`, 所有像素均为 `background_hu` 的切片.
    pub fn new(shape: Idx2d, background_hu: f32) -> Self {
        Self {
            data: Array2::from_elem(shape, background_hu),
            spacing: Spacing::unit(),
        }
    }

    /// 设置像素分辨率. 默认为 [`Spacing::unit`].
    pub fn spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = spacing;
        self
    }

    /// 以 `center` 为圆心, `radius` 为半径画实心圆盘. 像素中心落在圆内 (含边界) 即被覆盖.
    pub fn disc(mut self, (ch, cw): Idx2dF, radius: f64, hu: f32) -> Self {
        let r2 = radius * radius;
        for ((h, w), v) in self.data.indexed_iter_mut() {
            let (dh, dw) = (h as f64 - ch, w as f64 - cw);
            if dh * dh + dw * dw <= r2 {
                *v = hu;
            }
        }
        self
    }

    /// 以 `(h0, w0)` (含) 到 `(h1, w1)` (不含) 为范围画实心矩形. 超出图像的部分被忽略.
    pub fn rect(mut self, (h0, w0): Idx2d, (h1, w1): Idx2d, hu: f32) -> Self {
        let (height, width) = self.data.dim();
        for h in h0..h1.min(height) {
            for w in w0..w1.min(width) {
                self.data[(h, w)] = hu;
            }
        }
        self
    }

    /// 生成切片.
    pub fn build(self) -> CtSlice {
        CtSlice::new(self.data, self.spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phantom_shapes() {
        let s = SlicePhantom::new((20, 30), 0.0)
            .spacing(Spacing::new(0.5, 0.5))
            .rect((2, 2), (6, 40), -100.0)
            .disc((10.0, 10.0), 2.0, -900.0)
            .build();
        assert_eq!(s.shape(), (20, 30));
        assert_eq!(s.spacing(), Spacing::new(0.5, 0.5));
        assert_eq!(s[(2, 29)], -100.0);
        assert_eq!(s[(6, 2)], 0.0);
        assert_eq!(s[(12, 10)], -900.0);
        assert_eq!(s[(12, 11)], 0.0);

        let covered = s.indexed_iter().filter(|(_, &v)| v == -900.0).count();
        // r = 2 时覆盖 13 个像素中心.
        assert_eq!(covered, 13);
    }
}
