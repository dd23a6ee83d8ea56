//! 轮廓 (等值线) 的表示, 提取与凸包.
//!
//! 所有坐标均为 `(h, w)` 顺序的像素中心坐标, 即像素 `(i, j)` 的中心为 `(i as f64, j as f64)`.

use crate::Idx2dF;
use itertools::Itertools;

mod hull;
mod march;

pub use hull::ConvexHull;
pub use march::find_contours;

/// 一条闭合的折线轮廓. 首尾两点重合 (或在容差内重合).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contour {
    points: Vec<Idx2dF>,
}

/// 从一张图像中提取出的全部轮廓. 不做嵌套关系的处理.
pub type ContourSet = Vec<Contour>;

impl From<Vec<Idx2dF>> for Contour {
    #[inline]
    fn from(points: Vec<Idx2dF>) -> Self {
        Self { points }
    }
}

/// 两点的欧几里得距离.
#[inline]
pub fn distance((h0, w0): Idx2dF, (h1, w1): Idx2dF) -> f64 {
    (h0 - h1).hypot(w0 - w1)
}

impl Contour {
    /// 直接创建. 不检查点数和闭合性, 由使用者 (如 [`crate::segment::select`]) 负责过滤.
    #[inline]
    pub fn new(points: Vec<Idx2dF>) -> Self {
        Self { points }
    }

    /// 以 `center` 为圆心, `radius` 为半径, 均匀取 `n` 个点构成的闭合圆轮廓 (共 `n + 1` 个点).
    pub fn circle((ch, cw): Idx2dF, radius: f64, n: usize) -> Self {
        let mut points: Vec<Idx2dF> = (0..n)
            .map(|i| {
                let theta = std::f64::consts::TAU * i as f64 / n as f64;
                (ch + radius * theta.sin(), cw + radius * theta.cos())
            })
            .collect();
        if let Some(&first) = points.first() {
            points.push(first);
        }
        Self { points }
    }

    /// 所有点.
    #[inline]
    pub fn points(&self) -> &[Idx2dF] {
        &self.points
    }

    /// 点的个数 (含重复的终点).
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有任何点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 首尾两点的欧几里得距离. 空轮廓返回 `None`.
    pub fn closure_distance(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(distance(*first, *last))
    }

    /// 折线围成的多边形面积 (鞋带公式, 取绝对值). 不要求首尾重复.
    pub fn polygon_area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let twice: f64 = self
            .points
            .iter()
            .circular_tuple_windows()
            .map(|(&(h0, w0), &(h1, w1))| w0 * h1 - w1 * h0)
            .sum();
        twice.abs() / 2.0
    }

    /// 所有点的包围盒 `((h_min, w_min), (h_max, w_max))`. 空轮廓返回 `None`.
    pub fn bounds(&self) -> Option<(Idx2dF, Idx2dF)> {
        let (&first, rest) = self.points.split_first()?;
        let (mut lo, mut hi) = (first, first);
        for &(h, w) in rest {
            lo = (lo.0.min(h), lo.1.min(w));
            hi = (hi.0.max(h), hi.1.max(w));
        }
        Some((lo, hi))
    }
}
