use crate::error::GeometryDegenerate;
use crate::Idx2dF;

/// 二维点集的凸包. 顶点按逆时针 (在 `(h, w)` 坐标系下) 排列, 首尾不重复.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHull {
    vertices: Vec<Idx2dF>,
}

/// `(b - a) x (c - a)`.
#[inline]
fn cross((ah, aw): Idx2dF, (bh, bw): Idx2dF, (ch, cw): Idx2dF) -> f64 {
    (bh - ah) * (cw - aw) - (bw - aw) * (ch - ah)
}

impl ConvexHull {
    /// 以 Andrew 单调链算法求 `points` 的凸包. 重复点与共线点均被剔除.
    ///
    /// 不足 3 个不同的点, 或所有点共线时凸包无定义, 返回 [`GeometryDegenerate`].
    /// 含有非有限坐标时同样返回该错误.
    pub fn new(points: &[Idx2dF]) -> Result<Self, GeometryDegenerate> {
        if points.iter().any(|(h, w)| !h.is_finite() || !w.is_finite()) {
            return Err(GeometryDegenerate);
        }
        let mut pts = points.to_vec();
        pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        pts.dedup();
        if pts.len() < 3 {
            return Err(GeometryDegenerate);
        }

        let mut lower: Vec<Idx2dF> = Vec::with_capacity(pts.len());
        for &p in pts.iter() {
            while lower.len() >= 2
                && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0
            {
                lower.pop();
            }
            lower.push(p);
        }
        let mut upper: Vec<Idx2dF> = Vec::with_capacity(pts.len());
        for &p in pts.iter().rev() {
            while upper.len() >= 2
                && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0
            {
                upper.pop();
            }
            upper.push(p);
        }
        // 两条链的端点互相重复.
        lower.pop();
        upper.pop();
        lower.extend(upper);

        if lower.len() < 3 {
            return Err(GeometryDegenerate);
        }
        Ok(Self { vertices: lower })
    }

    /// 凸包顶点.
    #[inline]
    pub fn vertices(&self) -> &[Idx2dF] {
        &self.vertices
    }

    /// 凸包面积 (2D 下的 "体积").
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let (h0, w0) = self.vertices[i];
                let (h1, w1) = self.vertices[(i + 1) % n];
                h0 * w1 - h1 * w0
            })
            .sum();
        twice.abs() / 2.0
    }
}
