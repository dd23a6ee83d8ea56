//! 二维 k-d 树, 用于查询最近的轮廓点.

use crate::Idx2dF;

/// 静态二维 k-d 树.
///
/// 构建时按深度交替以 `h`, `w` 为轴, 每层取中位数作为分割点. 树以隐式方式保存:
/// 任意子切片的中点即为该子树的根, 左右两半分别为左右子树.
#[derive(Clone, Debug, Default)]
pub struct KdTree {
    points: Vec<Idx2dF>,
}

#[inline]
fn coord((h, w): Idx2dF, depth: usize) -> f64 {
    if depth % 2 == 0 {
        h
    } else {
        w
    }
}

#[inline]
fn dist2((h0, w0): Idx2dF, (h1, w1): Idx2dF) -> f64 {
    (h0 - h1).powi(2) + (w0 - w1).powi(2)
}

fn build(points: &mut [Idx2dF], depth: usize) {
    if points.len() <= 1 {
        return;
    }
    let mid = points.len() / 2;
    points.select_nth_unstable_by(mid, |a, b| {
        coord(*a, depth).total_cmp(&coord(*b, depth))
    });
    let (left, right) = points.split_at_mut(mid);
    build(left, depth + 1);
    build(&mut right[1..], depth + 1);
}

/// 当前最优: `(距离平方, 点)`.
type Best = Option<(f64, Idx2dF)>;

fn nearest_in(points: &[Idx2dF], depth: usize, query: Idx2dF, best: &mut Best) {
    if points.is_empty() {
        return;
    }
    let mid = points.len() / 2;
    let p = points[mid];
    let d = dist2(p, query);
    if best.map_or(true, |(bd, _)| d < bd) {
        *best = Some((d, p));
    }

    let diff = coord(query, depth) - coord(p, depth);
    let (near, far) = if diff < 0.0 {
        (&points[..mid], &points[mid + 1..])
    } else {
        (&points[mid + 1..], &points[..mid])
    };
    nearest_in(near, depth + 1, query, best);
    if best.map_or(true, |(bd, _)| diff * diff < bd) {
        nearest_in(far, depth + 1, query, best);
    }
}

impl KdTree {
    /// 由点集构建. 含有非有限坐标的点被忽略.
    pub fn new<I: IntoIterator<Item = Idx2dF>>(points: I) -> Self {
        let mut points: Vec<Idx2dF> = points
            .into_iter()
            .filter(|(h, w)| h.is_finite() && w.is_finite())
            .collect();
        build(&mut points, 0);
        Self { points }
    }

    /// 点的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空树.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 与 `query` 最近的点及其欧几里得距离. 空树返回 `None`.
    pub fn nearest(&self, query: Idx2dF) -> Option<(Idx2dF, f64)> {
        let mut best = None;
        nearest_in(&self.points, 0, query, &mut best);
        best.map(|(d, p)| (p, d.sqrt()))
    }

    /// 是否存在与 `query` 距离不超过 `radius` 的点.
    pub fn any_within(&self, query: Idx2dF, radius: f64) -> bool {
        self.nearest(query).map_or(false, |(_, d)| d <= radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(points: &[Idx2dF], q: Idx2dF) -> f64 {
        points
            .iter()
            .map(|&p| dist2(p, q))
            .fold(f64::INFINITY, f64::min)
            .sqrt()
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut sample = || rng.gen_range(0.0..100.0);
        let points: Vec<Idx2dF> = (0..500).map(|_| (sample(), sample())).collect();
        let tree = KdTree::new(points.iter().copied());
        assert_eq!(tree.len(), 500);

        for _ in 0..200 {
            let q = (rng.gen_range(-10.0..110.0), rng.gen_range(-10.0..110.0));
            let (_, d) = tree.nearest(q).unwrap();
            assert!((d - brute_force(&points, q)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_exact_hit_and_radius() {
        let tree = KdTree::new([(1.0, 1.0), (5.5, 2.0), (3.0, 7.25)]);
        assert_eq!(tree.nearest((5.5, 2.0)), Some(((5.5, 2.0), 0.0)));
        assert!(tree.any_within((3.0, 7.3), 0.1));
        assert!(!tree.any_within((3.0, 7.5), 0.1));
    }

    #[test]
    fn test_empty_and_non_finite() {
        let tree = KdTree::new([(f64::NAN, 0.0)]);
        assert!(tree.is_empty());
        assert_eq!(tree.nearest((0.0, 0.0)), None);
        assert!(!tree.any_within((0.0, 0.0), 1e9));
    }
}
