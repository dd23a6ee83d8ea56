//! Marching squares 等值线提取.

use super::{Contour, ContourSet};
use crate::Idx2dF;
use ndarray::ArrayView2;
use std::collections::{BTreeMap, BTreeSet};

/// 网格边. 等值线与网格边的交点以所在的边唯一标识.
///
/// * `Row(r, c)`: `(r, c)` 与 `(r, c + 1)` 之间的水平边.
/// * `Col(r, c)`: `(r, c)` 与 `(r + 1, c)` 之间的竖直边.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Edge {
    Row(usize, usize),
    Col(usize, usize),
}

/// 交点图. 每条边最多与两条边相连; 只有一个邻居的边位于图像边界上.
#[derive(Default)]
struct EdgeGraph {
    links: BTreeMap<Edge, Vec<Edge>>,
    points: BTreeMap<Edge, Idx2dF>,
}

impl EdgeGraph {
    fn link(&mut self, a: Edge, b: Edge) {
        self.links.entry(a).or_default().push(b);
        self.links.entry(b).or_default().push(a);
    }

    /// 从 `start` 出发沿图行走, 直到走到尽头或回到 `start`. 返回经过的所有边.
    fn walk(&self, start: Edge, visited: &mut BTreeSet<Edge>) -> Vec<Edge> {
        let mut path = vec![start];
        visited.insert(start);
        let mut prev = None;
        let mut cur = start;
        loop {
            let next = self.links[&cur]
                .iter()
                .copied()
                .find(|e| Some(*e) != prev && !visited.contains(e));
            match next {
                Some(e) => {
                    visited.insert(e);
                    path.push(e);
                    prev = Some(cur);
                    cur = e;
                }
                None => return path,
            }
        }
    }
}

/// 在 `field` 上以 `level` 为等值提取所有 **闭合** 等值线.
///
/// 数值严格大于 `level` 的格点视为 "高". 鞍点 (对角两格点为高) 总是把两个高格点分开,
/// 即高值区域按 4-邻接连通, 低值区域按 8-邻接连通.
///
/// 触及图像边界的开放等值线会被丢弃. 每条闭合轮廓从其最小的边开始, 终点重复起点,
/// 至少包含 5 个点. 轮廓按起点排序, 因此对于相同输入, 输出完全确定.
///
/// 含有非有限值的网格单元被跳过.
pub fn find_contours<A>(field: ArrayView2<'_, A>, level: f64) -> ContourSet
where
    A: Copy + Into<f64>,
{
    let (height, width) = field.dim();
    if height < 2 || width < 2 {
        return vec![];
    }
    let v = |r: usize, c: usize| -> f64 { field[(r, c)].into() };

    let mut graph = EdgeGraph::default();
    let crossing = |graph: &mut EdgeGraph, e: Edge| {
        graph.points.entry(e).or_insert_with(|| {
            let ((r0, c0), (r1, c1)) = match e {
                Edge::Row(r, c) => ((r, c), (r, c + 1)),
                Edge::Col(r, c) => ((r, c), (r + 1, c)),
            };
            let (va, vb) = (v(r0, c0), v(r1, c1));
            let t = (level - va) / (vb - va);
            (
                r0 as f64 + t * (r1 - r0) as f64,
                c0 as f64 + t * (c1 - c0) as f64,
            )
        });
    };

    for r in 0..height - 1 {
        for c in 0..width - 1 {
            let corners = [v(r, c), v(r, c + 1), v(r + 1, c + 1), v(r + 1, c)];
            if corners.iter().any(|x| !x.is_finite()) {
                continue;
            }
            let case = corners
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &x)| acc | (((x > level) as u8) << i));

            let top = Edge::Row(r, c);
            let right = Edge::Col(r, c + 1);
            let bottom = Edge::Row(r + 1, c);
            let left = Edge::Col(r, c);
            let segments = match case {
                0 | 15 => [None, None],
                1 | 14 => [Some((left, top)), None],
                2 | 13 => [Some((top, right)), None],
                3 | 12 => [Some((left, right)), None],
                4 | 11 => [Some((right, bottom)), None],
                6 | 9 => [Some((top, bottom)), None],
                7 | 8 => [Some((left, bottom)), None],
                // 鞍点: 分开两个高格点.
                5 => [Some((left, top)), Some((right, bottom))],
                10 => [Some((top, right)), Some((bottom, left))],
                _ => unreachable!(),
            };
            for &(a, b) in segments.iter().flatten() {
                crossing(&mut graph, a);
                crossing(&mut graph, b);
                graph.link(a, b);
            }
        }
    }

    let mut visited = BTreeSet::new();

    // 先把所有开放的等值线走完, 剩下的都是环.
    let ends: Vec<Edge> = graph
        .links
        .iter()
        .filter(|(_, n)| n.len() == 1)
        .map(|(e, _)| *e)
        .collect();
    for e in ends {
        if !visited.contains(&e) {
            graph.walk(e, &mut visited);
        }
    }

    let mut contours = vec![];
    let starts: Vec<Edge> = graph.links.keys().copied().collect();
    for e in starts {
        if visited.contains(&e) {
            continue;
        }
        let path = graph.walk(e, &mut visited);
        if path.len() < 3 {
            continue;
        }
        let mut points: Vec<Idx2dF> = path.iter().map(|e| graph.points[e]).collect();
        points.push(points[0]);
        contours.push(Contour::new(points));
    }
    contours
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_single_pixel_diamond() {
        let mut f = Array2::<u8>::zeros((3, 3));
        f[(1, 1)] = 1;
        let cs = find_contours(f.view(), 0.5);
        assert_eq!(cs.len(), 1);
        let c = &cs[0];
        assert_eq!(c.len(), 5);
        assert_eq!(c.closure_distance(), Some(0.0));
        assert!((c.polygon_area() - 0.5).abs() < 1e-12);
        for &(h, w) in c.points() {
            assert!((h - 1.0).abs() + (w - 1.0).abs() - 0.5 < 1e-12);
        }
    }

    #[test]
    fn test_border_touching_is_dropped() {
        let f = arr2(&[[1u8, 1, 0], [1, 1, 0], [0, 0, 0]]);
        assert!(find_contours(f.view(), 0.5).is_empty());
    }

    #[test]
    fn test_saddle_separates_high_corners() {
        let f = arr2(&[
            [0u8, 0, 0, 0],
            [0, 1, 0, 0],
            [0, 0, 1, 0],
            [0, 0, 0, 0],
        ]);
        let cs = find_contours(f.view(), 0.5);
        assert_eq!(cs.len(), 2);
    }

    #[test]
    fn test_nested_loops_are_independent() {
        // 一圈高值包着一个低值洞.
        let mut f = Array2::<u8>::zeros((7, 7));
        for h in 1..6 {
            for w in 1..6 {
                f[(h, w)] = 1;
            }
        }
        f[(3, 3)] = 0;
        let cs = find_contours(f.view(), 0.5);
        assert_eq!(cs.len(), 2);
        let mut areas: Vec<f64> = cs.iter().map(|c| c.polygon_area()).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] - 0.5).abs() < 1e-12);
        // 外圈: 5x5 的方块, 四角各切去 1/8.
        assert!((areas[1] - (25.0 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_closed_invariant_and_determinism() {
        let f = Array2::from_shape_fn((40, 40), |(h, w)| {
            let (dh, dw) = (h as f64 - 20.0, w as f64 - 18.0);
            let r = (dh * dh + dw * dw).sqrt();
            ((r < 12.0 && r > 4.0) || (h > 30 && h < 36 && w > 30 && w < 37)) as u8
        });
        let a = find_contours(f.view(), 0.5);
        let b = find_contours(f.view(), 0.5);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        for c in a.iter() {
            assert!(c.len() >= 3);
            assert!(c.closure_distance().unwrap() <= 1e-12);
        }
    }

    #[test]
    fn test_interpolation_on_continuous_field() {
        let f = arr2(&[
            [0.0f32, 0.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 0.0, 0.0],
        ]);
        let cs = find_contours(f.view(), 1.0);
        assert_eq!(cs.len(), 1);
        // 交点位于距中心 3/4 像素处.
        for &(h, w) in cs[0].points() {
            assert!(((h - 1.0).abs() + (w - 1.0).abs() - 0.75).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tiny_fields() {
        let f = Array2::<u8>::ones((1, 5));
        assert!(find_contours(f.view(), 0.5).is_empty());
    }
}
