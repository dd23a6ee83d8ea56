//! 肺轮廓的选取.

use crate::consts::{CLOSURE_TOLERANCE, MIN_HULL_AREA};
use crate::contour::{Contour, ConvexHull};
use crate::error::SegmentationFailure;
use log::debug;
use ordered_float::OrderedFloat;

/// 对单条轮廓的判定结果.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ContourVerdict {
    /// 通过全部过滤, 附带其凸包面积.
    Accepted {
        /// 凸包面积.
        hull_area: f64,
    },

    /// 点数少于 3.
    TooFewPoints(usize),

    /// 首尾距离超出容差.
    NotClosed {
        /// 首尾距离.
        gap: f64,
    },

    /// 凸包无定义 (所有点共线).
    Degenerate,

    /// 凸包面积不超过下限, 不可能是肺.
    TooSmall {
        /// 凸包面积.
        hull_area: f64,
    },
}

impl ContourVerdict {
    /// 是否通过.
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, ContourVerdict::Accepted { .. })
    }
}

/// 肺轮廓选取结果.
#[derive(Clone, Debug, PartialEq)]
pub enum LungSelection {
    /// 恰好两条轮廓通过过滤, 即左右两肺.
    Pair([Contour; 2]),

    /// 多于两条轮廓通过过滤. 凸包面积最大的一条被认为是身体外轮廓并被剔除,
    /// 剩余轮廓按凸包面积升序排列.
    BodyExcluded {
        /// 剩余的轮廓.
        lungs: Vec<Contour>,
        /// 被剔除的轮廓.
        body: Contour,
    },

    /// 找不到有效的肺轮廓对.
    Rejected(SegmentationFailure),
}

impl LungSelection {
    /// 选中的肺轮廓. 被拒绝时返回 `None`.
    pub fn lungs(&self) -> Option<&[Contour]> {
        match self {
            LungSelection::Pair(pair) => Some(&pair[..]),
            LungSelection::BodyExcluded { lungs, .. } => Some(lungs.as_slice()),
            LungSelection::Rejected(_) => None,
        }
    }

    /// 转换为 `Result`, 丢弃被剔除的身体轮廓.
    pub fn into_result(self) -> Result<Vec<Contour>, SegmentationFailure> {
        match self {
            LungSelection::Pair(pair) => Ok(pair.into()),
            LungSelection::BodyExcluded { lungs, .. } => Ok(lungs),
            LungSelection::Rejected(e) => Err(e),
        }
    }
}

/// 基于凸包面积与首尾闭合距离的肺轮廓选取器.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LungSelector {
    /// 凸包面积必须 **严格大于** 该值 (平方像素).
    pub min_hull_area: f64,

    /// 首尾距离必须不超过该值 (像素).
    pub closure_tolerance: f64,
}

impl Default for LungSelector {
    fn default() -> Self {
        Self {
            min_hull_area: MIN_HULL_AREA,
            closure_tolerance: CLOSURE_TOLERANCE,
        }
    }
}

impl LungSelector {
    /// 判定单条轮廓.
    pub fn assess(&self, contour: &Contour) -> ContourVerdict {
        if contour.len() < 3 {
            return ContourVerdict::TooFewPoints(contour.len());
        }
        let hull_area = match ConvexHull::new(contour.points()) {
            Ok(hull) => hull.area(),
            Err(_) => return ContourVerdict::Degenerate,
        };
        if hull_area <= self.min_hull_area {
            return ContourVerdict::TooSmall { hull_area };
        }
        // 首尾距离总是可得的, 因为至少有 3 个点.
        let gap = contour.closure_distance().unwrap_or(f64::INFINITY);
        if gap > self.closure_tolerance {
            return ContourVerdict::NotClosed { gap };
        }
        ContourVerdict::Accepted { hull_area }
    }

    /// 从 `contours` 中选取肺轮廓.
    ///
    /// * 恰好两条通过 → [`LungSelection::Pair`], 保持输入顺序.
    /// * 多于两条通过 → 按凸包面积升序排列后剔除最大的 **一条**. 多于一个非肺大结构时
    ///   该规则会漏删, 这与参考行为一致.
    /// * 少于两条通过 → [`LungSelection::Rejected`].
    pub fn select(&self, contours: Vec<Contour>) -> LungSelection {
        let total = contours.len();
        let mut passed: Vec<(f64, Contour)> = Vec::with_capacity(total);
        for (i, contour) in contours.into_iter().enumerate() {
            let verdict = self.assess(&contour);
            debug!("contour #{i} ({} points): {verdict:?}", contour.len());
            if let ContourVerdict::Accepted { hull_area } = verdict {
                passed.push((hull_area, contour));
            }
        }
        debug!("{} of {total} contours passed", passed.len());

        match passed.len() {
            0 | 1 => LungSelection::Rejected(SegmentationFailure::InsufficientContours {
                found: passed.len(),
            }),
            2 => match <[(f64, Contour); 2]>::try_from(passed) {
                Ok([(_, a), (_, b)]) => LungSelection::Pair([a, b]),
                Err(v) => unreachable!("expected 2 contours, got {}", v.len()),
            },
            n => {
                // 稳定排序: 面积相同时保持输入顺序.
                passed.sort_by_key(|(area, _)| OrderedFloat(*area));
                let (body_area, body) = passed.remove(n - 1);
                debug!("excluding body contour with hull area {body_area:.1}");
                LungSelection::BodyExcluded {
                    lungs: passed.into_iter().map(|(_, c)| c).collect(),
                    body,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(ch: f64, cw: f64, r: f64) -> Contour {
        Contour::circle((ch, cw), r, 180)
    }

    /// 面积约为 `area` 的圆.
    fn circle_with_area(ch: f64, cw: f64, area: f64) -> Contour {
        circle(ch, cw, (area / std::f64::consts::PI).sqrt())
    }

    #[test]
    fn test_two_lungs() {
        let a = circle(100.0, 80.0, 30.0);
        let b = circle(100.0, 200.0, 30.0);
        let sel = LungSelector::default().select(vec![a.clone(), b.clone()]);
        assert_eq!(sel, LungSelection::Pair([a, b]));
    }

    #[test]
    fn test_body_excluded() {
        let body = circle_with_area(150.0, 150.0, 50000.0);
        let left = circle_with_area(150.0, 90.0, 5000.0);
        let right = circle_with_area(150.0, 210.0, 5200.0);
        let sel = LungSelector::default().select(vec![body.clone(), right.clone(), left.clone()]);
        assert_eq!(
            sel,
            LungSelection::BodyExcluded {
                lungs: vec![left.clone(), right.clone()],
                body
            }
        );
        assert_eq!(sel.lungs(), Some(&[left, right][..]));
    }

    #[test]
    fn test_largest_only_removal() {
        // 两个身体大小的结构: 只有最大的被剔除.
        let contours = vec![
            circle_with_area(0.0, 0.0, 50000.0),
            circle_with_area(0.0, 0.0, 40000.0),
            circle_with_area(0.0, 0.0, 5000.0),
            circle_with_area(0.0, 0.0, 5100.0),
        ];
        let lungs = LungSelector::default()
            .select(contours)
            .into_result()
            .unwrap();
        assert_eq!(lungs.len(), 3);
    }

    #[test]
    fn test_rejections() {
        let s = LungSelector::default();
        let small = circle(10.0, 10.0, 20.0);
        assert!(matches!(s.assess(&small), ContourVerdict::TooSmall { .. }));

        let mut open = circle(100.0, 100.0, 40.0).points().to_vec();
        open.truncate(150);
        assert!(matches!(
            s.assess(&Contour::new(open)),
            ContourVerdict::NotClosed { .. }
        ));

        let line = Contour::new(vec![(0.0, 0.0), (50.0, 50.0), (100.0, 100.0), (0.0, 0.0)]);
        assert_eq!(s.assess(&line), ContourVerdict::Degenerate);

        let two = Contour::new(vec![(0.0, 0.0), (0.0, 0.0)]);
        assert_eq!(s.assess(&two), ContourVerdict::TooFewPoints(2));

        let sel = s.select(vec![circle(100.0, 100.0, 40.0), small, two, line]);
        assert_eq!(
            sel,
            LungSelection::Rejected(SegmentationFailure::InsufficientContours { found: 1 })
        );
        assert_eq!(sel.lungs(), None);
        assert!(s.select(vec![]).into_result().is_err());
    }

    #[test]
    fn test_thresholds_are_exclusive_and_inclusive() {
        let square = |side: f64, gap: f64| {
            Contour::new(vec![
                (0.0, 0.0),
                (0.0, side),
                (side, side),
                (side, 0.0),
                (gap, 0.0),
            ])
        };
        let s = LungSelector {
            min_hull_area: 100.0,
            closure_tolerance: 1.0,
        };
        assert!(matches!(
            s.assess(&square(10.0, 0.0)),
            ContourVerdict::TooSmall { .. }
        ));
        assert!(s.assess(&square(10.5, 1.0)).is_accepted());
        assert!(!s.assess(&square(10.5, 1.5)).is_accepted());
    }
}
