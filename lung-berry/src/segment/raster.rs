//! 多边形光栅化.

use crate::consts::gray::MASK_FOREGROUND;
use crate::contour::Contour;
use crate::error::SegmentationFailure;
use crate::{Idx2d, Mask};
use ndarray::Array2;

/// 以扫描线规则填充单条轮廓的内部, 累加到 `acc` 上.
///
/// 在每一行的像素中心 `h` 处求出与多边形各边的交点 (半开规则: 边的较低端点计入,
/// 较高端点不计入, 因此水平边和首尾重复点不会产生交点), 交点两两配对,
/// 把落在每对交点之间 (含端点) 的像素中心标记为内部.
fn fill_into(mut acc: Array2<u16>, contour: &Contour) -> Array2<u16> {
    let (height, width) = acc.dim();
    let points = contour.points();
    let ((h_min, _), (h_max, _)) = match contour.bounds() {
        Some(b) => b,
        None => return acc,
    };
    if height == 0 || width == 0 || h_max < 0.0 || h_min > (height - 1) as f64 {
        return acc;
    }
    let row_lo = h_min.max(0.0).ceil() as usize;
    let row_hi = (h_max.floor() as usize).min(height - 1);

    let n = points.len();
    let mut xs: Vec<f64> = Vec::with_capacity(16);
    for row in row_lo..=row_hi {
        let y = row as f64;
        xs.clear();
        for i in 0..n {
            let (h0, w0) = points[i];
            let (h1, w1) = points[(i + 1) % n];
            if (h0 <= y && y < h1) || (h1 <= y && y < h0) {
                xs.push(w0 + (y - h0) * (w1 - w0) / (h1 - h0));
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let (xa, xb) = (pair[0].ceil(), pair[1].floor());
            if xb < 0.0 || xa > (width - 1) as f64 || xa > xb {
                continue;
            }
            let lo = xa.max(0.0) as usize;
            let hi = (xb as usize).min(width - 1);
            for col in lo..=hi {
                acc[(row, col)] += 1;
            }
        }
    }
    acc
}

/// 把若干条已选中的轮廓光栅化为与原切片同形状的单个掩膜.
///
/// 各轮廓的填充结果逐个累加到全 0 的累加器上, 最后把大于 1 的值截断为 1,
/// 因此互相重叠的轮廓不会重复计数. 任何一条轮廓少于 3 个点时返回
/// [`SegmentationFailure::TooFewPoints`].
pub fn rasterize(shape: Idx2d, contours: &[Contour]) -> Result<Mask, SegmentationFailure> {
    if let Some(bad) = contours.iter().find(|c| c.len() < 3) {
        return Err(SegmentationFailure::TooFewPoints { points: bad.len() });
    }
    let acc = contours
        .iter()
        .fold(Array2::<u16>::zeros(shape), fill_into);
    let clamped = acc.mapv(|v| v.min(MASK_FOREGROUND as u16) as u8);
    Ok(Mask::from_binary_unchecked(clamped))
}
