//! 肺血管的提取与去噪.

use super::KdTree;
use crate::consts::gray::{is_foreground, MASK_BACKGROUND};
use crate::contour::Contour;
use crate::{CtSlice, Mask};
use ndarray::Zip;

/// 在肺掩膜内提取候选血管像素.
///
/// 先把肺掩膜与原切片逐元素相乘, 乘积为 0 的像素 (掩膜外, 以及掩膜内 HU 恰为 0 的像素)
/// 改写为空气 HU 值 `air_hu`, 然后把不低于 `floor` 的像素标记为血管.
///
/// 如果 `lung` 与 `slice` 形状不同, 则程序 panic.
pub fn extract_vessels(lung: &Mask, slice: &CtSlice, floor: f32, air_hu: f32) -> Mask {
    assert_eq!(lung.shape(), slice.shape(), "掩膜与切片形状不符");
    let out = Zip::from(&lung.view())
        .and(&slice.data())
        .map_collect(|&m, &hu| {
            let masked = if is_foreground(m) { hu } else { 0.0 };
            let masked = if masked == 0.0 { air_hu } else { masked };
            (masked >= floor) as u8
        });
    Mask::from_binary_unchecked(out)
}

/// 删除与任何肺轮廓点的欧几里得距离不超过 `tolerance` 的血管像素.
///
/// 轮廓点被收集到 [`KdTree`] 中, 每个前景像素只做一次最近邻查询.
/// 返回新的掩膜以及被删除的像素个数.
pub fn denoise_vessels(vessels: &Mask, lungs: &[Contour], tolerance: f64) -> (Mask, usize) {
    let tree = KdTree::new(lungs.iter().flat_map(|c| c.points().iter().copied()));
    let mut out = vessels.clone().into_raw();
    let mut removed = 0;
    if tree.is_empty() {
        return (Mask::from_binary_unchecked(out), removed);
    }
    for pos in vessels.foreground_pos() {
        if tree.any_within((pos.0 as f64, pos.1 as f64), tolerance) {
            out[pos] = MASK_BACKGROUND;
            removed += 1;
        }
    }
    (Mask::from_binary_unchecked(out), removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SlicePhantom, Spacing};
    use ndarray::{arr2, Array2};

    #[test]
    fn test_extract_vessels() {
        let slice = CtSlice::new(
            arr2(&[[-800.0f32, -400.0, 0.0], [-500.0, 100.0, -900.0]]),
            Spacing::unit(),
        );
        let lung = Mask::from_raw(arr2(&[[1, 1, 1], [1, 0, 1]]));
        let v = extract_vessels(&lung, &slice, -500.0, -1000.0);
        // HU 为 0 的肺内像素被视为背景; 肺外的 100 HU 不计入.
        assert_eq!(v.view(), arr2(&[[0u8, 1, 0], [1, 0, 0]]));
        assert!(v.is_subset_of(&lung));
    }

    #[test]
    fn test_vessels_inside_phantom_lung() {
        let slice = SlicePhantom::new((40, 40), 40.0)
            .disc((20.0, 20.0), 12.0, -850.0)
            .disc((20.0, 20.0), 2.0, 30.0)
            .build();
        let lung = Mask::from_raw(Array2::from_shape_fn(slice.shape(), |(h, w)| {
            let (dh, dw) = (h as f64 - 20.0, w as f64 - 20.0);
            (dh * dh + dw * dw <= 144.0) as u8
        }));
        let v = extract_vessels(&lung, &slice, -500.0, -1000.0);
        assert_eq!(v.count_foreground(), 13);
        assert!(v.view().iter().all(|&p| p <= 1));
    }

    #[test]
    fn test_denoise_boundary_removal() {
        let contour = Contour::new(vec![
            (2.0, 2.0),
            (2.0, 8.0),
            (8.0, 8.0),
            (8.0, 2.0),
            (2.0, 2.0),
        ]);
        let mut raw = Array2::<u8>::zeros((10, 10));
        // 与轮廓点重合.
        raw[(2, 8)] = 1;
        // 距离所有轮廓点都很远.
        raw[(5, 5)] = 1;
        let vessels = Mask::from_raw(raw);

        let (clean, removed) = denoise_vessels(&vessels, &[contour], 0.1);
        assert_eq!(removed, 1);
        assert_eq!(clean.foreground_pos().collect::<Vec<_>>(), vec![(5, 5)]);
    }

    #[test]
    fn test_denoise_without_contours() {
        let vessels = Mask::from_raw(arr2(&[[1, 0], [0, 1]]));
        let (clean, removed) = denoise_vessels(&vessels, &[], 0.1);
        assert_eq!(removed, 0);
        assert_eq!(clean, vessels);
    }
}
