//! 掩膜的物理面积.

use crate::{Mask, Spacing};

/// 掩膜前景的物理面积: 前景像素个数乘以单个像素的物理面积 `sx * sy`.
///
/// 面积单位由 `spacing` 的单位决定 (一般为平方毫米).
#[inline]
pub fn physical_area(mask: &Mask, spacing: Spacing) -> f64 {
    mask.count_foreground() as f64 * spacing.pixel_area()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::binarize;
    use crate::SlicePhantom;
    use ndarray::arr2;

    #[test]
    fn test_spacing_scales_area() {
        let m = Mask::from_raw(arr2(&[[0, 1, 1], [1, 0, 0]]));
        assert_eq!(physical_area(&m, Spacing::unit()), 3.0);
        let scaled = physical_area(&m, Spacing::new(0.5, 0.8));
        assert!((scaled - 1.2).abs() < 1e-12);
        let empty = Mask::zeros((4, 4));
        assert_eq!(physical_area(&empty, Spacing::new(2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_subset_monotonicity() {
        let small = SlicePhantom::new((30, 30), 40.0)
            .disc((15.0, 15.0), 5.0, -700.0)
            .build();
        let big = SlicePhantom::new((30, 30), 40.0)
            .disc((15.0, 15.0), 9.0, -700.0)
            .build();
        let a = binarize(small.data(), -1000.0, -300.0);
        let b = binarize(big.data(), -1000.0, -300.0);
        assert!(a.is_subset_of(&b));
        let s = Spacing::new(0.7, 0.7);
        assert!(physical_area(&a, s) <= physical_area(&b, s));
    }
}
