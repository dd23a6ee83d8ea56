use crate::Idx2d;

/// 行优先的掩膜/切片索引迭代器, 依次产出 `(h, w)`.
///
/// 与 `(0..h).flat_map(..)` 写法等价, 但对象更小, 并且能准确给出剩余长度,
/// 便于下游预分配容量.
#[derive(Debug, Clone)]
pub struct PosIter {
    next: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    /// 遍历形状为 `(h, w)` 的所有索引.
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self { next: 0, h, w }
    }

    #[inline]
    fn total(&self) -> usize {
        self.h * self.w
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }
        let pos = (self.next / self.w, self.next % self.w);
        self.next += 1;
        Some(pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.total().saturating_sub(self.next);
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for PosIter {}
