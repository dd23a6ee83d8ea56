use crate::error::LoadError;
use crate::pipeline::SliceSource;
use crate::CtSlice;

/// 内存中的切片集合. 适用于测试和合成数据.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    slices: Vec<(String, CtSlice)>,
}

impl MemorySource {
    /// 追加一张切片.
    pub fn push<S: Into<String>>(&mut self, slice_id: S, slice: CtSlice) {
        self.slices.push((slice_id.into(), slice));
    }
}

impl FromIterator<(String, CtSlice)> for MemorySource {
    fn from_iter<T: IntoIterator<Item = (String, CtSlice)>>(iter: T) -> Self {
        Self {
            slices: iter.into_iter().collect(),
        }
    }
}

impl SliceSource for MemorySource {
    #[inline]
    fn len(&self) -> usize {
        self.slices.len()
    }

    fn slice_id(&self, index: usize) -> String {
        self.slices[index].0.clone()
    }

    fn load(&self, index: usize) -> Result<CtSlice, LoadError> {
        Ok(self.slices[index].1.clone())
    }
}
