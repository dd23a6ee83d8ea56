use crate::error::LoadError;
use crate::pipeline::SliceSource;
use crate::{CtSlice, Spacing};
use log::warn;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// 切片文件格式.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SliceFormat {
    /// `.nii` 或 `.nii.gz`.
    Nifti,
    /// `.npy`, 不携带分辨率.
    Npy,
}

impl SliceFormat {
    const SUFFIXES: [(&'static str, SliceFormat); 3] = [
        (".nii.gz", SliceFormat::Nifti),
        (".nii", SliceFormat::Nifti),
        (".npy", SliceFormat::Npy),
    ];

    /// 从文件名中拆出 `(id, 格式)`. 不认识的后缀返回 `None`.
    pub fn split(file_name: &str) -> Option<(&str, SliceFormat)> {
        Self::SUFFIXES.iter().find_map(|&(suffix, format)| {
            file_name
                .strip_suffix(suffix)
                .filter(|id| !id.is_empty())
                .map(|id| (id, format))
        })
    }
}

/// 目录下所有名为 `<prefix>*.nii[.gz]` 或 `<prefix>*.npy` 的切片文件, 按文件名排序.
///
/// 切片 id 为去掉后缀的文件名, 例如 `slice012.nii.gz` 的 id 为 `slice012`.
#[derive(Clone, Debug)]
pub struct SliceDir {
    entries: Vec<(String, PathBuf, SliceFormat)>,
    npy_spacing: Spacing,
}

impl SliceDir {
    /// 扫描 `dir`. 只收集文件名以 `prefix` 开头的文件.
    pub fn open<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let io_err = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = vec![];
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }
            if let Some((id, format)) = SliceFormat::split(name) {
                entries.push((id.to_string(), path.clone(), format));
            }
        }
        entries.sort_by(|a, b| a.1.cmp(&b.1));

        // 同一 id 的多个文件 (例如 `x.nii` 与 `x.nii.gz`) 只保留排序后的第一个.
        let mut seen = HashSet::new();
        entries.retain(|(id, path, _)| {
            let fresh = seen.insert(id.clone());
            if !fresh {
                warn!("skipping {path:?}: slice id `{id}` is already taken");
            }
            fresh
        });

        Ok(Self {
            entries,
            npy_spacing: Spacing::unit(),
        })
    }

    /// `.npy` 文件使用的像素分辨率. 默认为 [`Spacing::unit`].
    pub fn with_npy_spacing(mut self, spacing: Spacing) -> Self {
        self.npy_spacing = spacing;
        self
    }
}

impl SliceSource for SliceDir {
    #[inline]
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn slice_id(&self, index: usize) -> String {
        self.entries[index].0.clone()
    }

    fn load(&self, index: usize) -> Result<CtSlice, LoadError> {
        let (_, path, format) = &self.entries[index];
        match format {
            SliceFormat::Nifti => CtSlice::open(path),
            SliceFormat::Npy => CtSlice::from_npy(path, self.npy_spacing),
        }
    }
}
