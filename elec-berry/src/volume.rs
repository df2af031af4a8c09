//! 标签体数据的读写与标记.
//!
//! 体数据按 NIfTI 数组的原始轴顺序访问, 即 `(row, column, layer)`, 与取点和插值使用的坐标一致,
//! 不做任何轴置换.

use std::ops::{Index, IndexMut};
use std::path::Path;

use crate::{Idx3d, ReconConfig};
use log::debug;
use ndarray::{s, Array3, ArrayView3, ArrayViewMut3, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use thiserror::Error;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观. 因此分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 体数据读写错误.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// NIfTI 读写失败.
    #[error("nifti: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 数据形状与期望不符.
    #[error("shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 读取 `.npy` 失败.
    #[error("read npy: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    /// 写入 `.npy` 失败.
    #[error("write npy: {0}")]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    /// 创建输出目录失败.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// 体数据不是三维的.
    #[error("expected a 3D volume, got shape {0:?}")]
    NotThreeDimensional(Vec<usize>),
}

/// 体数据读写结果.
pub type VolumeResult<T> = Result<T, VolumeError>;

/// 文件是否是 `.npy`.
#[inline]
fn is_npy(path: &Path) -> bool {
    path.extension().map_or(false, |e| e.eq_ignore_ascii_case("npy"))
}

/// 3D 标签体数据 (mask, 电极分割, 或输出的标记体), 以及其可选的 NIfTI header.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectrodeVolume {
    header: Option<BoxedHeader>,
    data: Array3<u8>,
}

impl Index<Idx3d> for ElectrodeVolume {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for ElectrodeVolume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl ElectrodeVolume {
    /// 由裸数据构建, 没有 header.
    #[inline]
    pub fn from_array(data: Array3<u8>) -> Self {
        Self { header: None, data }
    }

    /// 按扩展名打开: `.npy` 以 npy 读取, 其他 (`.nii`, `.nii.gz`) 以 NIfTI 读取.
    pub fn open<P: AsRef<Path>>(path: P) -> VolumeResult<Self> {
        let path = path.as_ref();
        if is_npy(path) {
            Self::open_npy(path)
        } else {
            Self::open_nifti(path)
        }
    }

    /// 打开 NIfTI 文件. 体素值被转换为 `u8`.
    pub fn open_nifti<P: AsRef<Path>>(path: P) -> VolumeResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());
        let data = obj.into_volume().into_ndarray::<u8>()?;
        if data.ndim() != 3 {
            return Err(VolumeError::NotThreeDimensional(data.shape().to_vec()));
        }
        // NIfTI 数据为列优先存储, 这里转换为行优先以便按层遍历.
        let data = data
            .into_dimensionality::<Ix3>()?
            .as_standard_layout()
            .into_owned();
        debug!("opened nifti {:?}: shape {:?}", path.as_ref(), data.dim());
        Ok(Self {
            header: Some(header),
            data,
        })
    }

    /// 打开 `.npy` 文件. 数组必须为 3D `u8`.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> VolumeResult<Self> {
        let data: Array3<u8> = ndarray_npy::read_npy(path.as_ref())?;
        debug!("opened npy {:?}: shape {:?}", path.as_ref(), data.dim());
        Ok(Self::from_array(data))
    }

    /// 按扩展名保存: `.npy` 以 npy 写入, 其他以 NIfTI 写入 (`.gz` 结尾时压缩).
    /// 所在目录不存在时先创建.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        if is_npy(path) {
            self.save_npy(path)
        } else {
            self.save_nifti(path)
        }
    }

    /// 保存为 NIfTI. 有 header 时以其为参考 header.
    pub fn save_nifti<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        let writer = WriterOptions::new(path.as_ref());
        let writer = match &self.header {
            Some(h) => writer.reference_header(h),
            None => writer,
        };
        writer.write_nifti(&self.data)?;
        debug!("saved nifti {:?}", path.as_ref());
        Ok(())
    }

    /// 保存为 `.npy`.
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        ndarray_npy::write_npy(path.as_ref(), &self.data)?;
        debug!("saved npy {:?}", path.as_ref());
        Ok(())
    }

    /// 形状相同、header 相同、全为背景的体数据. 用作输出的标记体.
    pub fn blank_like(&self) -> Self {
        Self {
            header: self.header.clone(),
            data: Array3::zeros(self.data.dim()),
        }
    }

    /// NIfTI header. 从 `.npy` 或裸数据构建时没有 header.
    #[inline]
    pub fn header(&self) -> Option<&NiftiHeader> {
        self.header.as_deref()
    }

    /// 形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 数据视图.
    #[inline]
    pub fn view(&self) -> ArrayView3<u8> {
        self.data.view()
    }

    /// 可变数据视图.
    #[inline]
    pub fn view_mut(&mut self) -> ArrayViewMut3<u8> {
        self.data.view_mut()
    }

    /// 直接获得内部数据的所有权.
    #[inline]
    pub fn into_array(self) -> Array3<u8> {
        self.data
    }

    /// 在每个电极坐标 `v` 处, 将每轴 `[v - half_width, v + half_width)` 的立方体置为 `value`.
    /// 立方体被体数据边界截断; `half_width` 为 0 时只标记 `v` 本身.
    ///
    /// 如果存在越界坐标, 则程序 panic.
    pub fn mark_electrodes(&mut self, coords: &[Idx3d], half_width: usize, value: u8) {
        let (a, b, c) = self.shape();
        for &(i, j, k) in coords {
            assert!(i < a && j < b && k < c, "({i}, {j}, {k}) is outside {:?}", (a, b, c));
            let range = |v: usize, bound: usize| {
                let lo = v.saturating_sub(half_width);
                let hi = (v + half_width).max(v + 1).min(bound);
                lo..hi
            };
            self.data
                .slice_mut(s![range(i, a), range(j, b), range(k, c)])
                .fill(value);
        }
    }

    /// 以 `config` 中的标记半宽与标记值标记电极.
    #[inline]
    pub fn mark_with(&mut self, coords: &[Idx3d], config: &ReconConfig) {
        self.mark_electrodes(coords, config.marker_half_width(), config.marker_value());
    }

    /// 值为 `value` 的体素个数.
    pub fn count(&self, value: u8) -> usize {
        self.data.iter().filter(|v| **v == value).count()
    }
}
