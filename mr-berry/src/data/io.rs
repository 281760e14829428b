//! nii 文件的读写, 以及数据集目录约定.
//!
//! 这一层属于外部协作者: 核心算法只接触内存中的 [`VoxelGrid`],
//! 不会在内部执行任何磁盘 I/O.
//!
//! nifti 使用 RAS 物理坐标系, 而这里与 ITK 保持一致, 使用 LPS.
//! 读取时会翻转 x/y 两个物理轴, 写出时再翻转回去.

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use ndarray_npy::WriteNpyError;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use super::{Geometry, Mat3, MrMask, MrScan, VoxelGrid};
use crate::error::SegError;
use crate::Idx3d;

/// 打开 nii 体数据错误.
#[derive(Debug)]
pub enum OpenGridError {
    /// 底层 nifti 读取错误.
    Nifti(nifti::NiftiError),

    /// header 中的空间元信息不合法 (如零间距).
    Geometry(SegError),
}

impl fmt::Display for OpenGridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenGridError::Nifti(e) => write!(f, "nifti 读取错误: {e}"),
            OpenGridError::Geometry(e) => write!(f, "header 空间元信息错误: {e}"),
        }
    }
}

impl std::error::Error for OpenGridError {}

impl From<nifti::NiftiError> for OpenGridError {
    fn from(e: nifti::NiftiError) -> Self {
        Self::Nifti(e)
    }
}

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 由单位四元数 `(b, c, d)` 计算旋转矩阵, `qfac` 作用于第三列.
fn quatern_to_mat(b: f64, c: f64, d: f64, qfac: f64) -> Mat3 {
    let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
    [
        [
            a * a + b * b - c * c - d * d,
            2.0 * (b * c - a * d),
            qfac * 2.0 * (b * d + a * c),
        ],
        [
            2.0 * (b * c + a * d),
            a * a + c * c - b * b - d * d,
            qfac * 2.0 * (c * d - a * b),
        ],
        [
            2.0 * (b * d - a * c),
            2.0 * (c * d + a * b),
            qfac * (a * a + d * d - c * c - b * b),
        ],
    ]
}

/// 从 header 中提取空间元信息, 并转换到 LPS.
///
/// 优先使用 sform, 其次 qform, 都不存在时使用单位方向和零原点.
fn geometry_from_header(h: &NiftiHeader) -> Result<Geometry, SegError> {
    let spacing = [h.pixdim[1] as f64, h.pixdim[2] as f64, h.pixdim[3] as f64];

    let (mut origin, mut dir) = if h.sform_code > 0 {
        let rows = [h.srow_x, h.srow_y, h.srow_z];
        let mut dir = [[0.0; 3]; 3];
        for (r, row) in rows.iter().enumerate() {
            for c in 0..3 {
                // srow 已经乘上了间距.
                dir[r][c] = row[c] as f64 / spacing[c];
            }
        }
        (rows.map(|row| row[3] as f64), dir)
    } else if h.qform_code > 0 {
        let qfac = if h.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let dir = quatern_to_mat(
            h.quatern_b as f64,
            h.quatern_c as f64,
            h.quatern_d as f64,
            qfac,
        );
        let origin = [h.quatern_x, h.quatern_y, h.quatern_z].map(|v| v as f64);
        (origin, dir)
    } else {
        return Geometry::with_spacing(spacing);
    };

    // RAS -> LPS
    for axis in 0..2 {
        origin[axis] = -origin[axis];
        dir[axis].iter_mut().for_each(|v| *v = -*v);
    }
    Geometry::new(spacing, origin, dir)
}

/// 根据空间元信息构建最小 header. 写出时 `dim` 与 `datatype` 由 writer 负责.
fn header_from_geometry(g: &Geometry) -> NiftiHeader {
    let mut header = NiftiHeader::default();
    let spacing = g.spacing();
    let mut origin = g.origin();
    let mut dir = g.direction();

    // LPS -> RAS
    for axis in 0..2 {
        origin[axis] = -origin[axis];
        dir[axis].iter_mut().for_each(|v| *v = -*v);
    }

    let [_, px, py, pz, ..] = &mut header.pixdim;
    (*px, *py, *pz) = (spacing[0] as f32, spacing[1] as f32, spacing[2] as f32);

    let row = |r: usize| -> [f32; 4] {
        [
            (dir[r][0] * spacing[0]) as f32,
            (dir[r][1] * spacing[1]) as f32,
            (dir[r][2] * spacing[2]) as f32,
            origin[r] as f32,
        ]
    };
    header.sform_code = 1;
    header.srow_x = row(0);
    header.srow_y = row(1);
    header.srow_z = row(2);
    header
}

/// 读取 nii 文件, 将 [W, H, z] 转换为 [z, H, W].
macro_rules! read_grid {
    ($path: expr, $elem: ty) => {{
        let obj = ReaderOptions::new().read_file($path)?;
        let header = obj.header().clone();
        let geometry = geometry_from_header(&header).map_err(OpenGridError::Geometry)?;

        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj
            .into_volume()
            .into_ndarray::<$elem>()?
            .permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data = Array3::<$elem>::from_shape_vec(
            get_shape_from_header(&header),
            data.into_raw_vec(),
        )
        .unwrap();

        Ok(VoxelGrid::new(data, geometry))
    }};
}

impl MrScan {
    /// 打开 nii 文件格式的 3D MRI 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenGridError> {
        read_grid!(path.as_ref(), f32)
    }
}

impl MrMask {
    /// 打开 nii 文件格式的 3D 分割掩膜. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenGridError> {
        read_grid!(path.as_ref(), u8)
    }

    /// 以 nii 格式保存掩膜, 空间元信息写入 sform.
    pub fn save_nifti<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        let header = header_from_geometry(self.geometry());
        // [z, H, W] -> [W, H, z]
        let data = self.data().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&header)
            .write_nifti(&data)
    }

    /// 以 npy 格式保存掩膜数据 (`(z, H, W)` 顺序, 不含空间元信息).
    #[inline]
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteNpyError> {
        ndarray_npy::write_npy(path, &self.data())
    }
}

/// 获取 `{用户主目录}/dataset/prostate` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.extend(["dataset", "prostate"]);
    Some(ans)
}

/// 获取 `{用户主目录}/dataset/prostate` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::{geometry_from_header, header_from_geometry, quatern_to_mat};
    use crate::data::Geometry;
    use approx::assert_relative_eq;
    use nifti::NiftiHeader;

    #[test]
    fn test_quatern_identity() {
        let m = quatern_to_mat(0.0, 0.0, 0.0, 1.0);
        for (r, row) in m.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                assert_relative_eq!(*v, if r == c { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_header_without_transform() {
        let mut h = NiftiHeader::default();
        (h.sform_code, h.qform_code) = (0, 0);
        h.pixdim[1..4].copy_from_slice(&[0.5, 0.5, 3.0]);
        let g = geometry_from_header(&h).unwrap();
        assert_eq!(g, Geometry::with_spacing([0.5, 0.5, 3.0]).unwrap());
    }

    #[test]
    fn test_header_zero_spacing() {
        let mut h = NiftiHeader::default();
        (h.sform_code, h.qform_code) = (0, 0);
        h.pixdim[1..4].copy_from_slice(&[0.0, 1.0, 1.0]);
        assert!(geometry_from_header(&h).is_err());
    }

    #[test]
    fn test_sform_round_trip() {
        let dir = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let g = Geometry::new([0.625, 0.625, 3.6], [-80.0, -95.5, -40.25], dir).unwrap();
        let back = geometry_from_header(&header_from_geometry(&g)).unwrap();
        for a in 0..3 {
            assert_relative_eq!(back.spacing()[a], g.spacing()[a], epsilon = 1e-5);
            assert_relative_eq!(back.origin()[a], g.origin()[a], epsilon = 1e-4);
            for c in 0..3 {
                assert_relative_eq!(back.direction()[a][c], g.direction()[a][c], epsilon = 1e-6);
            }
        }
    }
}
