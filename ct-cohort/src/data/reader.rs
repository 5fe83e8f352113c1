//! 3D 体数据读取.

use std::io;
use std::path::Path;

use ndarray::{Array3, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::error::CohortResult;

/// 将磁盘上的体数据文件解码为三维数组.
///
/// 数组按 `[z, H, W]` 组织. 解码失败时直接返回底层错误, 不做任何恢复.
pub trait VolumeReader {
    /// 读取 CT 扫描 (HU 值).
    fn read_volume(&self, path: &Path) -> CohortResult<Array3<f32>>;

    /// 读取某器官的二值标注.
    fn read_mask(&self, path: &Path) -> CohortResult<Array3<u8>>;
}

/// 基于 `nifti` 的读取器, 支持 `.nii` 和 `.nii.gz`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NiftiReader;

macro_rules! impl_read_nifti {
    ($name: ident, $elem: ty) => {
        fn $name(path: &Path) -> CohortResult<Array3<$elem>> {
            let obj = ReaderOptions::new().read_file(path)?;
            let data = obj
                .into_volume()
                .into_ndarray::<$elem>()?
                .into_dimensionality::<Ix3>()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            // [W, H, z] -> [z, H, W].
            // hint: 原第一维向下增长, 原第二维向右增长.
            let data = data.permuted_axes([2, 1, 0]);
            let data = if data.is_standard_layout() {
                data
            } else {
                data.as_standard_layout().into_owned()
            };
            log::debug!("已读取 {} {:?}", path.display(), data.shape());
            Ok(data)
        }
    };
}

impl_read_nifti!(read_nifti_f32, f32);
impl_read_nifti!(read_nifti_u8, u8);

impl VolumeReader for NiftiReader {
    #[inline]
    fn read_volume(&self, path: &Path) -> CohortResult<Array3<f32>> {
        read_nifti_f32(path)
    }

    #[inline]
    fn read_mask(&self, path: &Path) -> CohortResult<Array3<u8>> {
        read_nifti_u8(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{NiftiReader, VolumeReader};
    use crate::error::ErrorKind;

    #[test]
    fn test_read_invalid_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.nii");
        std::fs::write(&path, b"definitely not a nifti header").unwrap();

        let err = NiftiReader.read_volume(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        let err = NiftiReader.read_mask(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_read_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = NiftiReader
            .read_volume(&tmp.path().join("missing.nii"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
