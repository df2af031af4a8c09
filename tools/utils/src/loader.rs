//! 数据路径解析.
//!
//! 工具程序从病例文件中读到的 mask / 分割文件名都是相对路径, 相对于数据根目录解析.

use elec_berry::{ElectrodeVolume, VolumeResult};
use std::env;
use std::path::{Path, PathBuf};

/// 指定数据根目录的环境变量.
pub const DATA_DIR_ENV: &str = "ELEC_DATA_DIR";

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取电极数据根目录.
///
/// 1. 若环境变量 `$ELEC_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/electrode`;
/// 3. 无法确定用户主目录时返回 `None`.
pub fn data_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(DATA_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["electrode"]),
    }
}

/// 将 `file` 相对于 `base` 解析. `file` 为绝对路径时原样返回.
pub fn resolve<P: AsRef<Path>, Q: AsRef<Path>>(base: P, file: Q) -> PathBuf {
    let file = file.as_ref();
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.as_ref().join(file)
    }
}

/// 打开相对于 `base` 的体数据文件 (`.nii`, `.nii.gz` 或 `.npy`).
#[inline]
pub fn open_volume<P: AsRef<Path>, Q: AsRef<Path>>(base: P, file: Q) -> VolumeResult<ElectrodeVolume> {
    ElectrodeVolume::open(resolve(base, file))
}

#[cfg(test)]
mod tests {
    use super::{home_dataset_dir_with, resolve};
    use std::path::{Path, PathBuf};

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/data", "p1/mask.nii.gz"), PathBuf::from("/data/p1/mask.nii.gz"));
        assert_eq!(resolve("/data", "/abs/seg.npy"), PathBuf::from("/abs/seg.npy"));
    }

    #[test]
    fn test_home_dataset_dir() {
        if let Some(p) = home_dataset_dir_with(["electrode"]) {
            assert!(p.ends_with(Path::new("dataset/electrode")));
        }
    }
}
