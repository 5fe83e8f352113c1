//! 数据集操作.
//!
//! 提供迭代器风格的数据集获取模式.

use std::path::PathBuf;

mod config;
mod loader;

pub use config::DataConfig;
#[cfg(feature = "serde")]
pub use config::LoadConfigError;
pub use loader::{DatasetLoader, ObserverMasks, PatientScans};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

