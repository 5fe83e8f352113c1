//! 数据集配置.

use std::path::PathBuf;

use crate::consts::placeholder::{MASK_REQUIRED, VOLUME_REQUIRED};
use crate::consts::{env, DEFAULT_MASK_PATTERN, DEFAULT_VOLUME_PATTERN};
use crate::error::{CohortError, CohortResult};
use crate::template::Template;

/// 数据集配置. 在启动时构建一次, 之后以引用传给需要它的组件.
///
/// 文件名模板相对于 `data_dir`. 启用 `serde` feature 时, 可以从 YAML
/// 配置文件的 `data` 段读取, 缺省的模板取默认值.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct DataConfig {
    /// 数据集根目录.
    pub data_dir: PathBuf,

    /// 扫描文件名模板, 必须含有 `{patient_id}`.
    #[cfg_attr(feature = "serde", serde(default = "default_volume_pattern"))]
    pub volume_pattern: String,

    /// 标注文件名模板, 必须含有 `{patient_id}`, `{organ}` 和 `{observer}`.
    #[cfg_attr(feature = "serde", serde(default = "default_mask_pattern"))]
    pub mask_pattern: String,
}

#[cfg(feature = "serde")]
fn default_volume_pattern() -> String {
    DEFAULT_VOLUME_PATTERN.to_owned()
}

#[cfg(feature = "serde")]
fn default_mask_pattern() -> String {
    DEFAULT_MASK_PATTERN.to_owned()
}

impl DataConfig {
    /// 创建配置.
    pub fn new<P, S, T>(data_dir: P, volume_pattern: S, mask_pattern: T) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            data_dir: data_dir.into(),
            volume_pattern: volume_pattern.into(),
            mask_pattern: mask_pattern.into(),
        }
    }

    /// 使用默认文件名模板创建配置.
    #[inline]
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self::new(data_dir, DEFAULT_VOLUME_PATTERN, DEFAULT_MASK_PATTERN)
    }

    /// 从环境变量或用户主目录构建配置.
    ///
    /// 1. 若环境变量 `$COHORT_DATA_DIR` 非空, 则以其值为根目录;
    /// 2. 否则, 以 `$HOME/dataset` 为根目录. 无法获取主目录时返回 `None`.
    ///
    /// 文件名模板分别取自 `$COHORT_VOLUME_PATTERN` 和 `$COHORT_MASK_PATTERN`,
    /// 未设置时取默认值.
    pub fn from_env_or_home() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Option<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.is_empty());
        let data_dir = match non_empty(env::DATA_DIR) {
            Some(d) => PathBuf::from(d),
            None => super::home_dataset_dir()?,
        };
        Some(Self::new(
            data_dir,
            non_empty(env::VOLUME_PATTERN).unwrap_or_else(|| DEFAULT_VOLUME_PATTERN.to_owned()),
            non_empty(env::MASK_PATTERN).unwrap_or_else(|| DEFAULT_MASK_PATTERN.to_owned()),
        ))
    }

    /// 获取扫描文件的完整路径模板, 并检查必需的占位符.
    pub fn volume_template(&self) -> CohortResult<Template> {
        let template = self.full_template(&self.volume_pattern)?;
        template.require(&VOLUME_REQUIRED)?;
        Ok(template)
    }

    /// 获取标注文件的完整路径模板, 并检查必需的占位符.
    pub fn mask_template(&self) -> CohortResult<Template> {
        let template = self.full_template(&self.mask_pattern)?;
        template.require(&MASK_REQUIRED)?;
        Ok(template)
    }

    fn full_template(&self, pattern: &str) -> CohortResult<Template> {
        let full = self.data_dir.join(pattern);
        let full = full.to_str().ok_or_else(|| CohortError::MalformedTemplate {
            template: full.display().to_string(),
            reason: "路径不是合法的 UTF-8",
        })?;
        Template::new(full)
    }
}

/// 读取 YAML 配置文件错误.
#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum LoadConfigError {
    /// 读取文件错误.
    #[error("读取配置文件失败: {0}")]
    Io(#[from] std::io::Error),

    /// YAML 格式错误.
    #[error("配置文件格式错误: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ConfigFile {
    data: DataConfig,
}

#[cfg(feature = "serde")]
impl DataConfig {
    /// 从 YAML 文本的 `data` 段读取配置.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadConfigError> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        Ok(file.data)
    }

    /// 从 YAML 配置文件的 `data` 段读取配置.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, LoadConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}
