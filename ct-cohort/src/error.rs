//! 运行时错误.

use std::path::PathBuf;

/// 错误类别. 用于调用方按类别决定是否跳过当前病人.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// 模板与用途不符. 总能在任何 I/O 之前发现.
    Configuration,

    /// 要求非空的解析没有匹配到任何文件.
    NotFound,

    /// 要求唯一的解析匹配到多个文件, 或路径与其模板不符.
    Ambiguity,

    /// 底层文件无法列举或解码.
    Io,
}

/// 模板解析、文件匹配与数据组装过程中的错误.
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    /// 模板语法错误, 如花括号不成对、占位符名为空或含有路径分隔符.
    #[error("模板 `{template}` 语法错误: {reason}")]
    MalformedTemplate {
        /// 原始模板.
        template: String,
        /// 出错原因.
        reason: &'static str,
    },

    /// 同一模板中占位符重名.
    #[error("模板 `{template}` 中占位符 {{{name}}} 重复出现")]
    DuplicatePlaceholder {
        /// 原始模板.
        template: String,
        /// 重复的占位符名.
        name: String,
    },

    /// 模板缺少必需的占位符.
    #[error("模板 `{template}` 缺少占位符 {{{name}}}")]
    MissingPlaceholder {
        /// 模板.
        template: String,
        /// 缺少的占位符名.
        name: String,
    },

    /// 模板中仍有既未替换、也未声明为通配的占位符.
    #[error("模板 `{template}` 中占位符 {{{name}}} 未被解析")]
    UnresolvedPlaceholder {
        /// 模板.
        template: String,
        /// 未解析的占位符名.
        name: String,
    },

    /// 替换值含有花括号, 会破坏模板结构.
    #[error("占位符 {{{name}}} 的替换值 `{value}` 非法")]
    InvalidValue {
        /// 占位符名.
        name: String,
        /// 替换值.
        value: String,
    },

    /// 由模板生成的 glob 模式非法.
    #[error("glob 模式非法: {0}")]
    Pattern(#[from] glob::PatternError),

    /// 要求非空的解析没有匹配到任何文件.
    #[error("没有文件匹配 `{pattern}`")]
    NotFound {
        /// 用于匹配的 glob 模式.
        pattern: String,
    },

    /// 要求唯一的解析匹配到多个不同文件.
    #[error("`{pattern}` 匹配到 {} 个文件, 期望恰好 1 个", .matches.len())]
    Ambiguous {
        /// 用于匹配的 glob 模式.
        pattern: String,
        /// 全部匹配结果 (已去重并排序).
        matches: Vec<PathBuf>,
    },

    /// 要求唯一的占位符取值出现了多个不同值.
    #[error("占位符 {{{name}}} 出现多个不同取值: {values:?}")]
    AmbiguousValue {
        /// 占位符名.
        name: String,
        /// 全部取值 (已去重并排序).
        values: Vec<String>,
    },

    /// 具体路径与模板不符.
    #[error("路径 `{}` 与模板 `{template}` 不匹配", .path.display())]
    PathMismatch {
        /// 具体路径.
        path: PathBuf,
        /// 模板.
        template: String,
    },

    /// 列举文件系统失败.
    #[error("列举文件失败: {0}")]
    Glob(#[from] glob::GlobError),

    /// nifti 文件解码失败.
    #[error("nifti 文件解码失败: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CohortError {
    /// 获取错误类别.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedTemplate { .. }
            | Self::DuplicatePlaceholder { .. }
            | Self::MissingPlaceholder { .. }
            | Self::UnresolvedPlaceholder { .. }
            | Self::InvalidValue { .. }
            | Self::Pattern(_) => ErrorKind::Configuration,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Ambiguous { .. } | Self::AmbiguousValue { .. } | Self::PathMismatch { .. } => {
                ErrorKind::Ambiguity
            }
            Self::Glob(_) | Self::Nifti(_) | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// 本 crate 通用结果类型.
pub type CohortResult<T> = Result<T, CohortError>;
