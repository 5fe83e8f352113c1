//! 将带通配占位符的模板展开为磁盘上实际存在的文件.
//!
//! 所有解析结果都按路径字典序排列并去重, 以保证在文件系统不变时多次调用的
//! 结果完全一致.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use glob::MatchOptions;
use itertools::Itertools;

use crate::error::{CohortError, CohortResult};
use crate::template::Template;

/// 通配符不跨越路径分隔符, 不匹配隐藏文件的开头 `.`, 且区分大小写.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// 已确认与模板匹配的具体路径, 以及各通配占位符在该路径中的取值.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedPath {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl ResolvedPath {
    /// 具体路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 获取通配占位符 `{name}` 的取值.
    #[inline]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// 所有通配占位符取值, 按占位符名排序.
    #[inline]
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// 拆分为 (路径, 取值).
    #[inline]
    pub fn into_parts(self) -> (PathBuf, BTreeMap<String, String>) {
        (self.path, self.values)
    }
}

/// 展开模板中 `wildcards` 对应的占位符, 返回所有匹配的文件, 按路径字典序排列.
///
/// 模板中除 `wildcards` 外不能再有其他占位符. 没有任何匹配时返回空列表.
/// 以 `.` 开头的隐藏文件不会被通配占位符匹配.
///
/// 模板和返回的路径都去掉了 `.` 路径段, 重复的分隔符也已合并,
/// 例如 `./data//{patient_id}.nii` 返回的路径形如 `data/p1.nii`.
pub fn resolve(template: &Template, wildcards: &[&str]) -> CohortResult<Vec<ResolvedPath>> {
    let template = normalize_template(template)?;
    let pattern = template.to_matchable_pattern(wildcards)?;
    let capture = template.to_capture_pattern(wildcards)?;

    let paths = list_files(&pattern)?;
    log::debug!("`{pattern}` 匹配到 {} 个文件", paths.len());

    paths
        .into_iter()
        .map(|path| -> CohortResult<ResolvedPath> {
            let path = normalize_path(&path);
            let values = capture.extract(&path, wildcards)?;
            let values = wildcards
                .iter()
                .map(|name| (*name).to_owned())
                .zip(values)
                .collect();
            Ok(ResolvedPath { path, values })
        })
        .collect()
}

/// 同 [`resolve`], 但没有任何匹配时返回 [`CohortError::NotFound`].
pub fn resolve_required(
    template: &Template,
    wildcards: &[&str],
) -> CohortResult<Vec<ResolvedPath>> {
    let resolved = resolve(template, wildcards)?;
    if resolved.is_empty() {
        return Err(CohortError::NotFound {
            pattern: template.to_matchable_pattern(wildcards)?,
        });
    }
    Ok(resolved)
}

/// 解析恰好一个文件.
///
/// 没有匹配时返回 [`CohortError::NotFound`], 匹配到多个不同文件时返回
/// [`CohortError::Ambiguous`].
pub fn resolve_single(template: &Template, wildcards: &[&str]) -> CohortResult<ResolvedPath> {
    let mut resolved = resolve_required(template, wildcards)?;
    if resolved.len() > 1 {
        return Err(CohortError::Ambiguous {
            pattern: template.to_matchable_pattern(wildcards)?,
            matches: resolved.into_iter().map(|r| r.path).collect(),
        });
    }
    Ok(resolved.remove(0))
}

/// 按 [`normalize_path`] 规整模板中的字面量路径.
fn normalize_template(template: &Template) -> CohortResult<Template> {
    let text = template.to_string();
    let normalized = normalize_path(Path::new(&text));
    Template::new(&normalized.to_string_lossy())
}

/// 去掉 `.` 路径段, 合并重复的分隔符. `..` 原样保留.
fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// 列出所有匹配 glob 模式 `pattern` 的普通文件. 结果已排序去重.
fn list_files(pattern: &str) -> CohortResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in glob::glob_with(pattern, MATCH_OPTIONS)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files.into_iter().sorted().dedup().collect())
}
