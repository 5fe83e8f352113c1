//! 从具体路径中提取占位符取值.

use std::path::Path;

use crate::error::{CohortError, CohortResult};
use crate::template::Template;

/// 捕获模式片段.
#[derive(Clone, Debug)]
pub(crate) enum Part {
    /// 必须原样出现的文本.
    Literal(String),

    /// 捕获组, 参数为捕获序号.
    Capture(usize),

    /// 只匹配、不捕获的占位符.
    Skip,
}

/// 捕获模式. 由 [`Template::to_capture_pattern`] 生成.
///
/// 每个占位符匹配单个路径段内的任意文本 (可为空). 存在多种切分方式时,
/// 从左到右, 靠前的占位符取尽可能长的文本.
#[derive(Clone, Debug)]
pub struct CapturePattern {
    template: String,
    parts: Vec<Part>,
    names: Vec<String>,
}

impl CapturePattern {
    pub(crate) fn new(template: String, parts: Vec<Part>, names: Vec<String>) -> Self {
        Self {
            template,
            parts,
            names,
        }
    }

    /// 捕获组对应的占位符名, 按模板中出现的顺序排列.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 匹配 `text`. 成功时按捕获组顺序返回所有捕获值, 否则返回 `None`.
    pub fn captures<'a>(&self, text: &'a str) -> Option<Vec<&'a str>> {
        let mut slots = vec![None; self.names.len()];
        if !match_parts(&self.parts, text, &mut slots) {
            return None;
        }
        slots.into_iter().collect()
    }

    /// 匹配路径 `path`, 按 `names` 给定的顺序返回捕获值.
    ///
    /// 路径不匹配, 或 `names` 中有不属于捕获组的名字时返回 `Err`.
    pub fn extract(&self, path: &Path, names: &[&str]) -> CohortResult<Vec<String>> {
        let mismatch = || CohortError::PathMismatch {
            path: path.to_owned(),
            template: self.template.clone(),
        };

        let text = path.to_str().ok_or_else(mismatch)?;
        let caps = self.captures(text).ok_or_else(mismatch)?;

        names
            .iter()
            .map(|name| {
                self.names
                    .iter()
                    .position(|n| n == name)
                    .map(|i| caps[i].to_owned())
                    .ok_or_else(|| CohortError::MissingPlaceholder {
                        template: self.template.clone(),
                        name: (*name).to_owned(),
                    })
            })
            .collect()
    }
}

/// 回溯匹配. 占位符不跨越路径分隔符.
fn match_parts<'a>(parts: &[Part], text: &'a str, slots: &mut [Option<&'a str>]) -> bool {
    let Some((head, rest)) = parts.split_first() else {
        return text.is_empty();
    };

    match head {
        Part::Literal(lit) => text
            .strip_prefix(lit.as_str())
            .is_some_and(|remain| match_parts(rest, remain, slots)),
        Part::Capture(_) | Part::Skip => {
            let segment_end = text.find(std::path::is_separator).unwrap_or(text.len());
            for end in (0..=segment_end).rev() {
                if !text.is_char_boundary(end) {
                    continue;
                }
                if let Part::Capture(slot) = head {
                    slots[*slot] = Some(&text[..end]);
                }
                if match_parts(rest, &text[end..], slots) {
                    return true;
                }
            }
            if let Part::Capture(slot) = head {
                slots[*slot] = None;
            }
            false
        }
    }
}

/// 从 `path` 中提取 `template` 里 `names` 对应占位符的取值, 顺序与 `names` 一致.
///
/// 若路径并非由该模板生成, 则返回 `Err`.
pub fn extract<P: AsRef<Path>>(
    path: P,
    template: &Template,
    names: &[&str],
) -> CohortResult<Vec<String>> {
    template
        .to_capture_pattern(names)?
        .extract(path.as_ref(), names)
}

#[cfg(test)]
mod tests {
    use super::extract;
    use crate::error::{CohortError, ErrorKind};
    use crate::template::Template;

    fn t(s: &str) -> Template {
        Template::new(s).unwrap()
    }

    #[test]
    fn test_extract_in_requested_order() {
        let template = t("/d/{patient_id}_CT_{organ}_{observer}.nii");
        let path = "/d/p1_CT_liver_obsA.nii";

        assert_eq!(
            extract(path, &template, &["observer", "patient_id"]).unwrap(),
            ["obsA", "p1"]
        );
        assert_eq!(
            extract(path, &template, &["patient_id", "organ", "observer"]).unwrap(),
            ["p1", "liver", "obsA"]
        );
        assert!(extract(path, &template, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_capture_group_order_follows_template() {
        let template = t("/d/{patient_id}_CT_{organ}_{observer}.nii");
        let pattern = template.to_capture_pattern(&["observer", "organ"]).unwrap();
        assert_eq!(pattern.names(), ["organ", "observer"]);
        assert_eq!(
            pattern.captures("/d/p7_CT_bladder_x.nii").unwrap(),
            ["bladder", "x"]
        );
    }

    #[test]
    fn test_round_trip() {
        let template = t("/data/{patient_id}/scan_{patient_id_suffix}.nii.gz");
        for value in ["p1", "0042", "a.b-c", "患者", ""] {
            let path = template
                .substitute("patient_id", value)
                .unwrap()
                .substitute("patient_id_suffix", "z")
                .unwrap()
                .to_string();
            assert_eq!(extract(&path, &template, &["patient_id"]).unwrap(), [value]);
        }
    }

    #[test]
    fn test_greedy_split() {
        let template = t("{organ}_{observer}.nii");
        assert_eq!(
            extract("Femur_Head_L_obs1.nii", &template, &["organ", "observer"]).unwrap(),
            ["Femur_Head_L", "obs1"]
        );
    }

    #[test]
    fn test_placeholder_stays_in_one_segment() {
        let template = t("/d/{patient_id}_CT.nii");
        let err = extract("/d/sub/p1_CT.nii", &template, &["patient_id"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ambiguity);

        let template = t("/d/{patient_id}/CT.nii");
        assert_eq!(
            extract("/d/p9/CT.nii", &template, &["patient_id"]).unwrap(),
            ["p9"]
        );
    }

    #[test]
    fn test_uncaptured_placeholder_still_matches() {
        let template = t("/d/{patient_id}_{modality}.nii");
        assert_eq!(
            extract("/d/p1_CT.nii", &template, &["patient_id"]).unwrap(),
            ["p1"]
        );
    }

    #[test]
    fn test_mismatch() {
        let template = t("/d/{patient_id}_CT.nii");
        let err = extract("/d/p1_MR.nii", &template, &["patient_id"]).unwrap_err();
        assert!(matches!(err, CohortError::PathMismatch { .. }));

        let err = extract("/d/p1_CT.nii.gz", &template, &["patient_id"]).unwrap_err();
        assert!(matches!(err, CohortError::PathMismatch { .. }));
    }
}
