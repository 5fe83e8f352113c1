//! 路径模板.
//!
//! 模板是夹杂着 `{name}` 形式占位符的普通路径字符串, 例如
//! `/data/{patient_id}_CT_{organ}_{observer}.nii.gz`. 模板在构造时解析为
//! 字面量片段和占位符片段的序列, 此后不可变.

use std::fmt;
use std::str::FromStr;

use crate::error::{CohortError, CohortResult};
use crate::matcher::{CapturePattern, Part};

/// 模板片段.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
enum Token {
    Literal(String),
    Placeholder(String),
}

/// 不可变路径模板.
///
/// 同一模板中占位符名唯一. 占位符名非空, 且不含 `{`, `}` 和路径分隔符.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Template {
    tokens: Vec<Token>,
}

impl Template {
    /// 解析模板. 语法错误或占位符重名时返回 `Err`.
    pub fn new(template: &str) -> CohortResult<Self> {
        let malformed = |reason| CohortError::MalformedTemplate {
            template: template.to_owned(),
            reason,
        };

        let mut tokens = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find(['{', '}']) {
            if rest.as_bytes()[open] == b'}' {
                return Err(malformed("多余的 `}`"));
            }
            push_literal(&mut tokens, &rest[..open]);

            let after = &rest[open + 1..];
            let close = after.find(['{', '}']).ok_or_else(|| malformed("`{` 未闭合"))?;
            if after.as_bytes()[close] == b'{' {
                return Err(malformed("占位符不能嵌套"));
            }
            let name = &after[..close];
            if name.is_empty() {
                return Err(malformed("占位符名为空"));
            }
            if name.chars().any(std::path::is_separator) {
                return Err(malformed("占位符名含有路径分隔符"));
            }
            if tokens.contains(&Token::Placeholder(name.to_owned())) {
                return Err(CohortError::DuplicatePlaceholder {
                    template: template.to_owned(),
                    name: name.to_owned(),
                });
            }
            tokens.push(Token::Placeholder(name.to_owned()));
            rest = &after[close + 1..];
        }
        push_literal(&mut tokens, rest);

        Ok(Self { tokens })
    }

    /// 按出现顺序获取所有占位符名.
    pub fn placeholders(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Placeholder(name) => Some(name.as_str()),
                Token::Literal(_) => None,
            })
            .collect()
    }

    /// 模板是否含有占位符 `{name}`?
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.placeholders().contains(&name)
    }

    /// 模板是否已不含任何占位符?
    #[inline]
    pub fn is_concrete(&self) -> bool {
        self.placeholders().is_empty()
    }

    /// 检查模板含有 `names` 中的所有占位符. 缺少任一个时返回 `Err`.
    pub fn require(&self, names: &[&str]) -> CohortResult<()> {
        match names.iter().find(|name| !self.contains(name)) {
            Some(name) => Err(CohortError::MissingPlaceholder {
                template: self.to_string(),
                name: (*name).to_owned(),
            }),
            None => Ok(()),
        }
    }

    /// 将占位符 `{name}` 替换为字面量 `value`, 返回新模板.
    ///
    /// 若模板不含 `{name}`, 或 `value` 含有花括号, 则返回 `Err`.
    pub fn substitute(&self, name: &str, value: &str) -> CohortResult<Self> {
        self.require(&[name])?;
        if value.contains(['{', '}']) {
            return Err(CohortError::InvalidValue {
                name: name.to_owned(),
                value: value.to_owned(),
            });
        }

        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in self.tokens.iter() {
            match token {
                Token::Placeholder(p) if p == name => push_literal(&mut tokens, value),
                Token::Literal(lit) => push_literal(&mut tokens, lit),
                other => tokens.push(other.clone()),
            }
        }
        Ok(Self { tokens })
    }

    /// 依次替换 `bindings` 给出的所有 `(占位符名, 值)`.
    pub fn substitute_all<'a, I>(&self, bindings: I) -> CohortResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        bindings
            .into_iter()
            .try_fold(self.clone(), |t, (name, value)| t.substitute(name, value))
    }

    /// 生成可用于文件系统 glob 的模式.
    ///
    /// `wildcards` 中的每个占位符变为单段通配符 `*`, 字面量部分会被转义.
    /// 若 `wildcards` 中有模板不含的占位符, 或模板中还剩有不在 `wildcards`
    /// 中的占位符, 则返回 `Err`.
    pub fn to_matchable_pattern(&self, wildcards: &[&str]) -> CohortResult<String> {
        self.require(wildcards)?;

        let mut pattern = String::new();
        for token in self.tokens.iter() {
            match token {
                Token::Literal(lit) => pattern.push_str(&glob::Pattern::escape(lit)),
                Token::Placeholder(name) if wildcards.contains(&name.as_str()) => {
                    pattern.push('*')
                }
                Token::Placeholder(name) => {
                    return Err(CohortError::UnresolvedPlaceholder {
                        template: self.to_string(),
                        name: name.clone(),
                    })
                }
            }
        }
        Ok(pattern)
    }

    /// 生成捕获模式. `names` 中的每个占位符成为一个捕获组,
    /// 捕获组顺序与其在模板中出现的顺序一致; 其余占位符只匹配、不捕获.
    ///
    /// 若 `names` 中有模板不含的占位符, 则返回 `Err`.
    pub fn to_capture_pattern(&self, names: &[&str]) -> CohortResult<CapturePattern> {
        self.require(names)?;

        let mut captured = Vec::new();
        let parts = self
            .tokens
            .iter()
            .map(|token| match token {
                Token::Literal(lit) => Part::Literal(lit.clone()),
                Token::Placeholder(name) if names.contains(&name.as_str()) => {
                    captured.push(name.clone());
                    Part::Capture(captured.len() - 1)
                }
                Token::Placeholder(_) => Part::Skip,
            })
            .collect();

        Ok(CapturePattern::new(self.to_string(), parts, captured))
    }
}

/// 追加字面量, 并与末尾的字面量合并.
fn push_literal(tokens: &mut Vec<Token>, lit: &str) {
    if lit.is_empty() {
        return;
    }
    match tokens.last_mut() {
        Some(Token::Literal(last)) => last.push_str(lit),
        _ => tokens.push(Token::Literal(lit.to_owned())),
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.tokens.iter() {
            match token {
                Token::Literal(lit) => f.write_str(lit)?,
                Token::Placeholder(name) => write!(f, "{{{name}}}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Template {
    type Err = CohortError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Template {
    type Error = CohortError;

    #[inline]
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::Template;
    use crate::error::{CohortError, ErrorKind};

    fn kind_of(template: &str) -> ErrorKind {
        Template::new(template).unwrap_err().kind()
    }

    #[test]
    fn test_parse_placeholders_in_order() {
        let t = Template::new("/data/{patient_id}_CT_{organ}_{observer}.nii.gz").unwrap();
        assert_eq!(t.placeholders(), ["patient_id", "organ", "observer"]);
        assert!(t.contains("organ"));
        assert!(!t.contains("modality"));
        assert!(!t.is_concrete());
        assert_eq!(
            t.to_string(),
            "/data/{patient_id}_CT_{organ}_{observer}.nii.gz"
        );

        let t = Template::new("/data/volume.nii").unwrap();
        assert!(t.placeholders().is_empty());
        assert!(t.is_concrete());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(kind_of("/data/{patient_id"), ErrorKind::Configuration);
        assert_eq!(kind_of("/data/patient_id}"), ErrorKind::Configuration);
        assert_eq!(kind_of("/data/{}.nii"), ErrorKind::Configuration);
        assert_eq!(kind_of("/data/{a{b}}.nii"), ErrorKind::Configuration);
        assert_eq!(kind_of("/data/{a/b}.nii"), ErrorKind::Configuration);

        let err = Template::new("{patient_id}/{patient_id}.nii").unwrap_err();
        assert!(matches!(err, CohortError::DuplicatePlaceholder { ref name, .. } if name == "patient_id"));
    }

    #[test]
    fn test_require() {
        let t = Template::new("{patient_id}_CT.nii").unwrap();
        assert!(t.require(&["patient_id"]).is_ok());
        assert!(t.require(&[]).is_ok());

        let err = t.require(&["patient_id", "organ"]).unwrap_err();
        assert!(matches!(err, CohortError::MissingPlaceholder { ref name, .. } if name == "organ"));
    }

    #[test]
    fn test_substitute() {
        let t = Template::new("/d/{patient_id}_CT_{organ}.nii").unwrap();
        let s = t.substitute("patient_id", "p1").unwrap();
        assert_eq!(s.to_string(), "/d/p1_CT_{organ}.nii");
        assert_eq!(s.placeholders(), ["organ"]);
        assert_eq!(s, Template::new("/d/p1_CT_{organ}.nii").unwrap());

        // 原模板不变.
        assert_eq!(t.placeholders(), ["patient_id", "organ"]);

        let err = s.substitute("patient_id", "p2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = t.substitute("organ", "{x}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let all = t
            .substitute_all([("patient_id", "p3"), ("organ", "liver")])
            .unwrap();
        assert!(all.is_concrete());
        assert_eq!(all.to_string(), "/d/p3_CT_liver.nii");
    }

    #[test]
    fn test_matchable_pattern() {
        let t = Template::new("/d/[x]/{patient_id}_{organ}.nii").unwrap();
        assert_eq!(
            t.to_matchable_pattern(&["patient_id", "organ"]).unwrap(),
            "/d/[[]x[]]/*_*.nii"
        );

        let err = t.to_matchable_pattern(&["organ"]).unwrap_err();
        assert!(matches!(err, CohortError::UnresolvedPlaceholder { ref name, .. } if name == "patient_id"));

        let err = t
            .to_matchable_pattern(&["patient_id", "organ", "observer"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let concrete = Template::new("/d/p1.nii").unwrap();
        assert_eq!(concrete.to_matchable_pattern(&[]).unwrap(), "/d/p1.nii");
    }

    #[test]
    fn test_capture_pattern_unknown_name() {
        let t = Template::new("{patient_id}_CT.nii").unwrap();
        assert!(t.to_capture_pattern(&["patient_id"]).is_ok());
        assert_eq!(
            t.to_capture_pattern(&["organ"]).unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }
}
