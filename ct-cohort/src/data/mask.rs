//! 单个观察者的器官标注.

use std::collections::BTreeMap;
use std::ops::Index;

use ndarray::{Array3, Array4, Axis};

/// 单个观察者对单个病人所做的全部器官标注.
///
/// 器官名唯一, 内部按器官名排序. 观察者名允许为空字符串, 表示 "单一/无观察者".
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mask {
    observer: String,
    organs: BTreeMap<String, Array3<u8>>,
}

impl Mask {
    /// 由 `(器官名, 标注)` 序列构建. 器官名重复时, 后出现的覆盖先出现的.
    pub fn new<I, K, S>(organs: I, observer: S) -> Self
    where
        I: IntoIterator<Item = (K, Array3<u8>)>,
        K: Into<String>,
        S: Into<String>,
    {
        Self {
            observer: observer.into(),
            organs: organs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// 创建不含任何器官的标注.
    #[inline]
    pub fn empty<S: Into<String>>(observer: S) -> Self {
        Self {
            observer: observer.into(),
            organs: BTreeMap::new(),
        }
    }

    /// 插入一个器官的标注. 若该器官已存在, 返回被覆盖的旧标注.
    #[inline]
    pub(crate) fn insert(&mut self, organ: String, mask: Array3<u8>) -> Option<Array3<u8>> {
        self.organs.insert(organ, mask)
    }

    /// 观察者名.
    #[inline]
    pub fn observer(&self) -> &str {
        &self.observer
    }

    /// 获取器官 `organ` 的标注.
    #[inline]
    pub fn get(&self, organ: &str) -> Option<&Array3<u8>> {
        self.organs.get(organ)
    }

    /// 是否包含器官 `organ`?
    #[inline]
    pub fn contains(&self, organ: &str) -> bool {
        self.organs.contains_key(organ)
    }

    /// 按字典序迭代所有器官名.
    #[inline]
    pub fn organ_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.organs.keys().map(String::as_str)
    }

    /// 按器官名字典序迭代 `(器官名, 标注)`.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Array3<u8>)> {
        self.organs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 器官个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.organs.len()
    }

    /// 是否不含任何器官?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.organs.is_empty()
    }

    /// 按 `organ_ordering` 给定的顺序, 将各器官标注沿新增的最后一维堆叠,
    /// 得到形如 `[z, H, W, n_organs]` 的数组.
    ///
    /// 若任一器官不存在、各标注形状不一致或 `organ_ordering` 为空, 则返回 `None`.
    pub fn stack(&self, organ_ordering: &[&str]) -> Option<Array4<u8>> {
        let views = organ_ordering
            .iter()
            .map(|organ| self.get(organ).map(|a| a.view()))
            .collect::<Option<Vec<_>>>()?;
        if views.is_empty() {
            return None;
        }
        ndarray::stack(Axis(3), &views).ok()
    }
}

impl Index<&str> for Mask {
    type Output = Array3<u8>;

    /// 当器官不存在时 panic.
    #[inline]
    fn index(&self, organ: &str) -> &Self::Output {
        match self.organs.get(organ) {
            Some(mask) => mask,
            None => panic!("观察者 `{}` 的标注中没有器官 `{organ}`", self.observer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Mask;
    use ndarray::{arr3, Array3};

    fn two_organs() -> Mask {
        Mask::new(
            [
                ("organ_1", arr3(&[[[1u8, 1], [0, 1]]])),
                ("organ_2", arr3(&[[[0u8, 1], [1, 0]]])),
            ],
            "",
        )
    }

    #[test]
    fn test_retrieve_mask_for_valid_organ() {
        let mask = two_organs();
        assert_eq!(mask["organ_1"], arr3(&[[[1u8, 1], [0, 1]]]));
        assert_eq!(mask.get("organ_2"), Some(&arr3(&[[[0u8, 1], [1, 0]]])));
        assert_eq!(mask.get("organ_3"), None);
        assert_eq!(mask.observer(), "");
        assert_eq!(mask.organ_names().collect::<Vec<_>>(), ["organ_1", "organ_2"]);
        assert_eq!(mask.len(), 2);
    }

    #[test]
    #[should_panic]
    fn test_index_unknown_organ() {
        let _ = &two_organs()["liver"];
    }

    #[test]
    fn test_duplicate_organ_overwrites() {
        let mask = Mask::new(
            [
                ("liver", Array3::<u8>::zeros((1, 1, 1))),
                ("liver", Array3::<u8>::ones((1, 1, 1))),
            ],
            "obsA",
        );
        assert_eq!(mask.len(), 1);
        assert_eq!(mask["liver"][(0, 0, 0)], 1);
    }

    #[test]
    fn test_stack() {
        let mask = two_organs();
        let stacked = mask.stack(&["organ_2", "organ_1"]).unwrap();
        assert_eq!(stacked.shape(), &[1, 2, 2, 2]);
        assert_eq!(stacked[(0, 0, 0, 0)], 0);
        assert_eq!(stacked[(0, 0, 0, 1)], 1);
        assert_eq!(stacked[(0, 1, 0, 0)], 1);

        assert!(mask.stack(&["organ_1", "liver"]).is_none());
        assert!(mask.stack(&[]).is_none());

        let mismatch = Mask::new(
            [
                ("a", Array3::<u8>::zeros((1, 2, 2))),
                ("b", Array3::<u8>::zeros((2, 2, 2))),
            ],
            "",
        );
        assert!(mismatch.stack(&["a", "b"]).is_none());
    }

    #[test]
    fn test_empty() {
        let mask = Mask::empty("obsB");
        assert!(mask.is_empty());
        assert_eq!(mask.organ_names().len(), 0);
        assert_eq!(mask.observer(), "obsB");
    }
}
