//! 单个病人的扫描与标注.

use std::ops::Index;

use ndarray::Array3;

use super::Mask;

/// 单个病人的 3D CT 扫描, 以及所有观察者的器官标注.
///
/// 只能由 [`DatasetLoader`](crate::dataset::DatasetLoader) 构建, 构建后不可变.
/// 标注按观察者名字典序排列, 每个观察者恰好一个.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PatientScan {
    patient_id: String,
    volume: Array3<f32>,
    masks: Vec<Mask>,
}

impl PatientScan {
    pub(crate) fn new(patient_id: String, volume: Array3<f32>, masks: Vec<Mask>) -> Self {
        debug_assert!(masks
            .windows(2)
            .all(|w| w[0].observer() < w[1].observer()));
        Self {
            patient_id,
            volume,
            masks,
        }
    }

    /// 病人 ID.
    #[inline]
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// CT 扫描 (HU), 按 `[z, H, W]` 组织.
    #[inline]
    pub fn volume(&self) -> &Array3<f32> {
        &self.volume
    }

    /// 所有观察者的标注.
    #[inline]
    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// 按字典序迭代所有观察者名.
    #[inline]
    pub fn observers(&self) -> impl ExactSizeIterator<Item = &str> {
        self.masks.iter().map(Mask::observer)
    }

    /// 获取观察者 `observer` 的标注.
    pub fn mask(&self, observer: &str) -> Option<&Mask> {
        self.masks
            .binary_search_by(|m| m.observer().cmp(observer))
            .ok()
            .map(|i| &self.masks[i])
    }

    /// 拆分为 (病人 ID, CT 扫描, 标注).
    #[inline]
    pub fn into_parts(self) -> (String, Array3<f32>, Vec<Mask>) {
        (self.patient_id, self.volume, self.masks)
    }
}

impl Index<&str> for PatientScan {
    type Output = Mask;

    /// 当观察者不存在时 panic.
    #[inline]
    fn index(&self, observer: &str) -> &Self::Output {
        match self.mask(observer) {
            Some(mask) => mask,
            None => panic!("病人 `{}` 没有观察者 `{observer}` 的标注", self.patient_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PatientScan;
    use crate::data::Mask;
    use ndarray::Array3;

    fn scan() -> PatientScan {
        let organ = || Array3::<u8>::zeros((1, 1, 1));
        PatientScan::new(
            "p1".to_owned(),
            Array3::zeros((1, 1, 1)),
            vec![
                Mask::new([("liver", organ())], ""),
                Mask::new([("liver", organ()), ("kidney", organ())], "obsA"),
                Mask::new([("kidney", organ())], "obsB"),
            ],
        )
    }

    #[test]
    fn test_lookup_by_observer() {
        let scan = scan();
        assert_eq!(scan.patient_id(), "p1");
        assert_eq!(scan.observers().collect::<Vec<_>>(), ["", "obsA", "obsB"]);
        assert_eq!(scan[""].organ_names().collect::<Vec<_>>(), ["liver"]);
        assert_eq!(scan["obsA"].len(), 2);
        assert!(scan.mask("obsC").is_none());
    }

    #[test]
    #[should_panic]
    fn test_index_unknown_observer() {
        let _ = &scan()["obsC"];
    }
}
