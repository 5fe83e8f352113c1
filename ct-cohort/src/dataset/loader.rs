//! 按占位符模板加载病人数据.
//!
//! 所有操作都是其参数与当前文件系统内容的纯函数, 不在调用之间保留任何状态.
//! [`ObserverMasks`] 和 [`PatientScans`] 是单次遍历的惰性迭代器: 创建时只确定
//! 待加载的键 (观察者名或病人 ID), 真正的文件读取发生在每次 `next` 时.

use std::path::Path;

use itertools::Itertools;
use ndarray::Array3;

use crate::consts::placeholder::{
    self, MASK_REQUIRED, OBSERVER, ORGAN, PATIENT_ID, VOLUME_REQUIRED,
};
use crate::data::{Mask, NiftiReader, PatientScan, VolumeReader};
use crate::dataset::DataConfig;
use crate::error::{CohortError, CohortResult};
use crate::resolve::{resolve, resolve_single, ResolvedPath};
use crate::template::Template;

/// 数据集加载器. 负责把模板解析、文件匹配和体数据读取组装为 [`Mask`] 和
/// [`PatientScan`].
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader<R = NiftiReader> {
    reader: R,
}

impl DatasetLoader<NiftiReader> {
    /// 创建读取 nifti 文件的加载器.
    #[inline]
    pub fn new() -> Self {
        Self {
            reader: NiftiReader,
        }
    }
}

impl<R: VolumeReader> DatasetLoader<R> {
    /// 使用自定义的体数据读取器创建加载器.
    #[inline]
    pub fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    /// 底层体数据读取器.
    #[inline]
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// 读取 `path` 处的 CT 扫描. 读取错误原样返回.
    #[inline]
    pub fn load_volume<P: AsRef<Path>>(&self, path: P) -> CohortResult<Array3<f32>> {
        self.reader.read_volume(path.as_ref())
    }

    /// 加载单个观察者对单个病人的全部器官标注.
    ///
    /// `mask_template` 必须含有 `{organ}`, 且不能再有其他未替换的占位符.
    /// 没有找到任何器官文件时返回空的 [`Mask`]. 同一器官出现多次时,
    /// 按路径字典序靠后的文件覆盖靠前的.
    pub fn load_mask(&self, mask_template: &Template, observer: &str) -> CohortResult<Mask> {
        mask_template.require(&[ORGAN])?;
        log::info!("加载标注: `{mask_template}`, 观察者 `{observer}`");

        let mut mask = Mask::empty(observer);
        for resolved in resolve(mask_template, &[ORGAN])? {
            let (path, mut values) = resolved.into_parts();
            // `resolve` 保证每个通配占位符都有取值.
            let organ = values.remove(ORGAN).unwrap_or_default();
            let data = self.reader.read_mask(&path)?;
            if mask.insert(organ.clone(), data).is_some() {
                log::warn!(
                    "观察者 `{observer}` 的器官 `{organ}` 重复, 使用 {}",
                    path.display()
                );
            }
        }
        Ok(mask)
    }

    /// 加载单个病人所有观察者的标注. 每个不同的观察者对应一个 [`Mask`],
    /// 按观察者名字典序惰性产出.
    ///
    /// `mask_template` 必须含有 `{organ}` 和 `{observer}`, 且不能再有其他
    /// 未替换的占位符.
    pub fn load_mask_multiple_observers(
        &self,
        mask_template: &Template,
    ) -> CohortResult<ObserverMasks<'_, R>> {
        mask_template.require(&[ORGAN, OBSERVER])?;
        log::info!("枚举观察者: `{mask_template}`");

        let observers = distinct_values(resolve(mask_template, &[ORGAN, OBSERVER])?, OBSERVER);
        Ok(ObserverMasks {
            loader: self,
            template: mask_template.clone(),
            observers_rev: observers.into_iter().rev().collect(),
        })
    }

    /// 加载病人 `patient_id` 的 CT 扫描及其所有观察者的标注.
    ///
    /// # 错误
    ///
    /// 1. 模板缺少必需的占位符时返回配置错误, 此时不会进行任何 I/O.
    /// 2. 扫描模板没有匹配到文件时返回 [`CohortError::NotFound`],
    ///   匹配到多个不同文件时返回 [`CohortError::Ambiguous`].
    /// 3. 标注模板中除三个特殊占位符外的其他占位符在该病人的文件中
    ///   出现多个不同取值时, 返回 [`CohortError::AmbiguousValue`].
    pub fn load_patient_scan(
        &self,
        volume_template: &Template,
        mask_template: &Template,
        patient_id: &str,
    ) -> CohortResult<PatientScan> {
        check_templates(volume_template, mask_template)?;
        log::info!("加载病人 `{patient_id}`");

        let volume_template = volume_template.substitute(PATIENT_ID, patient_id)?;
        let mask_template = mask_template.substitute(PATIENT_ID, patient_id)?;

        let volume_path = resolve_single(&volume_template, &volume_template.placeholders())?;
        let volume = self.load_volume(volume_path.path())?;

        let masks = match fix_extra_placeholders(&mask_template)? {
            Some(mask_template) => self
                .load_mask_multiple_observers(&mask_template)?
                .collect::<CohortResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(PatientScan::new(patient_id.to_owned(), volume, masks))
    }

    /// 枚举扫描模板能匹配到的所有病人, 按病人 ID 字典序惰性加载.
    ///
    /// 模板检查和病人枚举在调用时立即完成; 每个病人的数据仅在迭代到它时才读取,
    /// 其错误也只在此时产出, 是否跳过由调用方决定.
    pub fn load_patient_scans(
        &self,
        volume_template: &Template,
        mask_template: &Template,
    ) -> CohortResult<PatientScans<'_, R>> {
        check_templates(volume_template, mask_template)?;
        log::info!("枚举病人: `{volume_template}`");

        let resolved = resolve(volume_template, &volume_template.placeholders())?;
        let patient_ids = distinct_values(resolved, PATIENT_ID);
        log::info!("共找到 {} 个病人", patient_ids.len());

        Ok(PatientScans {
            loader: self,
            volume_template: volume_template.clone(),
            mask_template: mask_template.clone(),
            patient_ids_rev: patient_ids.into_iter().rev().collect(),
        })
    }

    /// 按配置 `config` 中的模板枚举并惰性加载所有病人.
    pub fn patient_scans_from_config(
        &self,
        config: &DataConfig,
    ) -> CohortResult<PatientScans<'_, R>> {
        let volume_template = config.volume_template()?;
        let mask_template = config.mask_template()?;
        self.load_patient_scans(&volume_template, &mask_template)
    }
}

/// 检查扫描模板与标注模板含有各自必需的占位符.
fn check_templates(volume_template: &Template, mask_template: &Template) -> CohortResult<()> {
    volume_template.require(&VOLUME_REQUIRED)?;
    mask_template.require(&MASK_REQUIRED)
}

/// 收集所有解析结果中占位符 `name` 的不同取值, 按字典序排列.
fn distinct_values(resolved: Vec<ResolvedPath>, name: &str) -> Vec<String> {
    resolved
        .into_iter()
        .filter_map(|r| r.into_parts().1.remove(name))
        .sorted()
        .dedup()
        .collect()
}

/// 将标注模板中除 `{organ}` 和 `{observer}` 以外的占位符替换为其唯一取值.
///
/// 没有额外占位符时原样返回. 没有任何文件匹配时返回 `None`.
fn fix_extra_placeholders(template: &Template) -> CohortResult<Option<Template>> {
    let extras: Vec<&str> = template
        .placeholders()
        .into_iter()
        .filter(|name| !placeholder::is_required(name))
        .collect();
    if extras.is_empty() {
        return Ok(Some(template.clone()));
    }

    let resolved = resolve(template, &template.placeholders())?;
    if resolved.is_empty() {
        return Ok(None);
    }

    let mut bindings = Vec::with_capacity(extras.len());
    for name in extras {
        let mut values = distinct_values(resolved.clone(), name);
        if values.len() > 1 {
            return Err(CohortError::AmbiguousValue {
                name: name.to_owned(),
                values,
            });
        }
        bindings.push((name, values.remove(0)));
    }

    template
        .substitute_all(bindings.iter().map(|(name, value)| (*name, value.as_str())))
        .map(Some)
}

/// 单个病人各观察者标注的惰性迭代器. 由
/// [`DatasetLoader::load_mask_multiple_observers`] 创建.
#[derive(Debug)]
pub struct ObserverMasks<'a, R> {
    loader: &'a DatasetLoader<R>,
    template: Template,
    observers_rev: Vec<String>,
}

impl<R> ObserverMasks<'_, R> {
    /// 尚未加载的观察者, 按迭代顺序排列.
    pub fn observers(&self) -> impl Iterator<Item = &str> {
        self.observers_rev.iter().rev().map(String::as_str)
    }
}

impl<R: VolumeReader> Iterator for ObserverMasks<'_, R> {
    type Item = CohortResult<Mask>;

    fn next(&mut self) -> Option<Self::Item> {
        let observer = self.observers_rev.pop()?;
        let mask = self
            .template
            .substitute(OBSERVER, &observer)
            .and_then(|t| self.loader.load_mask(&t, &observer));
        Some(mask)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<R: VolumeReader> ExactSizeIterator for ObserverMasks<'_, R> {
    #[inline]
    fn len(&self) -> usize {
        self.observers_rev.len()
    }
}

/// 全部病人的惰性迭代器. 由 [`DatasetLoader::load_patient_scans`] 创建.
///
/// 每次迭代产出 `(病人 ID, 加载结果)`.
#[derive(Debug)]
pub struct PatientScans<'a, R> {
    loader: &'a DatasetLoader<R>,
    volume_template: Template,
    mask_template: Template,
    patient_ids_rev: Vec<String>,
}

impl<R> PatientScans<'_, R> {
    /// 尚未加载的病人 ID, 按迭代顺序排列.
    pub fn patient_ids(&self) -> impl Iterator<Item = &str> {
        self.patient_ids_rev.iter().rev().map(String::as_str)
    }
}

impl<R: VolumeReader> Iterator for PatientScans<'_, R> {
    type Item = (String, CohortResult<PatientScan>);

    fn next(&mut self) -> Option<Self::Item> {
        let patient_id = self.patient_ids_rev.pop()?;
        let scan =
            self.loader
                .load_patient_scan(&self.volume_template, &self.mask_template, &patient_id);
        Some((patient_id, scan))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<R: VolumeReader> ExactSizeIterator for PatientScans<'_, R> {
    #[inline]
    fn len(&self) -> usize {
        self.patient_ids_rev.len()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl<R: VolumeReader + Sync> DatasetLoader<R> {
    /// 借助 `rayon`, 并行地加载扫描模板能匹配到的所有病人.
    ///
    /// 结果按病人 ID 字典序排列. 单个病人的加载错误不影响其他病人.
    pub fn par_load_patient_scans(
        &self,
        volume_template: &Template,
        mask_template: &Template,
    ) -> CohortResult<Vec<(String, CohortResult<PatientScan>)>> {
        let patient_ids: Vec<String> = self
            .load_patient_scans(volume_template, mask_template)?
            .patient_ids()
            .map(str::to_owned)
            .collect();

        Ok(patient_ids
            .into_par_iter()
            .map(|patient_id| {
                let scan = self.load_patient_scan(volume_template, mask_template, &patient_id);
                (patient_id, scan)
            })
            .collect())
    }
}
