//! 通用常量.

/// 具有特殊含义的占位符名.
pub mod placeholder {
    /// 病人 ID. 扫描模板和标注模板都必须含有该占位符.
    pub const PATIENT_ID: &str = "patient_id";

    /// 器官名.
    pub const ORGAN: &str = "organ";

    /// 观察者 (标注者) 名.
    pub const OBSERVER: &str = "observer";

    /// 扫描模板必须含有的占位符.
    pub const VOLUME_REQUIRED: [&str; 1] = [PATIENT_ID];

    /// 标注模板必须含有的占位符.
    pub const MASK_REQUIRED: [&str; 3] = [PATIENT_ID, ORGAN, OBSERVER];

    /// 占位符 `name` 是否是三个特殊占位符之一?
    #[inline]
    pub fn is_required(name: &str) -> bool {
        MASK_REQUIRED.contains(&name)
    }
}

/// 环境变量名.
pub mod env {
    /// 数据集根目录.
    pub const DATA_DIR: &str = "COHORT_DATA_DIR";

    /// 扫描文件名模板.
    pub const VOLUME_PATTERN: &str = "COHORT_VOLUME_PATTERN";

    /// 标注文件名模板.
    pub const MASK_PATTERN: &str = "COHORT_MASK_PATTERN";
}

/// 默认扫描文件名模板.
pub const DEFAULT_VOLUME_PATTERN: &str = "{patient_id}_CT.nii.gz";

/// 默认标注文件名模板.
pub const DEFAULT_MASK_PATTERN: &str = "{patient_id}_CT_{organ}_{observer}.nii.gz";
