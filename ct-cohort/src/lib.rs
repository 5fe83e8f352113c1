#![warn(missing_docs)]
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 按占位符模板发现、匹配并组装多文件、多观察者的 3D CT 数据集.
//!
//! 数据集中的文件按同一套命名模板组织, 例如:
//!
//! ```text
//! /data/{patient_id}_CT.nii.gz                     <- 扫描
//! /data/{patient_id}_CT_{organ}_{observer}.nii.gz  <- 标注
//! ```
//!
//! 给定这样一对模板, 本 crate 可以找出某个病人的全部文件, 区分每个标注文件
//! 对应的器官和观察者, 并为每个病人组装一个 [`PatientScan`]: 一份扫描加上
//! 每个观察者一份 [`Mask`].
//!
//! # 组成
//!
//! 1. [`Template`]: 模板解析、占位符替换、生成 glob 模式和捕获模式.
//! 2. [`resolve`]: 将通配占位符展开为磁盘上实际存在的文件.
//! 3. [`matcher`]: 从具体路径中提取占位符取值.
//! 4. [`DatasetLoader`]: 组装 [`Mask`] 和 [`PatientScan`], 并惰性枚举所有病人.
//!
//! # 注意
//!
//! 1. 所有解析结果都按路径字典序排列, 文件系统不变时结果完全确定.
//! 2. 要求唯一的解析匹配到多个文件时返回错误, 而不是任选其一.
//! 3. 本 crate 不检查体数据内容, 不做重采样, 也不缓存任何解析结果.
//!
//! # 例子
//!
//! ```no_run
//! use ct_cohort::prelude::*;
//!
//! let volume = Template::new("/data/{patient_id}_CT.nii.gz").unwrap();
//! let mask = Template::new("/data/{patient_id}_CT_{organ}_{observer}.nii.gz").unwrap();
//!
//! let loader = DatasetLoader::new();
//! for (patient_id, scan) in loader.load_patient_scans(&volume, &mask).unwrap() {
//!     match scan {
//!         Ok(scan) => println!("{patient_id}: {} 个观察者", scan.masks().len()),
//!         Err(e) => eprintln!("{patient_id}: {e}"),
//!     }
//! }
//! ```

pub mod consts;

/// 数据实体与底层体数据读取.
mod data;

pub use data::{Mask, NiftiReader, PatientScan, VolumeReader};

pub mod dataset;

pub use dataset::{DataConfig, DatasetLoader};

mod error;

pub use error::{CohortError, CohortResult, ErrorKind};

pub mod matcher;

pub mod prelude;

pub mod resolve;

pub use resolve::ResolvedPath;

mod template;

pub use matcher::CapturePattern;
pub use template::Template;
