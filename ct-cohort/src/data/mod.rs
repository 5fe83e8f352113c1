//! 数据实体 ([`Mask`], [`PatientScan`]) 与底层体数据读取.

mod mask;
mod patient;
mod reader;

pub use mask::Mask;
pub use patient::PatientScan;
pub use reader::{NiftiReader, VolumeReader};
