//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::consts::placeholder::{OBSERVER, ORGAN, PATIENT_ID};

pub use crate::data::{Mask, NiftiReader, PatientScan, VolumeReader};
pub use crate::dataset::{self, DataConfig, DatasetLoader};
pub use crate::error::{CohortError, CohortResult, ErrorKind};
pub use crate::matcher::extract;
pub use crate::resolve::{resolve, resolve_required, resolve_single, ResolvedPath};
pub use crate::template::Template;
