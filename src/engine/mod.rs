//! 随机化与对账引擎
//!
//! 纯计算部分：不访问存储、不读取时钟。

pub mod exam;
pub mod permutation;
pub mod reconcile;
pub mod seed;
pub mod statistics;
pub mod view;

pub use exam::{CanonicalExam, CanonicalOption, CanonicalQuestion};
pub use permutation::{StudentPermutation, generate, parse_slot_label, slot_label};
pub use reconcile::{CorrectionResult, Detection, QuestionResult, QuestionStatus, reconcile};
pub use seed::{ALGORITHM_VERSION, SeedMaterial};
