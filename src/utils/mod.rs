pub mod extractor;
pub mod file_magic;
pub mod keyed_lock;
pub mod parameter_error_handler;

pub use extractor::{SafeIDI64, SafeStudentIdI64};
pub use file_magic::{extension_of, validate_magic_bytes};
pub use keyed_lock::{KeyedLockGuard, KeyedLocks};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
