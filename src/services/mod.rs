pub mod assignments;
pub mod classes;
pub mod corrections;
pub mod exams;
pub mod permutations;

pub use assignments::AssignmentService;
pub use classes::ClassService;
pub use corrections::CorrectionService;
pub use exams::ExamService;
pub use permutations::PermutationService;
