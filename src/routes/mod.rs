pub mod assignments;

pub mod classes;

pub mod corrections;

pub mod exams;

pub mod permutations;

pub use assignments::configure_assignments_routes;
pub use classes::configure_classes_routes;
pub use corrections::configure_corrections_routes;
pub use exams::configure_exams_routes;
