//! 预导入模块，方便使用

pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::correction_audits::{
    ActiveModel as CorrectionAuditActiveModel, Entity as CorrectionAudits,
    Model as CorrectionAuditModel,
};
pub use super::correction_records::{
    ActiveModel as CorrectionRecordActiveModel, Entity as CorrectionRecords,
    Model as CorrectionRecordModel,
};
pub use super::exam_assignments::{
    ActiveModel as ExamAssignmentActiveModel, Entity as ExamAssignments,
    Model as ExamAssignmentModel,
};
pub use super::exams::{ActiveModel as ExamActiveModel, Entity as Exams, Model as ExamModel};
pub use super::question_options::{
    ActiveModel as QuestionOptionActiveModel, Entity as QuestionOptions,
    Model as QuestionOptionModel,
};
pub use super::questions::{
    ActiveModel as QuestionActiveModel, Entity as Questions, Model as QuestionModel,
};
pub use super::student_permutations::{
    ActiveModel as StudentPermutationActiveModel, Entity as StudentPermutations,
    Model as StudentPermutationModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
