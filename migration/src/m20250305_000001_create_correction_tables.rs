use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_exam_tables::{ExamAssignments, Students};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 批改记录表（每个 (关联, 学生) 至多一条）
        manager
            .create_table(
                Table::create()
                    .table(CorrectionRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CorrectionRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::ExamAssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::RawDetections)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::Score)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::Total)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::Grade)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::NeedsReview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::CorrectedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::CorrectedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionRecords::Revision)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CorrectionRecords::Table, CorrectionRecords::ExamAssignmentId)
                            .to(ExamAssignments::Table, ExamAssignments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CorrectionRecords::Table, CorrectionRecords::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 强制重批审计表
        manager
            .create_table(
                Table::create()
                    .table(CorrectionAudits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CorrectionAudits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::CorrectionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::ExamAssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::Revision)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::PreviousRawDetections)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::PreviousScore)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::PreviousTotal)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::PreviousCorrectedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::PreviousCorrectedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::NewRawDetections)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::NewScore)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::NewTotal)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::ChangedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CorrectionAudits::ChangedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CorrectionAudits::Reason).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(CorrectionAudits::Table, CorrectionAudits::CorrectionId)
                            .to(CorrectionRecords::Table, CorrectionRecords::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_correction_records_key")
                    .table(CorrectionRecords::Table)
                    .col(CorrectionRecords::ExamAssignmentId)
                    .col(CorrectionRecords::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_correction_audits_key")
                    .table(CorrectionAudits::Table)
                    .col(CorrectionAudits::ExamAssignmentId)
                    .col(CorrectionAudits::StudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CorrectionAudits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CorrectionRecords::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum CorrectionRecords {
    #[sea_orm(iden = "correction_records")]
    Table,
    Id,
    ExamAssignmentId,
    StudentId,
    RawDetections,
    Score,
    Total,
    Grade,
    NeedsReview,
    CorrectedBy,
    CorrectedAt,
    Revision,
}

#[derive(DeriveIden)]
enum CorrectionAudits {
    #[sea_orm(iden = "correction_audits")]
    Table,
    Id,
    CorrectionId,
    ExamAssignmentId,
    StudentId,
    Revision,
    PreviousRawDetections,
    PreviousScore,
    PreviousTotal,
    PreviousCorrectedBy,
    PreviousCorrectedAt,
    NewRawDetections,
    NewScore,
    NewTotal,
    ChangedBy,
    ChangedAt,
    Reason,
}
