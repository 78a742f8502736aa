use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{CorrectionService, correction_error};
use crate::config::AppConfig;
use crate::errors::{ExamSystemError, Result};
use crate::models::corrections::responses::{CorrectionResponse, ScanResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::stores::{ExamEngine, ensure_enrolled, load_assignment};
use crate::utils::{extension_of, validate_magic_bytes};

// 文本字段的最大长度
const MAX_FIELD_LEN: usize = 4096;

/// 扫描表单中的文本字段
#[derive(Debug, Default, PartialEq)]
struct ScanForm {
    assignment_id: Option<i64>,
    class_id: Option<i64>,
    exam_id: Option<i64>,
    student_id: Option<i64>,
    corrected_by: Option<i64>,
    force: bool,
    reason: Option<String>,
}

impl ScanForm {
    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "assignment_id" => self.assignment_id = Some(parse_id(name, value)?),
            "class_id" => self.class_id = Some(parse_id(name, value)?),
            "exam_id" => self.exam_id = Some(parse_id(name, value)?),
            "student_id" => self.student_id = Some(parse_id(name, value)?),
            "corrected_by" => self.corrected_by = Some(parse_id(name, value)?),
            "force" => self.force = parse_flag(value),
            "reason" => self.reason = (!value.is_empty()).then(|| value.to_string()),
            _ => tracing::debug!("Ignoring unknown scan field: {}", name),
        }
        Ok(())
    }

    fn required(value: Option<i64>, name: &str) -> Result<i64> {
        value.ok_or_else(|| ExamSystemError::validation(format!("Field '{name}' is required")))
    }
}

fn parse_id(name: &str, value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ExamSystemError::validation(format!("Field '{name}' must be a positive integer"))
        })
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 已落盘的扫描件，未调用 `keep` 时在释放时删除
struct StoredImage {
    name: String,
    path: PathBuf,
    keep: bool,
}

impl StoredImage {
    fn new(dir: &str, extension: &str) -> Self {
        let name = format!(
            "{}-{}{}",
            chrono::Utc::now().timestamp(),
            Uuid::new_v4(),
            extension
        );
        let path = Path::new(dir).join(&name);
        Self {
            name,
            path,
            keep: false,
        }
    }

    fn keep(mut self) -> String {
        self.keep = true;
        std::mem::take(&mut self.name)
    }
}

impl Drop for StoredImage {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn reject(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(code, message))
}

pub async fn scan(
    service: &CorrectionService,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();
    let upload_dir = &config.upload.dir;
    let max_size = config.upload.max_size;
    let allowed_types = &config.upload.allowed_types;

    if let Err(e) = fs::create_dir_all(upload_dir).await {
        tracing::error!("{}", ExamSystemError::file_operation(format!("{e}")));
        return Ok(
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error_empty(
                ErrorCode::FileUploadFailed,
                "Failed to create scan directory",
            )),
        );
    }

    let mut form = ScanForm::default();
    let mut image: Option<StoredImage> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        if name == "file" {
            if image.is_some() {
                return Ok(reject(
                    ErrorCode::BadRequest,
                    "Only one scan can be uploaded at a time",
                ));
            }

            let original_name = content_disposition
                .and_then(|cd| cd.get_filename())
                .map(|s| s.to_string())
                .unwrap_or_default();
            let extension = extension_of(&original_name).unwrap_or_default();
            if !allowed_types.iter().any(|t| t.to_lowercase() == extension) {
                return Ok(reject(ErrorCode::FileTypeNotAllowed, "File type not allowed"));
            }

            let stored = StoredImage::new(upload_dir, &extension);
            let mut f = match fs::File::create(&stored.path).await {
                Ok(file) => file,
                Err(e) => {
                    tracing::error!("{}", ExamSystemError::file_operation(format!("{e}")));
                    return Ok(HttpResponse::InternalServerError().json(
                        ApiResponse::<()>::error_empty(
                            ErrorCode::FileUploadFailed,
                            "Failed to create scan file",
                        ),
                    ));
                }
            };

            let mut total_size: usize = 0;
            let mut first_chunk = true;
            while let Some(chunk) = field.next().await {
                let data = chunk?;

                // 第一个 chunk 时验证魔术字节
                if first_chunk {
                    first_chunk = false;
                    if !validate_magic_bytes(&data, &extension) {
                        return Ok(reject(
                            ErrorCode::FileTypeNotAllowed,
                            "File content does not match its extension",
                        ));
                    }
                }

                total_size += data.len();
                if total_size > max_size {
                    return Ok(reject(
                        ErrorCode::FileSizeExceeded,
                        "File size exceeds the limit",
                    ));
                }
                f.write_all(&data).await?;
            }
            f.flush().await?;

            if total_size == 0 {
                return Ok(reject(ErrorCode::BadRequest, "Uploaded scan is empty"));
            }
            image = Some(stored);
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                let data = chunk?;
                value.extend_from_slice(&data);
                if value.len() > MAX_FIELD_LEN {
                    return Ok(reject(
                        ErrorCode::BadRequest,
                        format!("Field '{name}' is too long"),
                    ));
                }
            }
            if let Err(e) = form.set(&name, String::from_utf8_lossy(&value).trim()) {
                return Ok(correction_error(&e));
            }
        }
    }

    let Some(image) = image else {
        return Ok(reject(
            ErrorCode::BadRequest,
            "No scan found in upload payload",
        ));
    };

    let engine = service.get_engine(request);
    match process(&engine, &form, &image.path).await {
        Ok(response) => {
            let stored_image = image.keep();
            Ok(HttpResponse::Created().json(ApiResponse::success(
                ScanResponse {
                    stored_image,
                    record: response.record,
                    result: response.result,
                },
                "Scan corrected successfully",
            )))
        }
        Err(e) => Ok(correction_error(&e)),
    }
}

async fn resolve_assignment(storage: &dyn Storage, form: &ScanForm) -> Result<i64> {
    if let Some(id) = form.assignment_id {
        return Ok(id);
    }
    match (form.class_id, form.exam_id) {
        (Some(class_id), Some(exam_id)) => storage
            .find_assignment(class_id, exam_id)
            .await?
            .map(|assignment| assignment.id)
            .ok_or_else(|| {
                ExamSystemError::not_found(format!(
                    "exam {exam_id} is not assigned to class {class_id}"
                ))
            }),
        _ => Err(ExamSystemError::validation(
            "Either 'assignment_id' or both 'class_id' and 'exam_id' are required",
        )),
    }
}

// 识别答题卡并写入批改结果
async fn process(
    engine: &ExamEngine,
    form: &ScanForm,
    image: &Path,
) -> Result<CorrectionResponse> {
    let student_id = ScanForm::required(form.student_id, "student_id")?;
    let corrected_by = ScanForm::required(form.corrected_by, "corrected_by")?;
    let assignment_id = resolve_assignment(engine.storage.as_ref(), form).await?;

    // 先确认学生与关联有效，避免无谓地调用识别程序
    let context = load_assignment(engine.storage.as_ref(), assignment_id).await?;
    ensure_enrolled(engine.storage.as_ref(), &context, student_id).await?;

    let detections = engine
        .detector
        .detect(image, context.exam.question_count())
        .await?;
    tracing::debug!(
        "Detected {} marks for student {} in assignment {}",
        detections.len(),
        student_id,
        assignment_id
    );

    if form.force {
        engine
            .corrections
            .force_resubmit(
                assignment_id,
                student_id,
                detections,
                corrected_by,
                form.reason.clone(),
            )
            .await
    } else {
        engine
            .corrections
            .submit(assignment_id, student_id, detections, corrected_by)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Detection;
    use crate::stores::tests::{FixedDetector, test_engine};
    use crate::storage::sea_orm_storage::tests::seed_assignment;
    use std::sync::Arc;

    #[test]
    fn test_form_fields() {
        let mut form = ScanForm::default();
        form.set("class_id", "3").unwrap();
        form.set("exam_id", "7").unwrap();
        form.set("force", "TRUE").unwrap();
        form.set("reason", "").unwrap();
        form.set("comment", "ignored").unwrap();

        assert_eq!(form.class_id, Some(3));
        assert_eq!(form.exam_id, Some(7));
        assert!(form.force);
        assert_eq!(form.reason, None);

        assert!(form.set("student_id", "0").is_err());
        assert!(form.set("student_id", "abc").is_err());
        assert!(!parse_flag("no"));
    }

    #[test]
    fn test_stored_image_removed_unless_kept() {
        let dir = std::env::temp_dir();
        let dir = dir.to_string_lossy();

        let dropped = StoredImage::new(&dir, ".png");
        std::fs::write(&dropped.path, b"x").unwrap();
        let dropped_path = dropped.path.clone();
        drop(dropped);
        assert!(!dropped_path.exists());

        let kept = StoredImage::new(&dir, ".png");
        std::fs::write(&kept.path, b"x").unwrap();
        let kept_path = kept.path.clone();
        let name = kept.keep();
        assert!(kept_path.exists());
        assert!(name.ends_with(".png"));
        std::fs::remove_file(kept_path).unwrap();
    }

    #[tokio::test]
    async fn test_process_resolves_by_class_and_exam() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0, 1], 2).await;

        let key = engine
            .randomization
            .answer_key(assignment.id, students[0].id)
            .await
            .unwrap();
        let detections: Vec<Detection> = key
            .entries
            .iter()
            .map(|entry| Detection::Single {
                slot: crate::engine::parse_slot_label(&entry.answers[0]).unwrap(),
            })
            .collect();
        let engine = ExamEngine {
            detector: Arc::new(FixedDetector(detections)),
            ..engine
        };

        let form = ScanForm {
            class_id: Some(assignment.class_id),
            exam_id: Some(assignment.exam_id),
            student_id: Some(students[0].id),
            corrected_by: Some(1),
            ..Default::default()
        };
        let response = process(&engine, &form, Path::new("unused.png"))
            .await
            .unwrap();
        assert_eq!(response.result.score, 2);

        // 重复提交被拒绝
        let err = process(&engine, &form, Path::new("unused.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_process_requires_assignment() {
        let (engine, _storage) = test_engine().await;
        let form = ScanForm {
            student_id: Some(1),
            corrected_by: Some(1),
            ..Default::default()
        };
        let err = process(&engine, &form, Path::new("unused.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::Validation(_)));
    }
}
