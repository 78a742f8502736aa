use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

use super::{MarkDetector, parse_detector_csv};
use crate::config::DetectorConfig;
use crate::engine::Detection;
use crate::errors::{ExamSystemError, Result};

/// 调用外部 OMR 程序识别答题卡
///
/// 程序以 `args... <image>` 方式调用，识别结果以 CSV 写到标准输出。
#[derive(Debug, Clone)]
pub struct CommandMarkDetector {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandMarkDetector {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout),
        )
    }
}

#[async_trait]
impl MarkDetector for CommandMarkDetector {
    async fn detect(&self, image: &Path, expected: usize) -> Result<Vec<Detection>> {
        debug!("Running detector {} on {}", self.command, image.display());

        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!("Failed to start detector {}: {}", self.command, e);
                ExamSystemError::detection(format!("failed to run {}: {e}", self.command))
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                error!(
                    "Detector {} timed out after {:?} on {}",
                    self.command,
                    self.timeout,
                    image.display()
                );
                ExamSystemError::detection(format!(
                    "{} timed out after {}s",
                    self.command,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ExamSystemError::detection(format!("detector I/O failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Detector {} failed ({}): {}", self.command, output.status, stderr.trim());
            return Err(ExamSystemError::detection(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        parse_detector_csv(&output.stdout, expected)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, timeout: Duration) -> CommandMarkDetector {
        CommandMarkDetector::new("sh", vec!["-c".into(), script.into(), "detector".into()], timeout)
    }

    #[tokio::test]
    async fn test_reads_csv_from_stdout() {
        let detector = shell("printf 'q1,q2\\nC,\\n'", Duration::from_secs(5));
        let detections = detector.detect(Path::new("sheet.png"), 2).await.unwrap();
        assert_eq!(
            detections,
            vec![Detection::Single { slot: 2 }, Detection::NoMark]
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_detection_error() {
        let detector = shell("echo broken >&2; exit 3", Duration::from_secs(5));
        let err = detector.detect(Path::new("sheet.png"), 1).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_detection_error() {
        let detector = shell("sleep 5", Duration::from_millis(100));
        let err = detector.detect(Path::new("sheet.png"), 1).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_detection_error() {
        let detector = CommandMarkDetector::new(
            "/nonexistent/omr-reader",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = detector.detect(Path::new("sheet.png"), 1).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));
    }
}
