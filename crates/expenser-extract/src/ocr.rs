//! Local OCR through an external command.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::ExtractError;

/// Run the configured OCR command on an image and return its text.
///
/// The command is invoked as `<command> <image> stdout`, the tesseract
/// calling convention; any OCR tool with the same interface works.
pub async fn run_ocr(command: &str, image: &Path) -> Result<String, ExtractError> {
    debug!(command = %command, image = %image.display(), "running OCR");
    let output = Command::new(command)
        .arg(image)
        .arg("stdout")
        .output()
        .await
        .map_err(|e| ExtractError::Ocr {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ExtractError::Ocr {
            command: command.to_string(),
            message: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    if text.trim().is_empty() {
        return Err(ExtractError::Ocr {
            command: command.to_string(),
            message: "no text recognized".to_string(),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_command_reports_ocr_error() {
        let err = run_ocr("definitely-not-a-real-ocr-binary", Path::new("r.jpg"))
            .await
            .unwrap_err();
        match err {
            ExtractError::Ocr { command, .. } => {
                assert_eq!(command, "definitely-not-a-real-ocr-binary");
            }
            other => panic!("expected Ocr error, got {other:?}"),
        }
    }
}
