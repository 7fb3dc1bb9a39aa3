//! Tesseract CLI integration.
//!
//! Runs `tesseract stdin stdout -l <langs>` as a child process, feeding
//! the image on stdin and reading plain text from stdout. Images are
//! cleaned up by [`super::preprocess`] first unless disabled.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{preprocess, OcrProvider};
use crate::config::OcrConfig;

pub struct TesseractOcr {
    binary: String,
    languages: String,
    timeout: Duration,
    preprocess: bool,
}

impl TesseractOcr {
    pub fn new(binary: &str, languages: &str, timeout: Duration) -> Self {
        Self {
            binary: binary.to_string(),
            languages: languages.to_string(),
            timeout,
            preprocess: true,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            &config.binary,
            &config.languages,
            Duration::from_secs(config.timeout_secs),
        )
        .with_preprocess(config.preprocess)
    }

    pub fn with_preprocess(mut self, enabled: bool) -> Self {
        self.preprocess = enabled;
        self
    }

    /// Image bytes as handed to the engine.
    async fn prepare(&self, image: &[u8]) -> Vec<u8> {
        if !self.preprocess {
            return image.to_vec();
        }
        let owned = image.to_vec();
        match tokio::task::spawn_blocking(move || preprocess::prepare(&owned)).await {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(error = %e, "Preprocessing task failed, using original image");
                image.to_vec()
            }
        }
    }

    /// Run the engine once and return its raw stdout.
    async fn run(&self, image: &[u8]) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.languages.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn OCR process: {}", self.binary))?;

        // Feed stdin from a separate task so a chatty child cannot block us.
        if let Some(mut stdin) = child.stdin.take() {
            let image = image.to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&image).await {
                    debug!(error = %e, "OCR process closed stdin early");
                }
            });
        }

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("OCR timed out after {:?}", self.timeout))?
            .context("Failed to wait for OCR process")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("OCR process exited with {}: {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrProvider for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> Option<String> {
        debug!(bytes = image.len(), languages = %self.languages, "OCR processing");

        let image = self.prepare(image).await;
        match self.run(&image).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("OCR produced no text");
                None
            }
            Ok(text) => {
                debug!(chars = text.chars().count(), "Recognized text");
                Some(text.to_lowercase())
            }
            Err(e) => {
                warn!(error = %e, "OCR failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn fake_engine(body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let mut path = std::env::temp_dir();
        path.push(format!("oddsight_fake_ocr_{}.sh", uuid::Uuid::new_v4()));
        std::fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    /// Fake engine whose body consumes stdin itself.
    #[cfg(unix)]
    fn fake_engine_raw(body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let mut path = std::env::temp_dir();
        path.push(format!("oddsight_fake_ocr_{}.sh", uuid::Uuid::new_v4()));
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_missing_binary_yields_none() {
        let ocr = TesseractOcr::new("/nonexistent/tesseract", "rus+eng", Duration::from_secs(5));
        assert!(ocr.recognize(b"image").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recognize_lowercases_output() {
        let script = fake_engine("echo 'СПАРТАК VS ЗЕНИТ 1.85 4.20'");
        let ocr = TesseractOcr::new(&script, "rus+eng", Duration::from_secs(5));

        let text = ocr.recognize(b"image").await;
        assert_eq!(text.as_deref().map(str::trim), Some("спартак vs зенит 1.85 4.20"));
        let _ = std::fs::remove_file(script);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_yields_none() {
        let script = fake_engine("echo '   '");
        let ocr = TesseractOcr::new(&script, "eng", Duration::from_secs(5));
        assert!(ocr.recognize(b"image").await.is_none());
        let _ = std::fs::remove_file(script);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_yields_none() {
        let script = fake_engine("echo 'partial' ; exit 3");
        let ocr = TesseractOcr::new(&script, "eng", Duration::from_secs(5));
        assert!(ocr.recognize(b"image").await.is_none());
        let _ = std::fs::remove_file(script);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_yields_none() {
        let script = fake_engine("sleep 5");
        let ocr = TesseractOcr::new(&script, "eng", Duration::from_millis(200));
        assert!(ocr.recognize(b"image").await.is_none());
        let _ = std::fs::remove_file(script);
    }

    #[tokio::test]
    async fn test_prepare_respects_switch() {
        let ocr = TesseractOcr::new("tesseract", "eng", Duration::from_secs(5));
        assert_eq!(ocr.prepare(b"raw").await, b"raw".to_vec());

        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10])))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let png = png.into_inner();

        let prepared = ocr.prepare(&png).await;
        let decoded = image::load_from_memory(&prepared).unwrap();
        assert!(matches!(decoded, image::DynamicImage::ImageLuma8(_)));

        let raw = ocr.with_preprocess(false);
        assert_eq!(raw.prepare(&png).await, png);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_receives_preprocessed_image() {
        // The fake engine reports the PNG colour type byte of its input.
        let script = fake_engine_raw("od -An -tu1 -j25 -N1 | tr -d ' '");
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([90, 140, 30])))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let png = png.into_inner();

        let ocr = TesseractOcr::new(&script, "eng", Duration::from_secs(5));
        // colour type 0: grayscale
        assert_eq!(ocr.recognize(&png).await.as_deref().map(str::trim), Some("0"));

        let ocr = ocr.with_preprocess(false);
        // colour type 2: truecolour
        assert_eq!(ocr.recognize(&png).await.as_deref().map(str::trim), Some("2"));
        let _ = std::fs::remove_file(script);
    }

    #[test]
    fn test_from_config() {
        let ocr = TesseractOcr::from_config(&OcrConfig::default());
        assert_eq!(ocr.binary, "tesseract");
        assert_eq!(ocr.languages, "rus+eng");
        assert_eq!(ocr.timeout, Duration::from_secs(60));
        assert!(ocr.preprocess);

        let raw = TesseractOcr::from_config(&OcrConfig {
            preprocess: false,
            ..OcrConfig::default()
        });
        assert!(!raw.preprocess);
        assert_eq!(ocr.name(), "tesseract");
    }
}
