//! Glyph recognition through an external OCR command.

use std::io::{Cursor, ErrorKind, Write};
use std::process::{Command, Stdio};

use crate::core::GrayImageView;
use crate::tracker::{GlyphRecognizer, RecognizerError};

/// Placeholder replaced by the allowed glyphs in every argument.
pub const WHITELIST_PLACEHOLDER: &str = "{whitelist}";

/// Runs `program args...` once per canonical image, writing the image as
/// PNG to stdin and reading the recognized UTF-8 text from stdout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRecognizer {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandRecognizer {
    /// Tesseract with the Japanese model in single-character mode.
    fn default() -> Self {
        Self::new(
            "tesseract",
            [
                "stdin",
                "stdout",
                "-l",
                "jpn",
                "--psm",
                "10",
                "-c",
                "tessedit_char_whitelist={whitelist}",
            ],
        )
    }
}

impl CommandRecognizer {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn encode_png(image: &GrayImageView<'_>) -> Result<Vec<u8>, RecognizerError> {
        let buf = ::image::GrayImage::from_raw(
            image.width as u32,
            image.height as u32,
            image.data.to_vec(),
        )
        .ok_or_else(|| RecognizerError::Backend("image buffer does not match its size".into()))?;
        let mut out = Cursor::new(Vec::new());
        buf.write_to(&mut out, ::image::ImageFormat::Png)
            .map_err(|e| RecognizerError::Backend(e.to_string()))?;
        Ok(out.into_inner())
    }
}

impl GlyphRecognizer for CommandRecognizer {
    fn recognize(
        &self,
        image: &GrayImageView<'_>,
        whitelist: &str,
    ) -> Result<String, RecognizerError> {
        let png = Self::encode_png(image)?;
        let args = self
            .args
            .iter()
            .map(|a| a.replace(WHITELIST_PLACEHOLDER, whitelist));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        // The child may exit before reading all of stdin; it is reaped either way.
        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(&png) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            },
            None => Ok(()),
        };
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(RecognizerError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;
        Ok(String::from_utf8(output.stdout)?)
    }
}
