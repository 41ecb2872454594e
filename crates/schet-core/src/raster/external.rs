//! Rasterization via external command-line converters.
//!
//! Each attempt works inside its own temporary directory, dropped on every
//! exit path, and runs the tool under a bounded timeout.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use image::DynamicImage;
use tracing::debug;

use super::{RasterConfig, RasterStrategy};

/// Supported command-line converters, in the order the default chain
/// tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// `magick convert` at high density.
    ImageMagick,
    /// `gs` with the png16m device.
    Ghostscript,
    /// `pdftoppm` from Poppler.
    Pdftoppm,
}

/// Strategy wrapping one external converter.
pub struct ExternalToolStrategy {
    kind: ToolKind,
}

impl ExternalToolStrategy {
    pub fn new(kind: ToolKind) -> Self {
        Self { kind }
    }

    fn command(&self, pdf_path: &Path, out_path: &Path, page_index: usize, dpi: u32) -> Command {
        // External tools use 1-based page numbers.
        let page = page_index + 1;
        match self.kind {
            ToolKind::ImageMagick => {
                let mut cmd = Command::new("magick");
                cmd.arg("convert")
                    .arg("-density")
                    .arg(dpi.to_string())
                    .arg("-quality")
                    .arg("100")
                    .arg(format!("{}[{}]", pdf_path.display(), page_index))
                    .arg("-background")
                    .arg("white")
                    .arg("-alpha")
                    .arg("remove")
                    .arg(out_path);
                cmd
            }
            ToolKind::Ghostscript => {
                let mut cmd = Command::new("gs");
                cmd.arg("-sDEVICE=png16m")
                    .arg("-dTextAlphaBits=4")
                    .arg("-dGraphicsAlphaBits=4")
                    .arg(format!("-r{dpi}"))
                    .arg(format!("-dFirstPage={page}"))
                    .arg(format!("-dLastPage={page}"))
                    .arg("-dNOPAUSE")
                    .arg("-dBATCH")
                    .arg("-dSAFER")
                    .arg(format!("-sOutputFile={}", out_path.display()))
                    .arg(pdf_path);
                cmd
            }
            ToolKind::Pdftoppm => {
                // pdftoppm appends the extension itself, so pass a prefix.
                let prefix = out_path.with_extension("");
                let mut cmd = Command::new("pdftoppm");
                cmd.arg("-png")
                    .arg("-r")
                    .arg(dpi.to_string())
                    .arg("-f")
                    .arg(page.to_string())
                    .arg("-l")
                    .arg(page.to_string())
                    .arg("-singlefile")
                    .arg(pdf_path)
                    .arg(prefix);
                cmd
            }
        }
    }

    fn output_path(&self, dir: &Path) -> PathBuf {
        match self.kind {
            ToolKind::ImageMagick => dir.join("magick_output.png"),
            ToolKind::Ghostscript => dir.join("gs_output.png"),
            ToolKind::Pdftoppm => dir.join("ppm_output.png"),
        }
    }
}

impl RasterStrategy for ExternalToolStrategy {
    fn name(&self) -> &'static str {
        match self.kind {
            ToolKind::ImageMagick => "imagemagick",
            ToolKind::Ghostscript => "ghostscript",
            ToolKind::Pdftoppm => "pdftoppm",
        }
    }

    fn rasterize(
        &self,
        pdf: &[u8],
        page_index: usize,
        config: &RasterConfig,
    ) -> Result<DynamicImage, String> {
        // TempDir cleans up on drop, success and failure alike.
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| format!("failed to create temp directory: {e}"))?;

        let pdf_path = temp_dir.path().join("input.pdf");
        fs::write(&pdf_path, pdf).map_err(|e| format!("failed to write temp PDF: {e}"))?;

        let out_path = self.output_path(temp_dir.path());
        let mut cmd = self.command(&pdf_path, &out_path, page_index, config.dpi);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        debug!(tool = self.name(), page = page_index, "launching converter");
        let status = run_with_timeout(cmd, Duration::from_secs(config.tool_timeout_secs))?;
        if !status.success() {
            return Err(format!("converter exited with {status}"));
        }

        let size = fs::metadata(&out_path).map(|m| m.len()).unwrap_or(0);
        if size < config.min_output_bytes {
            return Err(format!("output too small ({size} bytes)"));
        }

        image::open(&out_path).map_err(|e| format!("failed to decode converter output: {e}"))
    }
}

/// Run a command, killing it once the budget is exhausted. A timeout is an
/// ordinary failure, not a panic or a hang.
fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> Result<std::process::ExitStatus, String> {
    let mut child = cmd
        .spawn()
        .map_err(|e| format!("failed to launch tool: {e}"))?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("timed out after {}s", timeout.as_secs()));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(format!("failed to poll tool: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_a_recoverable_failure() {
        let strategy = ExternalToolStrategy::new(ToolKind::ImageMagick);
        // Point the strategy at a command that does not exist by using a
        // bogus PATH for the lookup: spawning "magick" on a machine without
        // it yields a launch error rather than a panic. When the tool does
        // exist the garbage input still fails the conversion.
        let result = strategy.rasterize(b"not a pdf", 0, &RasterConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn timeout_kills_the_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let started = Instant::now();
        let result = run_with_timeout(cmd, Duration::from_millis(200));
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn command_lines_use_one_based_pages() {
        let strategy = ExternalToolStrategy::new(ToolKind::Ghostscript);
        let cmd = strategy.command(Path::new("in.pdf"), Path::new("out.png"), 2, 300);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"-dFirstPage=3".to_string()));
        assert!(args.contains(&"-dLastPage=3".to_string()));
    }
}
