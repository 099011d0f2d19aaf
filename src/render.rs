//! External renderer.
//!
//! Rendering, cropping and PNG encoding are not done here: a renderer is
//! handed an object id, the SVG on disk and a destination, and must leave a
//! raster file at the destination. [`InkscapeRenderer`] shells out to the
//! Inkscape command line; tests use an in-memory fake.

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::utils::exec::{Cmd, FilterRule};

/// One crop-and-export job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRequest<'a> {
    /// `id` of the element whose bounding box is exported.
    pub object_id: &'a str,
    /// SVG file the renderer reads; must already hold the hidden slices.
    pub source: &'a Path,
    /// PNG file to create or overwrite.
    pub destination: &'a Path,
}

/// Failure of an external export.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Command(#[from] anyhow::Error),

    #[error("renderer exited successfully but produced no `{0}`")]
    NoOutput(PathBuf),
}

/// Capability: produce a raster file for one object of an SVG.
pub trait Renderer {
    /// Export synchronously; returns once the file is written.
    fn render(&self, request: &ExportRequest<'_>) -> Result<(), RenderError>;

    /// Human-readable form of the invocation, for logs.
    fn describe(&self, request: &ExportRequest<'_>) -> String {
        format!(
            "export #{} of {} to {}",
            request.object_id,
            request.source.display(),
            request.destination.display()
        )
    }
}

/// Inkscape command-line dialect.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RendererSyntax {
    /// Inkscape 1.x: `--export-id=ID --export-type=png --export-filename=OUT SVG`
    #[default]
    Modern,
    /// Inkscape 0.x: `-i ID -e OUT SVG`
    Legacy,
}

/// GTK and Inkscape chatter that is noise at normal verbosity.
static INKSCAPE_FILTER: FilterRule = FilterRule::new(&[
    "Gtk-Message",
    "Gdk-Message",
    "(inkscape:",
    "Background RRGGBBAA",
    "Area ",
    "Bitmap saved as",
]);

/// Renderer backed by the Inkscape executable.
#[derive(Debug, Clone, PartialEq)]
pub struct InkscapeRenderer {
    /// Program and leading arguments, e.g. `["inkscape"]` or `["flatpak", "run", "org.inkscape.Inkscape"]`.
    pub command: Vec<String>,
    pub syntax: RendererSyntax,
    /// Export resolution; Inkscape's default (96) when unset.
    pub dpi: Option<f32>,
}

impl Default for InkscapeRenderer {
    fn default() -> Self {
        Self {
            command: vec!["inkscape".to_owned()],
            syntax: RendererSyntax::Modern,
            dpi: None,
        }
    }
}

impl InkscapeRenderer {
    /// Arguments appended after `command` for one export.
    pub fn arguments(&self, request: &ExportRequest<'_>) -> Vec<String> {
        let id = request.object_id;
        let dest = request.destination.display();
        let mut args = match self.syntax {
            RendererSyntax::Modern => vec![
                format!("--export-id={id}"),
                "--export-type=png".to_owned(),
                format!("--export-filename={dest}"),
            ],
            RendererSyntax::Legacy => vec![
                "-i".to_owned(),
                id.to_owned(),
                "-e".to_owned(),
                dest.to_string(),
            ],
        };
        if let Some(dpi) = self.dpi {
            match self.syntax {
                RendererSyntax::Modern => args.push(format!("--export-dpi={dpi}")),
                RendererSyntax::Legacy => args.extend(["-d".to_owned(), dpi.to_string()]),
            }
        }
        args.push(request.source.display().to_string());
        args
    }

    fn command(&self, request: &ExportRequest<'_>) -> Cmd {
        Cmd::from_slice(self.command.as_slice())
            .args(self.arguments(request))
            .filter(&INKSCAPE_FILTER)
    }
}

impl Renderer for InkscapeRenderer {
    /// Run Inkscape for one slice.
    ///
    /// An existing destination is removed first, so a zero exit status that
    /// leaves no file is reported as [`RenderError::NoOutput`] even when
    /// overwriting.
    fn render(&self, request: &ExportRequest<'_>) -> Result<(), RenderError> {
        remove_stale(request.destination)?;
        self.command(request).run()?;
        if !request.destination.exists() {
            return Err(RenderError::NoOutput(request.destination.to_path_buf()));
        }
        Ok(())
    }

    fn describe(&self, request: &ExportRequest<'_>) -> String {
        self.command(request).display()
    }
}

/// Delete a previous export at `path`; a missing file is fine.
fn remove_stale(path: &Path) -> Result<(), RenderError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RenderError::Command(
            anyhow::Error::new(e)
                .context(format!("Failed to remove previous `{}`", path.display())),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(source: &'a Path, destination: &'a Path) -> ExportRequest<'a> {
        ExportRequest {
            object_id: "logo",
            source,
            destination,
        }
    }

    #[test]
    fn test_modern_arguments() {
        let renderer = InkscapeRenderer::default();
        let args = renderer.arguments(&request(
            Path::new("/work/drawing.svg"),
            Path::new("/tmp/out/logo.png"),
        ));
        assert_eq!(
            args,
            [
                "--export-id=logo",
                "--export-type=png",
                "--export-filename=/tmp/out/logo.png",
                "/work/drawing.svg",
            ]
        );
    }

    #[test]
    fn test_legacy_arguments_with_dpi() {
        let renderer = InkscapeRenderer {
            syntax: RendererSyntax::Legacy,
            dpi: Some(144.0),
            ..Default::default()
        };
        let args = renderer.arguments(&request(
            Path::new("drawing.svg"),
            Path::new("/tmp/out/logo.png"),
        ));
        assert_eq!(
            args,
            ["-i", "logo", "-e", "/tmp/out/logo.png", "-d", "144", "drawing.svg"]
        );
    }

    #[test]
    fn test_describe_includes_command() {
        let renderer = InkscapeRenderer {
            command: vec!["flatpak".into(), "run".into(), "org.inkscape.Inkscape".into()],
            ..Default::default()
        };
        let line = renderer.describe(&request(Path::new("a.svg"), Path::new("/o/logo.png")));
        assert!(line.starts_with("flatpak run org.inkscape.Inkscape --export-id=logo"));
        assert!(line.ends_with("a.svg"));
    }

    #[test]
    fn test_missing_program_is_command_error() {
        let renderer = InkscapeRenderer {
            command: vec!["slicer-no-such-renderer".into()],
            ..Default::default()
        };
        let err = renderer
            .render(&request(Path::new("a.svg"), Path::new("/nonexistent/logo.png")))
            .unwrap_err();
        assert!(matches!(err, RenderError::Command(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_without_output_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("logo.png");
        let renderer = InkscapeRenderer {
            command: vec!["true".into()],
            ..Default::default()
        };
        let err = renderer
            .render(&request(Path::new("a.svg"), &dest))
            .unwrap_err();
        assert!(matches!(err, RenderError::NoOutput(path) if path == dest));
    }

    #[cfg(unix)]
    #[test]
    fn test_previous_export_does_not_count_as_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("logo.png");
        std::fs::write(&dest, b"stale").unwrap();
        let renderer = InkscapeRenderer {
            command: vec!["true".into()],
            ..Default::default()
        };
        let err = renderer
            .render(&request(Path::new("a.svg"), &dest))
            .unwrap_err();
        assert!(matches!(err, RenderError::NoOutput(ref path) if *path == dest));
        assert!(!dest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_rewritten_export_replaces_previous() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("logo.png");
        std::fs::write(&dest, b"stale").unwrap();
        // writes the value of --export-filename, like Inkscape does
        let script = r#"for a; do case "$a" in --export-filename=*) printf png > "${a#--export-filename=}";; esac; done"#;
        let renderer = InkscapeRenderer {
            command: vec!["sh".into(), "-c".into(), script.into(), "sh".into()],
            ..Default::default()
        };
        renderer
            .render(&request(Path::new("a.svg"), &dest))
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"png");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = InkscapeRenderer {
            command: vec!["false".into()],
            ..Default::default()
        };
        let err = renderer
            .render(&request(Path::new("a.svg"), &dir.path().join("x.png")))
            .unwrap_err();
        assert!(err.to_string().contains("failed"));
    }
}
