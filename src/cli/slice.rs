//! One CLI invocation over one document.
//!
//! Loads the config and the SVG, wires the terminal and file observers, runs
//! the pipeline, then prints the final document for `--stdout` and the
//! summary. Collected per-slice failures turn into an error so the process
//! exits non-zero.

use anyhow::{Context, Result, bail};
use std::io::Write;

use crate::{
    cli::Cli,
    config::SlicerConfig,
    log,
    observe::{Fanout, FileObserver, TerminalObserver},
    pipeline::{self, RunReport},
    svg::Document,
    utils::path::normalize_path,
};

/// Slice `cli.svg`, writing the final document to `stdout` when requested.
pub fn run_cli(cli: &Cli, stdout: &mut dyn Write) -> Result<RunReport> {
    let config = SlicerConfig::load(cli)?;

    let source = normalize_path(&cli.svg);
    let mut doc = Document::load(&source)
        .with_context(|| format!("Failed to load `{}`", source.display()))?;

    let mut observer = Fanout::new().with(TerminalObserver::new());
    if let Some(path) = config.log_file() {
        match FileObserver::open(&path) {
            Ok(file) => observer = observer.with(file),
            Err(e) => log!("warning"; "cannot open log file `{}`: {}", path.display(), e),
        }
    }

    let options = config.slice_options(&source, cli.dry_run);
    let renderer = config.renderer.renderer();
    let report = pipeline::run(&mut doc, &options, &renderer, &mut observer)?;

    if cli.stdout {
        stdout.write_all(&doc.to_bytes()?)?;
        stdout.flush()?;
    }

    let mode = if cli.dry_run { "dry run" } else { "slice" };
    log!(mode; "{} in `{}`", report.summary(), options.directory.display());

    if !report.is_success() {
        bail!(
            "{} of {} slices failed to export",
            report.failures.len(),
            report.slices
        );
    }
    Ok(report)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use clap::Parser;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    const DRAWING: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
  <g inkscape:label="slices"><rect id="logo" style="fill:#eeeeec"/></g>
</svg>
"#;

    /// Stand-in renderer writing the `--export-filename` target.
    const WRITE_EXPORT: &str = r#"for a; do case "$a" in --export-filename=*) printf png > "${a#--export-filename=}";; esac; done"#;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new(command: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("drawing.svg"), DRAWING).unwrap();
            fs::create_dir(dir.path().join("out")).unwrap();

            let command = toml::Value::Array(
                command
                    .iter()
                    .map(|arg| toml::Value::String((*arg).to_owned()))
                    .collect(),
            );
            fs::write(
                dir.path().join("slicer.toml"),
                format!("[renderer]\ncommand = {command}\n\n[log]\nenable = false\n"),
            )
            .unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).display().to_string()
        }

        fn cli(&self, extra: &[&str]) -> Cli {
            let config = self.path("slicer.toml");
            let out = self.path("out");
            let svg = self.path("drawing.svg");
            let mut args = vec!["slicer", "-C", config.as_str(), "-d", out.as_str()];
            args.extend_from_slice(extra);
            args.push(svg.as_str());
            Cli::try_parse_from(args).unwrap()
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }
    }

    #[test]
    fn test_stdout_receives_marked_document() {
        let ws = Workspace::new(&["sh", "-c", WRITE_EXPORT, "sh"]);
        let mut stdout = Vec::new();

        let report = run_cli(&ws.cli(&["--stdout"]), &mut stdout).unwrap();

        assert_eq!(report.exported, 1);
        assert_eq!(fs::read(ws.root().join("out/logo.png")).unwrap(), b"png");
        let printed = String::from_utf8(stdout).unwrap();
        assert!(printed.contains("fill:#ff0000;opacity:.25"), "{printed}");

        // without --save-marked the file keeps the hidden slices
        let on_disk = fs::read_to_string(ws.root().join("drawing.svg")).unwrap();
        assert!(on_disk.contains("opacity:0;stroke:none"), "{on_disk}");
    }

    #[test]
    fn test_stdout_is_silent_without_flag() {
        let ws = Workspace::new(&["sh", "-c", WRITE_EXPORT, "sh"]);
        let mut stdout = Vec::new();

        run_cli(&ws.cli(&[]), &mut stdout).unwrap();
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_failed_export_is_an_error() {
        let ws = Workspace::new(&["false"]);
        let mut stdout = Vec::new();

        let err = run_cli(&ws.cli(&["--stdout"]), &mut stdout).unwrap_err();

        assert!(err.to_string().contains("1 of 1 slices failed"), "{err}");
        // the document is still printed for the host
        assert!(!stdout.is_empty());
    }
}
