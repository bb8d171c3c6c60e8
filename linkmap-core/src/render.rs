// Image generation through an external Graphviz process

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

pub const DEFAULT_RENDERER: &str = "dot";
pub const DEFAULT_OUTPUT: &str = "out.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
    /// The DOT text itself, written without running the renderer.
    Dot,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "svg" => Some(OutputFormat::Svg),
            "png" => Some(OutputFormat::Png),
            "pdf" => Some(OutputFormat::Pdf),
            "dot" | "gv" => Some(OutputFormat::Dot),
            _ => None,
        }
    }

    /// Guess from a file extension, e.g. `map.png`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_str)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Dot => "dot",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to start renderer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("renderer '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What a successful render produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub output: PathBuf,
    pub format: OutputFormat,
    /// Anything the renderer printed; empty for DOT output.
    pub stdout: String,
}

/// Hands serialized graphs to Graphviz (or anything with the same CLI).
#[derive(Debug, Clone)]
pub struct Renderer {
    program: String,
    format: OutputFormat,
    output: PathBuf,
}

impl Renderer {
    pub fn new(output: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            program: DEFAULT_RENDERER.to_string(),
            format,
            output: output.into(),
        }
    }

    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Arguments passed to the renderer, `-T<format> -o<path>`.
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("-T{}", self.format),
            format!("-o{}", self.output.display()),
        ]
    }

    /// Writes `graph` (DOT text) to the output path, through the renderer
    /// unless the format is DOT.
    pub async fn render(&self, graph: &[u8]) -> Result<RenderOutcome, RenderError> {
        if self.format == OutputFormat::Dot {
            tokio::fs::write(&self.output, graph).await?;
            info!("Wrote graph description to {}", self.output.display());
            return Ok(self.outcome(String::new()));
        }

        debug!("Running {} {:?}", self.program, self.args());

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A renderer that exits early closes the pipe; its exit status says why
            match stdin.write_all(graph).await {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("Rendered {} to {}", self.format, self.output.display());
        Ok(self.outcome(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    fn outcome(&self, stdout: String) -> RenderOutcome {
        RenderOutcome {
            output: self.output.clone(),
            format: self.format,
            stdout,
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT, OutputFormat::Svg)
    }
}
