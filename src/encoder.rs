//! # Encoder Module
//!
//! The pipeline never compresses pixels itself. It hands every texture to an
//! external encoder and, optionally, to a second tool applying lossless
//! Zstandard supercompression to the produced KTX2 container.
//!
//! ## Architecture
//!
//! `Encoder` is the seam between the transcode worker and those tools:
//! - `CliEncoder` shells out to `compressonatorcli` and `ktx`
//! - tests plug in a fake that writes (or withholds) output files
//!
//! Both operations are blocking; workers call them from the blocking
//! thread pool and a hung tool stalls only its own worker slot.
//!
//! ## Encoder command line
//! ```text
//! compressonatorcli <input> <output> [-fd <FORMAT>] -Quality <q> [-mipsize 4]
//!                   -EncodeWith GPU -UseGPUDecompress -NumThreads <n>
//! ktx deflate --zstd <level> <container> <container>
//! ```

use crate::args;
use crate::classifier::TextureFormat;
use crate::error::BuildError;
use crate::tool_resolver::{ToolPathResolver, COMPRESSONATOR, KTX};
use crate::utils::format_command;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Smallest mip level edge, in pixels, passed to the encoder
pub const MIN_MIP_SIZE: u32 = 4;

/// One encoder invocation
#[derive(Debug, Clone)]
pub struct EncodeRequest<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    /// Block format, `None` lets the encoder pick its default
    pub format: Option<TextureFormat>,
    pub quality: f32,
    pub generate_mips: bool,
    /// Worker-thread hint for the encoder
    pub threads: usize,
}

/// Captured result of an external tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Full command line, for diagnostics
    pub command: String,
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code as printed in the error log
    pub fn exit_code_display(&self) -> String {
        self.exit_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string())
    }
}

/// External texture encoder
pub trait Encoder: Send + Sync {
    /// Encode `request.input` into a KTX2 container at `request.output`
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<ToolOutput, BuildError>;

    /// Supercompress a container in place at the given Zstandard level
    fn supercompress(&self, container: &Path, level: u8) -> Result<ToolOutput, BuildError>;
}

/// Encoder backed by the Compressonator and KTX command-line tools
#[derive(Debug, Clone)]
pub struct CliEncoder {
    compressonator: PathBuf,
    ktx: Option<PathBuf>,
}

impl CliEncoder {
    pub fn new(compressonator: PathBuf, ktx: Option<PathBuf>) -> Self {
        Self { compressonator, ktx }
    }

    /// Locate both tools; the encoder is required, `ktx` is optional
    pub fn resolve(
        resolver: &ToolPathResolver,
        compressonator_override: Option<&Path>,
        ktx_override: Option<&Path>,
    ) -> Result<Self, BuildError> {
        let compressonator = resolver
            .resolve(COMPRESSONATOR, compressonator_override)
            .ok_or_else(|| {
                let expected = resolver
                    .bundled_tool_path(COMPRESSONATOR)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| COMPRESSONATOR.name.to_string());
                BuildError::MissingTool(format!("Compressonator CLI not found at: {}", expected))
            })?;
        let ktx = resolver.resolve(KTX, ktx_override);
        Ok(Self::new(compressonator, ktx))
    }

    /// Whether the supercompression tool is available
    pub fn has_supercompressor(&self) -> bool {
        self.ktx.is_some()
    }

    /// Arguments passed to the encoder for a request
    pub fn encode_args(request: &EncodeRequest<'_>) -> Vec<String> {
        let mut args = args![request.input.display(), request.output.display()];

        if let Some(format) = request.format {
            args.extend(args!["-fd", format]);
        }

        args.extend(args!["-Quality", request.quality]);

        if request.generate_mips {
            args.extend(args!["-mipsize", MIN_MIP_SIZE]);
        }

        args.extend(args!["-EncodeWith", "GPU", "-UseGPUDecompress"]);
        args.extend(args!["-NumThreads", request.threads]);
        args
    }

    /// Arguments passed to `ktx` for an in-place supercompression
    pub fn supercompress_args(container: &Path, level: u8) -> Vec<String> {
        args!["deflate", "--zstd", level, container.display(), container.display()]
    }

    fn run(program: &Path, args: &[String]) -> Result<ToolOutput, BuildError> {
        let command = format_command(program, args);
        debug!("Running: {}", command);

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| BuildError::ToolSpawn {
                tool: program.display().to_string(),
                source,
            })?;

        Ok(ToolOutput {
            command,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Encoder for CliEncoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<ToolOutput, BuildError> {
        Self::run(&self.compressonator, &Self::encode_args(request))
    }

    fn supercompress(&self, container: &Path, level: u8) -> Result<ToolOutput, BuildError> {
        let ktx = self
            .ktx
            .as_deref()
            .ok_or_else(|| BuildError::MissingTool(KTX.name.to_string()))?;
        Self::run(ktx, &Self::supercompress_args(container, level))
    }
}

/// Worker-count hint derived from the machine's available parallelism
pub fn encoder_thread_hint() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
