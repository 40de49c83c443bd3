//! # Tool Path Resolver
//!
//! Finds the external executables the pipeline drives:
//! - `compressonatorcli`: texture encoder (required)
//! - `ktx`: Zstandard supercompression pass (optional)
//!
//! Lookup order for each tool:
//! 1. Explicit path given on the command line
//! 2. Engine-bundled copy: `$BASED_ENGINE_HOME/tools/bin/<OS>/<Bundle>/<tool>[.exe]`
//! 3. System `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable pointing at the engine checkout
pub const ENGINE_HOME_VAR: &str = "BASED_ENGINE_HOME";

/// An external tool and where the engine bundles it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    /// Executable name without extension
    pub name: &'static str,
    /// Bundle directory under `tools/bin/<OS>/`
    pub bundle: &'static str,
}

pub const COMPRESSONATOR: ToolSpec = ToolSpec {
    name: "compressonatorcli",
    bundle: "Compressonator",
};

pub const KTX: ToolSpec = ToolSpec {
    name: "ktx",
    bundle: "KTX",
};

/// Tool path resolver for engine-bundled and system tools
pub struct ToolPathResolver {
    /// Engine checkout, when known
    engine_home: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver using `BASED_ENGINE_HOME` when it is set
    pub fn new() -> Self {
        let engine_home = env::var_os(ENGINE_HOME_VAR).map(PathBuf::from);
        debug!("Engine home: {:?}", engine_home);
        Self { engine_home }
    }

    /// Create a resolver rooted at an explicit engine checkout
    pub fn with_engine_home(engine_home: Option<PathBuf>) -> Self {
        Self { engine_home }
    }

    /// Directory name for the running OS under `tools/bin/`
    pub fn os_dir() -> &'static str {
        if cfg!(target_os = "windows") {
            "Windows"
        } else if cfg!(target_os = "macos") {
            "Mac"
        } else {
            "Linux"
        }
    }

    fn executable_name(tool: ToolSpec) -> String {
        format!("{}{}", tool.name, env::consts::EXE_SUFFIX)
    }

    /// Expected path of the engine-bundled copy of a tool
    pub fn bundled_tool_path(&self, tool: ToolSpec) -> Option<PathBuf> {
        self.engine_home.as_ref().map(|home| {
            home.join("tools")
                .join("bin")
                .join(Self::os_dir())
                .join(tool.bundle)
                .join(Self::executable_name(tool))
        })
    }

    /// Resolve a tool, preferring an explicit override
    pub fn resolve(&self, tool: ToolSpec, explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            if path.is_file() {
                debug!("Using explicit {}: {}", tool.name, path.display());
                return Some(path.to_path_buf());
            }
            warn!("Configured {} does not exist: {}", tool.name, path.display());
            return None;
        }

        if let Some(bundled) = self.bundled_tool_path(tool) {
            if bundled.is_file() {
                debug!("Using bundled {}: {}", tool.name, bundled.display());
                return Some(bundled);
            }
            debug!("Bundled path does not exist: {}", bundled.display());
        }

        let system = Self::find_in_system_path(tool);
        if let Some(ref path) = system {
            debug!("Using system {}: {}", tool.name, path.display());
        }
        system
    }

    /// Find a tool in the system PATH
    fn find_in_system_path(tool: ToolSpec) -> Option<PathBuf> {
        let executable = Self::executable_name(tool);
        env::split_paths(&env::var_os("PATH")?)
            .map(|dir| dir.join(&executable))
            .find(|path| path.is_file())
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}
