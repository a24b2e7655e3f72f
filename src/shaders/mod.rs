pub mod program;

use std::{fmt, fs, path::Path};

use shaderc::{CompileOptions, Compiler, EnvVersion, ShaderKind, TargetEnv};

pub use self::program::{PipelineOptions, ShaderProgram};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn kind(self) -> ShaderKind {
        match self {
            ShaderStage::Vertex => ShaderKind::Vertex,
            ShaderStage::Fragment => ShaderKind::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("shader compiler is unavailable")]
    CompilerUnavailable,
    #[error("failed to compile {stage} shader `{name}`:\n{log}")]
    Compilation {
        name: String,
        stage: ShaderStage,
        log: String,
    },
    #[error("shader `{name}` has not been compiled successfully")]
    NotCompiled { name: String },
    #[error("shader `{name}` is a {actual} shader, expected a {expected} shader")]
    StageMismatch {
        name: String,
        expected: ShaderStage,
        actual: ShaderStage,
    },
}

/// What to do with a shader that failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilePolicy {
    /// Print the diagnostic and terminate the process.
    FailFast,
    /// Never inspect the compile status; the program simply does not link.
    Unchecked,
}

impl CompilePolicy {
    /// Apply the policy to one compiled shader. Returns only if the process
    /// keeps running.
    pub fn enforce(self, shader: &ShaderObject) {
        if self == CompilePolicy::FailFast {
            if let Err(e) = check_compile_status(shader) {
                exit_on_compile_failure(&e);
            }
        }
    }
}

/// Shader text loaded from an asset file.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub name: String,
    pub text: String,
}

impl ShaderSource {
    pub fn load(dir: &Path, file_name: &str) -> Result<Self, ShaderError> {
        let path = dir.join(file_name);
        let text = fs::read_to_string(&path).map_err(|source| ShaderError::Io {
            path: path.display().to_string(),
            source,
        })?;

        log::debug!("loaded shader source {} ({} bytes)", path.display(), text.len());

        Ok(ShaderSource {
            name: file_name.to_owned(),
            text,
        })
    }

    pub fn from_text(name: &str, text: &str) -> Self {
        ShaderSource {
            name: name.to_owned(),
            text: text.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
enum CompileStatus {
    Compiled(Vec<u32>),
    Failed(String),
}

/// One shader stage after compilation: either SPIR-V or the compiler's
/// diagnostic log. Compilation never fails outright; the status is queried
/// afterwards.
#[derive(Debug, Clone)]
pub struct ShaderObject {
    name: String,
    stage: ShaderStage,
    status: CompileStatus,
}

impl ShaderObject {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn compile_status(&self) -> bool {
        matches!(self.status, CompileStatus::Compiled(_))
    }

    /// The compiler diagnostic. Empty for a shader that compiled.
    pub fn info_log(&self) -> &str {
        match &self.status {
            CompileStatus::Compiled(_) => "",
            CompileStatus::Failed(log) => log,
        }
    }

    pub fn spirv(&self) -> Result<&[u32], ShaderError> {
        match &self.status {
            CompileStatus::Compiled(words) => Ok(words),
            CompileStatus::Failed(_) => Err(ShaderError::NotCompiled {
                name: self.name.clone(),
            }),
        }
    }
}

/// The clip-space convention a vertex shader's `gl_Position` is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSpace {
    /// +y down; the shader already targets Vulkan.
    Vulkan,
    /// +y up, as in desktop GL. The compiler negates `gl_Position.y`.
    YUp,
}

/// GLSL to SPIR-V compiler targeting Vulkan 1.0.
pub struct ShaderCompiler {
    compiler: Compiler,
    options: CompileOptions<'static>,
}

impl ShaderCompiler {
    pub fn new() -> Result<Self, ShaderError> {
        Self::for_clip_space(ClipSpace::Vulkan)
    }

    pub fn for_clip_space(clip_space: ClipSpace) -> Result<Self, ShaderError> {
        let compiler = Compiler::new().ok_or(ShaderError::CompilerUnavailable)?;
        let mut options = CompileOptions::new().ok_or(ShaderError::CompilerUnavailable)?;

        options.set_target_env(TargetEnv::Vulkan, EnvVersion::Vulkan1_0 as u32);
        // `#version 330 core` outputs carry no explicit location.
        options.set_auto_map_locations(true);
        options.set_invert_y(clip_space == ClipSpace::YUp);

        Ok(ShaderCompiler { compiler, options })
    }

    pub fn compile(&mut self, stage: ShaderStage, source: &ShaderSource) -> ShaderObject {
        let result = self.compiler.compile_into_spirv(
            &source.text,
            stage.kind(),
            &source.name,
            "main",
            Some(&self.options),
        );

        let status = match result {
            Ok(artifact) => {
                if artifact.get_num_warnings() > 0 {
                    log::warn!(
                        "{} shader `{}` compiled with warnings:\n{}",
                        stage,
                        source.name,
                        artifact.get_warning_messages()
                    );
                }
                log::debug!("compiled {} shader `{}`", stage, source.name);
                CompileStatus::Compiled(artifact.as_binary().to_vec())
            }
            Err(shaderc::Error::CompilationError(_, log)) => CompileStatus::Failed(log),
            Err(e) => CompileStatus::Failed(e.to_string()),
        };

        ShaderObject {
            name: source.name.clone(),
            stage,
            status,
        }
    }
}

/// Pure half of the fail-fast policy: turn a failed compile into an error
/// carrying the diagnostic.
pub fn check_compile_status(shader: &ShaderObject) -> Result<(), ShaderError> {
    match &shader.status {
        CompileStatus::Compiled(_) => Ok(()),
        CompileStatus::Failed(log) => Err(ShaderError::Compilation {
            name: shader.name.clone(),
            stage: shader.stage,
            log: log.clone(),
        }),
    }
}

/// First line of the fail-fast report.
pub const COMPILE_FAILURE_HEADER: &str = "Shader compilation failed:";

/// The text printed to stdout when a fail-fast compile fails: the header,
/// then the compiler log (or the error itself for non-compile failures).
pub fn compile_failure_report(error: &ShaderError) -> String {
    let body = match error {
        ShaderError::Compilation { log, .. } => log.trim_end().to_owned(),
        other => other.to_string(),
    };
    format!("{COMPILE_FAILURE_HEADER}\n{body}")
}

/// Side-effecting half of the fail-fast policy.
pub fn exit_on_compile_failure(error: &ShaderError) -> ! {
    match error {
        ShaderError::Compilation { name, stage, .. } => {
            log::error!("{stage} shader `{name}` failed to compile, exiting")
        }
        other => log::error!("{other}, exiting"),
    }
    crate::logging::flush();

    println!("{}", compile_failure_report(error));

    std::process::exit(1);
}
