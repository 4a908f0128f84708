use thiserror::Error;

use super::ShaderStage;

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("shader source is not UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("shader failed to parse:\n{0}")]
    Parse(String),

    #[error("shader failed validation:\n{0}")]
    Validation(String),

    #[error("shader has no {0:?} entry point")]
    MissingEntryPoint(ShaderStage),

    /// Module-scope resource of a kind pipelines cannot bind.
    #[error("binding {name:?} has an unsupported type")]
    UnsupportedBinding { name: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("shader passed as {expected:?} stage was compiled for {actual:?}")]
    StageMismatch {
        expected: ShaderStage,
        actual: ShaderStage,
    },

    #[error("binding {name:?} uses group {group}; only group 0 is supported")]
    UnsupportedGroup { name: String, group: u32 },

    #[error("binding {binding} is declared as both {first:?} and {second:?}")]
    ConflictingBinding {
        binding: u32,
        first: String,
        second: String,
    },

    #[error("vertex attribute {0:?} is not an input of the vertex shader")]
    MissingAttribute(String),

    #[error("vertex shader input {0:?} is not provided by the vertex structure")]
    UnboundInput(String),

    #[error("no texture unit named {0:?}")]
    UnknownTextureUnit(String),

    #[error("texture unit {unit:?} has no sampler binding {sampler:?}")]
    MissingSampler { unit: String, sampler: String },

    #[error("no constant location named {0:?}")]
    UnknownConstant(String),

    #[error("{name:?} is a {actual}, not a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Static buffers are written exactly once.
    #[error("static buffer was already written")]
    AlreadyWritten,

    #[error("buffer must hold at least one element")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    #[error("no pipeline is set")]
    NoPipeline,

    #[error("no vertex buffer is set")]
    NoVertexBuffer,

    #[error("no index buffer is set")]
    NoIndexBuffer,

    #[error("{0} buffer was never written")]
    UnwrittenBuffer(&'static str),

    #[error("no texture is bound for binding {0}")]
    UnboundTexture(u32),

    #[error("constant at binding {binding} holds {expected} bytes, got {actual}")]
    ConstantSize {
        binding: u32,
        expected: u32,
        actual: u32,
    },

    #[error("binding {0} is not a constant of the current pipeline")]
    UnknownConstant(u32),
}
