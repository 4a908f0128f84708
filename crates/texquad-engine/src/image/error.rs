use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    /// Known container, but a payload kind this engine does not decode.
    #[error("unsupported image format {0:?}")]
    Unsupported(String),

    #[error("malformed image: {0}")]
    Malformed(String),

    /// The output block cannot hold the decoded pixels.
    #[error("image staging too small: need {needed} bytes, have {available}")]
    StagingTooSmall { needed: usize, available: usize },

    #[error("lz4 payload is corrupt")]
    Lz4(#[from] lz4_flex::block::DecompressError),

    #[error("image decode failed")]
    Decode(#[from] ::image::ImageError),
}
