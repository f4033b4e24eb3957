use thiserror::Error;

#[derive(Debug, Error)]
pub enum MangaPagesError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Stitch error: {0}")]
    StitchError(String),

    #[error("Segmentation error: {0}")]
    SegmentationError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`MangaPagesError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl MangaPagesError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a chapter source error.
    chapter_source => SourceError,
    /// Create a stitch error.
    stitch => StitchError,
    /// Create a segmentation error.
    segmentation => SegmentationError,
    /// Create a cache error.
    cache => CacheError,
    /// Create an image error.
    image => ImageError,
}

impl From<serde_json::Error> for MangaPagesError {
    fn from(e: serde_json::Error) -> Self {
        Self::CacheError(e.to_string())
    }
}

impl From<serde_yml::Error> for MangaPagesError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for MangaPagesError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MangaPagesError>;
