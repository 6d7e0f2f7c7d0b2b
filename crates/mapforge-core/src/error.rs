use thiserror::Error;

/// Errors surfaced by the generation core.
///
/// Missing roads and short building counts are not errors; they show up as
/// empty paths and shorter lists in the result.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i32, y: i32, width: usize, height: usize },

    #[error("{what} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    DimensionMismatch {
        what: &'static str,
        want_w: usize,
        want_h: usize,
        got_w: usize,
        got_h: usize,
    },

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
