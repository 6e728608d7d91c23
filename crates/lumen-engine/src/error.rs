//! Engine error taxonomy.
//!
//! None of these errors are fatal to the frame loop. Core types expose a
//! checked form returning `Result<_, EngineError>` and, where the engine must
//! keep running, a reporting form that logs the error and yields a fallback.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Rows × columns pair used in dimension diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Dims {
    pub rows: usize,
    pub cols: usize,
}

impl Dims {
    #[inline]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// What a failed id lookup was looking for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LookupKind {
    Object,
    Polygon,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Object => f.write_str("object"),
            LookupKind::Polygon => f.write_str("polygon"),
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    /// Operand shapes do not fit the requested operation.
    #[error("{op}: incorrect sizes ({left} vs {right})")]
    DimensionMismatch {
        op: &'static str,
        left: Dims,
        right: Dims,
    },

    /// Scalar division by zero.
    #[error("{op}: division by zero")]
    DivisionByZero { op: &'static str },

    /// Lookup by id failed.
    #[error("{kind} with id {id} not found")]
    NotFound { kind: LookupKind, id: u32 },

    /// Bounded instance array is full.
    #[error("too many instances created (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    /// Texture, kernel or shader input could not be loaded.
    #[error("failed to load {path:?}: {reason}")]
    ResourceLoad { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}

impl EngineError {
    pub(crate) fn dims(op: &'static str, left: Dims, right: Dims) -> Self {
        EngineError::DimensionMismatch { op, left, right }
    }

    pub(crate) fn resource(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        EngineError::ResourceLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Emits the diagnostic for this error and hands it back.
    pub fn report(self) -> Self {
        match &self {
            EngineError::NotFound { .. } | EngineError::CapacityExceeded { .. } => {
                log::warn!("{self}")
            }
            _ => log::error!("{self}"),
        }
        self
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Unwraps `result`, reporting the error and substituting `fallback`.
#[inline]
pub(crate) fn or_report<T>(result: Result<T>, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            e.report();
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message_names_both_shapes() {
        let e = EngineError::dims("matrix multiplication", Dims::new(2, 3), Dims::new(2, 3));
        assert_eq!(
            e.to_string(),
            "matrix multiplication: incorrect sizes (2x3 vs 2x3)"
        );
    }

    #[test]
    fn or_report_substitutes_fallback() {
        let r: Result<i32> = Err(EngineError::DivisionByZero { op: "test" });
        assert_eq!(or_report(r, || 7), 7);
        assert_eq!(or_report(Ok(3), || 7), 3);
    }
}
