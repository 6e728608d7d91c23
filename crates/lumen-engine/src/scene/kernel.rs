use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// 3×3 convolution applied by the post pass.
///
/// Row-major, top row first: `weights[0]` samples the row above the pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Kernel {
    weights: [[f64; 3]; 3],
}

impl Kernel {
    pub const fn new(weights: [[f64; 3]; 3]) -> Self {
        Self { weights }
    }

    /// Pass-through filter.
    pub const fn identity() -> Self {
        Self::new([[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]])
    }

    /// Reads nine whitespace-separated numbers from a `.kernel` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::resource(path, e).report())?;
        parse(&text).map_err(|reason| EngineError::resource(path, reason).report())
    }

    /// Reads the table from any byte source.
    pub fn read(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Kernel::parse(&text)
    }

    /// Parses the plain-text table, see [`Kernel::load`].
    pub fn parse(text: &str) -> Result<Self> {
        parse(text).map_err(|reason| EngineError::resource("<inline kernel>", reason))
    }

    #[inline]
    pub fn weights(&self) -> &[[f64; 3]; 3] {
        &self.weights
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.weights.iter().flatten().sum()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::identity()
    }
}

impl FromStr for Kernel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Kernel::parse(s)
    }
}

fn parse(text: &str) -> std::result::Result<Kernel, String> {
    let mut weights = [[0.0; 3]; 3];
    let mut tokens = text.split_whitespace();

    for (i, w) in weights.iter_mut().flatten().enumerate() {
        let Some(tok) = tokens.next() else {
            return Err(format!("expected 9 weights, found {i}"));
        };
        *w = tok
            .parse::<f64>()
            .map_err(|e| format!("weight {i} ({tok:?}): {e}"))?;
    }

    if tokens.next().is_some() {
        return Err("more than 9 weights".to_string());
    }
    Ok(Kernel::new(weights))
}

/// Post-process parameters handed to the convolution pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostSettings {
    pub kernel: Kernel,
    /// Sampling step in UV units between neighbouring taps.
    pub offset: f64,
    pub grayscale: bool,
}

pub const DEFAULT_KERNEL_OFFSET: f64 = 1.0 / 300.0;

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            kernel: Kernel::identity(),
            offset: DEFAULT_KERNEL_OFFSET,
            grayscale: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let k = Kernel::default();
        assert_eq!(k.weights()[1][1], 1.0);
        assert_eq!(k.sum(), 1.0);
    }

    #[test]
    fn parses_nine_numbers_row_major() {
        let k: Kernel = "1 1 1\n1 -8 1\n1 1 1\n".parse().unwrap();
        assert_eq!(k.weights()[1], [1.0, -8.0, 1.0]);
        assert_eq!(k.sum(), 0.0);
    }

    #[test]
    fn rejects_short_and_long_tables() {
        assert!(matches!(Kernel::parse("1 2 3"), Err(EngineError::ResourceLoad { .. })));
        assert!(Kernel::parse("0 0 0 0 1 0 0 0 0 0").is_err());
        assert!(Kernel::parse("0 0 0 0 x 0 0 0 0").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let r = Kernel::load("no/such/file.kernel");
        assert!(matches!(r, Err(EngineError::ResourceLoad { .. })));
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!("lumen-kernel-{}.kernel", std::process::id()));
        std::fs::write(&path, "0 -1 0 -1 5 -1 0 -1 0").unwrap();
        let k = Kernel::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(k.weights()[1][1], 5.0);
    }

    #[test]
    fn read_from_reader() {
        let k = Kernel::read("0 0 0\n0 2 0\n0 0 0".as_bytes()).unwrap();
        assert_eq!(k.sum(), 2.0);

        let bad: &[u8] = &[0xff, 0xfe, 0x00];
        assert!(matches!(Kernel::read(bad), Err(EngineError::Io(_))));
    }

    #[test]
    fn post_defaults() {
        let p = PostSettings::default();
        assert!(!p.grayscale);
        assert!((p.offset - 1.0 / 300.0).abs() < 1e-15);
    }
}
