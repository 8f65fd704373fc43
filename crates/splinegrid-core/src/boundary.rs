use std::fmt;
use std::str::FromStr;

use crate::error::SplineError;

/// Policy for spline support indices that fall outside `[0, len)`.
///
/// The mode is resolved to one of these variants before any evaluation takes
/// place. Parsing a name with [`str::parse`] fails on unknown names, while
/// [`BoundaryMode::resolve_lenient`] falls back to [`BoundaryMode::Constant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BoundaryMode {
    /// Out-of-range terms contribute zero.
    ///
    /// Example: ...0 0 | a b c d | 0 0...
    Constant,

    /// Reflect about the edge sample, which is not repeated.
    ///
    /// Example: ...c b | a b c d | c b...
    #[default]
    Mirror,

    /// Repeat the outermost sample.
    ///
    /// Example: ...a a | a b c d | d d...
    Nearest,

    /// Wrap around to the opposite side.
    ///
    /// Example: ...c d | a b c d | a b...
    Wrap,

    /// Reflect about the outer edge of the boundary sample, repeating it.
    ///
    /// Example: ...b a | a b c d | d c...
    Reflect,
}

impl BoundaryMode {
    /// All supported modes.
    pub const ALL: [BoundaryMode; 5] = [
        BoundaryMode::Constant,
        BoundaryMode::Mirror,
        BoundaryMode::Nearest,
        BoundaryMode::Wrap,
        BoundaryMode::Reflect,
    ];

    /// Canonical name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryMode::Constant => "constant",
            BoundaryMode::Mirror => "mirror",
            BoundaryMode::Nearest => "nearest",
            BoundaryMode::Wrap => "wrap",
            BoundaryMode::Reflect => "reflect",
        }
    }

    /// Resolves a mode name given for a single call.
    ///
    /// Unknown names fall back to zero padding instead of failing. This is the
    /// call-time counterpart of the strict parsing done at construction.
    pub fn resolve_lenient(name: &str) -> BoundaryMode {
        match name.parse() {
            Ok(mode) => mode,
            Err(_) => {
                log::warn!("unknown boundary mode {name:?}, falling back to zero padding");
                BoundaryMode::Constant
            }
        }
    }

    #[inline]
    fn mirror(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i;
            } else {
                i = 2 * len - i - 2;
            }
        }
        i as usize
    }

    #[inline]
    fn reflect(i: isize, len: usize) -> usize {
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i - 1;
            } else {
                i = 2 * len - i - 1;
            }
        }
        i as usize
    }

    #[inline]
    fn wrap(i: isize, len: usize) -> usize {
        i.rem_euclid(len as isize) as usize
    }

    /// Maps index `i` into `[0, len)` according to the mode.
    ///
    /// Returns `None` for [`BoundaryMode::Constant`] when `i` is out of range,
    /// meaning the term must contribute zero. In-range indices are returned
    /// unchanged for every mode.
    ///
    /// # Arguments
    /// - `i`: The (possibly out-of-range) sample index.
    /// - `len`: The number of samples along the axis, at least 1.
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> Option<usize> {
        if i >= 0 && (i as usize) < len {
            return Some(i as usize);
        }
        match self {
            BoundaryMode::Constant => None,
            BoundaryMode::Mirror => Some(Self::mirror(i, len)),
            BoundaryMode::Nearest => Some(i.clamp(0, len as isize - 1) as usize),
            BoundaryMode::Wrap => Some(Self::wrap(i, len)),
            BoundaryMode::Reflect => Some(Self::reflect(i, len)),
        }
    }
}

impl FromStr for BoundaryMode {
    type Err = SplineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "constant" | "zero" | "zeros" => Ok(BoundaryMode::Constant),
            "mirror" => Ok(BoundaryMode::Mirror),
            "nearest" | "replicate" | "edge" => Ok(BoundaryMode::Nearest),
            "wrap" | "periodic" => Ok(BoundaryMode::Wrap),
            "reflect" => Ok(BoundaryMode::Reflect),
            _ => Err(SplineError::invalid_parameter(format!(
                "unknown boundary mode {s:?}, expected one of constant, mirror, nearest, wrap, reflect"
            ))),
        }
    }
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
