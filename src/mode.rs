//! Problem formulations and the mapping from (region, mode) to engine parameters.
//!
//! A solve is described by two selectors: which part of the spectrum is wanted
//! ([`SpectralRegion`]) and how the problem is formulated ([`ProblemMode`]). The
//! dispatcher turns the mode into the three things the rest of the solver needs:
//! whether the engine works with a `B` inner product ([`MatrixKind`]), the
//! [`SpectralTransform`] used to map Ritz values back to eigenvalues, and the
//! driver registry slot that performs the operator applications.

use crate::error::{EigsError, EigsErrorKind};
use std::{fmt, str::FromStr};

/// Which eigenvalues of the iteration operator are wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralRegion {
    LargestAlgebraic,
    SmallestAlgebraic,
    LargestMagnitude,
    SmallestMagnitude,
    /// Half from each end of the spectrum, one more from the high end when `nev` is odd.
    BothEnds,
}

impl SpectralRegion {
    pub const ALL: [Self; 5] = [
        Self::LargestAlgebraic,
        Self::SmallestAlgebraic,
        Self::LargestMagnitude,
        Self::SmallestMagnitude,
        Self::BothEnds,
    ];

    /// The two-letter code of the region.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LargestAlgebraic => "LA",
            Self::SmallestAlgebraic => "SA",
            Self::LargestMagnitude => "LM",
            Self::SmallestMagnitude => "SM",
            Self::BothEnds => "BE",
        }
    }
}

impl fmt::Display for SpectralRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SpectralRegion {
    type Err = EigsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|region| region.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EigsErrorKind::InvalidOrder(s.to_string()).into())
    }
}

impl TryFrom<i32> for SpectralRegion {
    type Error = EigsError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| EigsErrorKind::InvalidOrder(value.to_string()).into())
    }
}

/// The six supported formulations, one per driver registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemMode {
    /// `A x = λ x` with `OP = A`.
    StandardRegular,
    /// `A x = λ x` with `OP = (A - σI)^-1`.
    StandardShiftInvert,
    /// `A x = λ M x` with `OP = M^-1 A`.
    GeneralizedRegularInverse,
    /// `A x = λ M x` with `OP = (A - σM)^-1 M`.
    GeneralizedShiftInvert,
    /// `K x = λ KG x` with `OP = (K - σKG)^-1 K`.
    GeneralizedBuckling,
    /// `A x = λ M x` with `OP = (A - σM)^-1 (A + σM)`.
    GeneralizedCayley,
}

impl ProblemMode {
    pub const ALL: [Self; 6] = [
        Self::StandardRegular,
        Self::StandardShiftInvert,
        Self::GeneralizedRegularInverse,
        Self::GeneralizedShiftInvert,
        Self::GeneralizedBuckling,
        Self::GeneralizedCayley,
    ];

    /// Registry slot of this mode.
    pub fn slot(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StandardRegular => "standard-regular",
            Self::StandardShiftInvert => "standard-shift-invert",
            Self::GeneralizedRegularInverse => "generalized-regular-inverse",
            Self::GeneralizedShiftInvert => "generalized-shift-invert",
            Self::GeneralizedBuckling => "generalized-buckling",
            Self::GeneralizedCayley => "generalized-cayley",
        }
    }

    pub fn matrix_kind(&self) -> MatrixKind {
        match self {
            Self::StandardRegular | Self::StandardShiftInvert => MatrixKind::Standard,
            _ => MatrixKind::Generalized,
        }
    }

    pub fn transform(&self) -> SpectralTransform {
        match self {
            Self::StandardRegular => SpectralTransform::Regular,
            Self::StandardShiftInvert | Self::GeneralizedShiftInvert => {
                SpectralTransform::ShiftInvert
            }
            Self::GeneralizedRegularInverse => SpectralTransform::RegularInverse,
            Self::GeneralizedBuckling => SpectralTransform::Buckling,
            Self::GeneralizedCayley => SpectralTransform::Cayley,
        }
    }
}

impl fmt::Display for ProblemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProblemMode {
    type Err = EigsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<i32>() {
            return Self::try_from(index);
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EigsErrorKind::InvalidMode(s.to_string()).into())
    }
}

impl TryFrom<i32> for ProblemMode {
    type Error = EigsError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| EigsErrorKind::InvalidMode(value.to_string()).into())
    }
}

/// Whether the engine works in the Euclidean (`I`) or a `B` inner product (`G`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Standard,
    Generalized,
}

impl MatrixKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Standard => "I",
            Self::Generalized => "G",
        }
    }

    pub fn is_generalized(&self) -> bool {
        matches!(self, Self::Generalized)
    }
}

/// Spectral transformation applied by the iteration operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralTransform {
    Regular = 1,
    RegularInverse = 2,
    ShiftInvert = 3,
    Buckling = 4,
    Cayley = 5,
}

impl SpectralTransform {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Maps an eigenvalue `nu` of the iteration operator back to an eigenvalue of the pencil.
    pub fn recover(&self, nu: f64, sigma: f64) -> f64 {
        match self {
            Self::Regular | Self::RegularInverse => nu,
            Self::ShiftInvert => sigma + 1.0 / nu,
            Self::Buckling => sigma * nu / (nu - 1.0),
            Self::Cayley => sigma * (nu + 1.0) / (nu - 1.0),
        }
    }
}

/// Everything the solver derives from the (region, mode) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDispatch {
    pub region: SpectralRegion,
    pub mode: ProblemMode,
    pub matrix: MatrixKind,
    pub transform: SpectralTransform,
    pub slot: usize,
}

/// Resolves a (region, mode) pair.
pub fn dispatch(region: SpectralRegion, mode: ProblemMode) -> ModeDispatch {
    ModeDispatch {
        region,
        mode,
        matrix: mode.matrix_kind(),
        transform: mode.transform(),
        slot: mode.slot(),
    }
}

/// Resolves raw integer selectors, as they arrive across a C-style boundary.
pub fn dispatch_raw(region: i32, mode: i32) -> Result<ModeDispatch, EigsError> {
    let region = SpectralRegion::try_from(region)?;
    let mode = ProblemMode::try_from(mode)?;
    Ok(dispatch(region, mode))
}
