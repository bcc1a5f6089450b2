//! Translation of iteration-engine status codes.
//!
//! An [`crate::algorithms::IterationEngine`] reports its outcome as a signed integer,
//! following the numbering long established by reverse-communication eigensolvers:
//! `0` is a normal exit, small positive values are soft warnings after which
//! best-effort eigenpairs are still available, and negative values are hard
//! failures. [`EngineStatus`] gives each known code a name and a diagnostic.

use thiserror::Error;

/// How a status code affects the outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    /// Results are returned, but the caller should decide whether they are good enough.
    Warning,
    Error,
}

/// A named engine status. The `Display` text is the diagnostic shown to users.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    #[error("Normal exit.")]
    Normal,
    #[error("Maximum number of iterations reached.")]
    MaxIterations,
    #[error("No shifts could be applied during a restart, try increasing NCV.")]
    NoShiftsApplied,
    #[error("N must be positive.")]
    NonPositiveDimension,
    #[error("NEV must be positive.")]
    NonPositiveNev,
    #[error("NCV must be greater than NEV and less than or equal to N.")]
    InvalidNcv,
    #[error("The maximum number of restart iterations allowed must be greater than zero.")]
    NonPositiveIterations,
    #[error("WHICH must be one of 'LM', 'SM', 'LA', 'SA' or 'BE'.")]
    InvalidWhich,
    #[error("BMAT must be one of 'I' or 'G'.")]
    InvalidBmat,
    #[error("Length of the private work array WORKL is not sufficient.")]
    WorkspaceTooSmall,
    #[error("Error return from the tridiagonal eigenvalue calculation.")]
    TridiagonalEigensolve,
    #[error("Starting vector is zero.")]
    ZeroStartingVector,
    #[error("The spectral transform code must be 1, 2, 3, 4 or 5.")]
    InvalidTransform,
    #[error("Transform 1 and BMAT = 'G' are incompatible.")]
    RegularModeWithMass,
    #[error("The shift strategy must be 0 or 1.")]
    InvalidShiftStrategy,
    #[error("NEV = 1 and WHICH = 'BE' are incompatible.")]
    BothEndsWithSingleEigenvalue,
    #[error("The iteration did not produce Ritz values to extract.")]
    NothingToExtract,
    #[error("Could not build a Lanczos factorization; the factorization size is reported in the statistics.")]
    FactorizationBreakdown,
    #[error("Unknown status {0}. Check the documentation of the iteration engine.")]
    Unknown(i32),
}

impl EngineStatus {
    /// Maps a raw engine code to its named status.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Normal,
            1 => Self::MaxIterations,
            3 => Self::NoShiftsApplied,
            -1 => Self::NonPositiveDimension,
            -2 => Self::NonPositiveNev,
            -3 => Self::InvalidNcv,
            -4 => Self::NonPositiveIterations,
            -5 => Self::InvalidWhich,
            -6 => Self::InvalidBmat,
            -7 => Self::WorkspaceTooSmall,
            -8 => Self::TridiagonalEigensolve,
            -9 => Self::ZeroStartingVector,
            -10 => Self::InvalidTransform,
            -11 => Self::RegularModeWithMass,
            -12 => Self::InvalidShiftStrategy,
            -13 => Self::BothEndsWithSingleEigenvalue,
            -14 => Self::NothingToExtract,
            -9999 => Self::FactorizationBreakdown,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw code of this status.
    pub fn code(&self) -> i32 {
        match *self {
            Self::Normal => 0,
            Self::MaxIterations => 1,
            Self::NoShiftsApplied => 3,
            Self::NonPositiveDimension => -1,
            Self::NonPositiveNev => -2,
            Self::InvalidNcv => -3,
            Self::NonPositiveIterations => -4,
            Self::InvalidWhich => -5,
            Self::InvalidBmat => -6,
            Self::WorkspaceTooSmall => -7,
            Self::TridiagonalEigensolve => -8,
            Self::ZeroStartingVector => -9,
            Self::InvalidTransform => -10,
            Self::RegularModeWithMass => -11,
            Self::InvalidShiftStrategy => -12,
            Self::BothEndsWithSingleEigenvalue => -13,
            Self::NothingToExtract => -14,
            Self::FactorizationBreakdown => -9999,
            Self::Unknown(code) => code,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.code() {
            0 => Severity::Success,
            code if code > 0 => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_round_trip() {
        let codes = [
            0, 1, 3, -1, -2, -3, -4, -5, -6, -7, -8, -9, -10, -11, -12, -13, -14, -9999,
        ];
        for code in codes {
            let status = EngineStatus::from_code(code);
            assert!(!matches!(status, EngineStatus::Unknown(_)), "code {code}");
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_severity_classes() {
        assert_eq!(EngineStatus::from_code(0).severity(), Severity::Success);
        assert_eq!(EngineStatus::from_code(1).severity(), Severity::Warning);
        assert_eq!(EngineStatus::from_code(3).severity(), Severity::Warning);
        assert_eq!(EngineStatus::from_code(-3).severity(), Severity::Error);
        assert_eq!(EngineStatus::from_code(-9999).severity(), Severity::Error);
        assert_eq!(EngineStatus::from_code(-42).severity(), Severity::Error);
        assert_eq!(EngineStatus::from_code(2).severity(), Severity::Warning);
    }

    #[test]
    fn test_unknown_code_message() {
        assert_eq!(
            EngineStatus::from_code(-42).to_string(),
            "Unknown status -42. Check the documentation of the iteration engine."
        );
        assert_eq!(
            EngineStatus::from_code(1).to_string(),
            "Maximum number of iterations reached."
        );
    }
}
