//! This module provides utilities for loading test problems from files.
//!
//! Matrices are read from the Matrix Market coordinate format, the exchange format
//! of the SuiteSparse collection. Both `general` and `symmetric` storage are
//! accepted; for `symmetric` files only one triangle is stored and the other is
//! mirrored on load. `pattern` files get unit values.

use crate::factor::SymTridiagonal;
use faer::sparse::{SparseColMat, Triplet};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use thiserror::Error;

/// Represents all possible errors that can occur during data loading and parsing.
#[derive(Error, Debug)]
pub enum DataLoaderError {
    /// Wraps a standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Occurs when a string cannot be parsed into an integer.
    #[error("Parse error: Failed to parse integer from '{0}'")]
    ParseInt(String),
    /// Occurs when a string cannot be parsed into a float.
    #[error("Parse error: Failed to parse float from '{0}'")]
    ParseFloat(String),
    /// The `%%MatrixMarket` banner is missing or describes an unsupported format.
    #[error("Format error: unsupported or missing Matrix Market banner '{0}'.")]
    Banner(String),
    /// The size line `rows cols entries` was not found.
    #[error("Format error: The size line was not found or was malformed.")]
    SizeLineMissing,
    /// Occurs when the end of a file is reached unexpectedly during parsing.
    #[error("Format error: Unexpected end of file after {read} of {expected} entries.")]
    UnexpectedEof { read: usize, expected: usize },
    /// An entry refers to a row or column outside the declared size.
    #[error("Format error: entry ({row}, {col}) is outside a {rows}x{cols} matrix.")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    /// The size line declares more entries than the matrix has positions.
    #[error("Format error: {entries} entries declared for a {rows}x{cols} matrix.")]
    TooManyEntries {
        entries: usize,
        rows: usize,
        cols: usize,
    },
    /// The matrix has entries outside the three central diagonals.
    #[error("The matrix is not tridiagonal: entry ({0}, {1}) is off the band.")]
    NotTridiagonal(usize, usize),
    /// The matrix is not square.
    #[error("The matrix is not square: {0}x{1}.")]
    NotSquare(usize, usize),
    /// Occurs if the sparse matrix construction fails internally.
    #[error("Internal error: Failed to construct the sparse matrix from triplets.")]
    SparseMatrixConstructionError,
}

/// Upper bound on the triplets reserved up front from the size line.
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symmetry {
    General,
    Symmetric,
}

/// Parses the banner line, returning the storage symmetry and whether values are present.
fn parse_banner(line: &str) -> Result<(Symmetry, bool), DataLoaderError> {
    let fields: Vec<String> = line
        .split_whitespace()
        .map(|field| field.to_ascii_lowercase())
        .collect();
    let banner_error = || DataLoaderError::Banner(line.to_string());
    if fields.len() != 5 || fields[0] != "%%matrixmarket" || fields[1] != "matrix" {
        return Err(banner_error());
    }
    if fields[2] != "coordinate" {
        return Err(banner_error());
    }
    let has_values = match fields[3].as_str() {
        "real" | "integer" | "double" => true,
        "pattern" => false,
        _ => return Err(banner_error()),
    };
    let symmetry = match fields[4].as_str() {
        "general" => Symmetry::General,
        "symmetric" => Symmetry::Symmetric,
        _ => return Err(banner_error()),
    };
    Ok((symmetry, has_values))
}

fn parse_index(token: Option<&str>) -> Result<usize, DataLoaderError> {
    let token = token.ok_or(DataLoaderError::SizeLineMissing)?;
    token
        .parse::<usize>()
        .map_err(|_| DataLoaderError::ParseInt(token.to_string()))
}

/// Parses a Matrix Market coordinate matrix from any buffered reader.
pub fn parse_matrix_market(
    reader: impl BufRead,
) -> Result<SparseColMat<usize, f64>, DataLoaderError> {
    let mut lines = reader.lines();

    let banner = lines
        .next()
        .ok_or(DataLoaderError::Banner(String::new()))??;
    let (symmetry, has_values) = parse_banner(&banner)?;

    // Skip comments until the size line.
    let size_line = loop {
        let line = lines.next().ok_or(DataLoaderError::SizeLineMissing)??;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('%') {
            break line;
        }
    };
    let mut fields = size_line.split_whitespace();
    let rows = parse_index(fields.next())?;
    let cols = parse_index(fields.next())?;
    let entries = parse_index(fields.next())?;

    if entries > rows.saturating_mul(cols) {
        return Err(DataLoaderError::TooManyEntries {
            entries,
            rows,
            cols,
        });
    }

    // The header is untrusted; beyond this the vector grows as entries are read.
    let declared = match symmetry {
        Symmetry::General => entries,
        Symmetry::Symmetric => entries.saturating_mul(2),
    };
    let mut triplets: Vec<Triplet<usize, usize, f64>> =
        Vec::with_capacity(declared.min(MAX_PREALLOCATED_ENTRIES));
    let mut read = 0;

    for line in lines {
        if read == entries {
            break;
        }
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        // Indices are 1-based in the file.
        let row = parse_index(fields.next())?;
        let col = parse_index(fields.next())?;
        if row == 0 || col == 0 || row > rows || col > cols {
            return Err(DataLoaderError::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            });
        }
        let val = if has_values {
            let token = fields.next().ok_or(DataLoaderError::ParseFloat(String::new()))?;
            token
                .parse::<f64>()
                .map_err(|_| DataLoaderError::ParseFloat(token.to_string()))?
        } else {
            1.0
        };

        let (row, col) = (row - 1, col - 1);
        triplets.push(Triplet { row, col, val });
        if symmetry == Symmetry::Symmetric && row != col {
            triplets.push(Triplet {
                row: col,
                col: row,
                val,
            });
        }
        read += 1;
    }

    if read < entries {
        return Err(DataLoaderError::UnexpectedEof {
            read,
            expected: entries,
        });
    }

    SparseColMat::try_new_from_triplets(rows, cols, &triplets)
        .map_err(|_| DataLoaderError::SparseMatrixConstructionError)
}

/// Loads a Matrix Market file into a sparse matrix.
///
/// # Arguments
/// * `path`: The path to the `.mtx` file.
pub fn load_matrix_market(
    path: impl AsRef<Path>,
) -> Result<SparseColMat<usize, f64>, DataLoaderError> {
    let file = File::open(path)?;
    parse_matrix_market(BufReader::new(file))
}

/// Extracts the symmetric tridiagonal part of a sparse matrix, rejecting any entry
/// outside the band. The lower off-diagonal is used.
pub fn to_tridiagonal(
    matrix: &SparseColMat<usize, f64>,
) -> Result<SymTridiagonal, DataLoaderError> {
    let (rows, cols) = (matrix.as_ref().nrows(), matrix.as_ref().ncols());
    if rows != cols {
        return Err(DataLoaderError::NotSquare(rows, cols));
    }
    let mut diag = vec![0.0; rows];
    let mut off = vec![0.0; rows.saturating_sub(1)];
    for entry in matrix.as_ref().triplet_iter() {
        match entry.row as isize - entry.col as isize {
            0 => diag[entry.row] += *entry.val,
            1 => off[entry.col] += *entry.val,
            -1 => {}
            _ => return Err(DataLoaderError::NotTridiagonal(entry.row, entry.col)),
        }
    }
    SymTridiagonal::new(diag, off).map_err(|_| DataLoaderError::SparseMatrixConstructionError)
}
