//! Text format of graphs and distance matrices.
//!
//! Input: `n` followed by `n * n` whitespace-separated integers, row-major.
//! Output: `n` lines of `n` space-separated values, with unreachable pairs
//! printed as `0`.

use std::io::{Read, Write};

use crate::error::Error;
use crate::matrix::{MAX_EDGE_WEIGHT, Matrix, UNREACHABLE, Weight};

/// Parses an adjacency matrix. Tokens after the `n * n` values are ignored.
///
/// Weights must lie within `±`[`MAX_EDGE_WEIGHT`].
pub fn parse_graph(text: &str) -> Result<Matrix, Error> {
    let mut tokens = text.split_whitespace();

    let n_token = tokens
        .next()
        .ok_or_else(|| Error::Input("missing matrix dimension".to_string()))?;
    let n: usize = n_token
        .parse()
        .map_err(|_| Error::Input(format!("invalid matrix dimension {:?}", n_token)))?;

    let len = n
        .checked_mul(n)
        .ok_or_else(|| Error::Input(format!("matrix dimension {} is too large", n)))?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| Error::Allocation(format!("{} values: {}", len, e)))?;

    for index in 0..len {
        let token = tokens.next().ok_or_else(|| {
            Error::Input(format!(
                "missing matrix element [{}][{}]",
                index / n,
                index % n
            ))
        })?;
        let value: Weight = token.parse().map_err(|_| {
            Error::Input(format!(
                "invalid matrix element [{}][{}]: {:?}",
                index / n,
                index % n,
                token
            ))
        })?;
        if value.unsigned_abs() > MAX_EDGE_WEIGHT.unsigned_abs() {
            return Err(Error::Input(format!(
                "matrix element [{}][{}] = {} is out of range",
                index / n,
                index % n,
                value
            )));
        }
        data.push(value);
    }

    Matrix::from_vec(n, data).ok_or_else(|| Error::Input("inconsistent matrix size".to_string()))
}

pub fn read_graph<R: Read>(mut reader: R) -> Result<Matrix, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_graph(&text)
}

/// Renders a distance matrix. [`UNREACHABLE`] prints as `0`, the same as a
/// zero distance.
pub fn format_matrix(matrix: &Matrix) -> String {
    let mut out = String::new();
    for row in matrix.rows() {
        let line = row
            .iter()
            .map(|&value| {
                let shown = if value == UNREACHABLE { 0 } else { value };
                shown.to_string()
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn write_matrix<W: Write>(mut writer: W, matrix: &Matrix) -> Result<(), Error> {
    writer.write_all(format_matrix(matrix).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Renders an adjacency matrix in the input format.
pub fn format_graph(matrix: &Matrix) -> String {
    format!("{}\n{}", matrix.size(), format_matrix(matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_and_rows() {
        let m = parse_graph("2\n0 4\n  7 0\n").unwrap();
        assert_eq!(m, Matrix::from_rows(&[vec![0, 4], vec![7, 0]]).unwrap());
    }

    #[test]
    fn ignores_trailing_tokens() {
        let m = parse_graph("1 0 99 junk").unwrap();
        assert_eq!(m.as_slice(), &[0]);
    }

    #[test]
    fn reports_short_input() {
        let err = parse_graph("2\n0 1 2").unwrap_err();
        assert!(matches!(err, Error::Input(msg) if msg.contains("[1][1]")));
    }

    #[test]
    fn reports_bad_tokens() {
        assert!(matches!(parse_graph(""), Err(Error::Input(_))));
        assert!(matches!(parse_graph("-3"), Err(Error::Input(_))));
        assert!(matches!(parse_graph("2 0 x 1 0"), Err(Error::Input(_))));
    }

    #[test]
    fn rejects_weights_near_the_sentinel() {
        let err = parse_graph(&format!("2 0 {} 0 0", Weight::MAX)).unwrap_err();
        assert!(matches!(err, Error::Input(msg) if msg.contains("[0][1]")));
        assert!(matches!(
            parse_graph(&format!("1 {}", Weight::MIN)),
            Err(Error::Input(_))
        ));

        let edge = parse_graph(&format!("2 0 {} 0 0", MAX_EDGE_WEIGHT)).unwrap();
        assert_eq!(edge[(0, 1)], MAX_EDGE_WEIGHT);
    }

    #[test]
    fn empty_graph() {
        let m = parse_graph("0").unwrap();
        assert_eq!(m.size(), 0);
        assert_eq!(format_matrix(&m), "");
    }

    #[test]
    fn unreachable_prints_as_zero() {
        let m = Matrix::from_rows(&[vec![0, UNREACHABLE], vec![-2, 0]]).unwrap();
        assert_eq!(format_matrix(&m), "0 0\n-2 0\n");
    }

    #[test]
    fn graph_round_trips_through_text() {
        let m = Matrix::from_rows(&[vec![0, 3], vec![0, 0]]).unwrap();
        assert_eq!(parse_graph(&format_graph(&m)).unwrap(), m);
    }

    #[test]
    fn reads_from_reader() {
        let m = read_graph("1\n5".as_bytes()).unwrap();
        assert_eq!(m.as_slice(), &[5]);
    }
}
