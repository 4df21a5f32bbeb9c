//! Small dense-matrix kernel backing the OLS solver.
//!
//! Design matrices here are tiny (columns bounded by interventions + 2,
//! typically fewer than 10), so we use `nalgebra`'s dynamic matrices
//! for storage and implement Gauss-Jordan inversion with
//! partial pivoting on top. Inversion returns `None` rather than
//! erroring when no usable pivot exists: callers treat a singular
//! design as "regression infeasible" and skip, never crash.

use nalgebra::DMatrix;

use crate::constants::PIVOT_EPSILON;

/// Invert a square matrix by Gauss-Jordan elimination with partial
/// pivoting.
///
/// Rows are swapped whenever the current pivot's magnitude falls below
/// `1e-10`; if no row in the column offers a usable pivot the matrix is
/// singular and `None` is returned.
pub fn invert(m: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let n = m.nrows();
    if n == 0 || m.ncols() != n {
        return None;
    }

    // Augmented [M | I], reduced in place.
    let mut a = m.clone();
    let mut inv = DMatrix::<f64>::identity(n, n);

    for col in 0..n {
        // Find the row at or below `col` with the largest pivot.
        let mut pivot_row = col;
        let mut pivot_mag = a[(col, col)].abs();
        for row in (col + 1)..n {
            let mag = a[(row, col)].abs();
            if mag > pivot_mag {
                pivot_row = row;
                pivot_mag = mag;
            }
        }
        if pivot_mag < PIVOT_EPSILON {
            return None;
        }
        if pivot_row != col {
            a.swap_rows(pivot_row, col);
            inv.swap_rows(pivot_row, col);
        }

        // Normalize the pivot row.
        let pivot = a[(col, col)];
        for j in 0..n {
            a[(col, j)] /= pivot;
            inv[(col, j)] /= pivot;
        }

        // Eliminate the column from every other row.
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[(row, col)];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[(row, j)] -= factor * a[(col, j)];
                inv[(row, j)] -= factor * inv[(col, j)];
            }
        }
    }

    Some(inv)
}
