use crate::error::TrackError::{self, LapjvError};
use nalgebra::DMatrix;

/* -----------------------------------------------------------------------------
 * lapjv.rs - rectangular linear assignment by shortest augmenting paths
 * -----------------------------------------------------------------------------
 * Jonker-Volgenant style dual ascent: every row is inserted in turn and the
 * cheapest augmenting path in reduced costs is grown Dijkstra-fashion from it.
 * The dual potentials `u` (rows) and `v` (columns) keep every reduced cost
 * non-negative, so the final matching is optimal among all matchings of
 * cardinality min(rows, cols).
 * ----------------------------------------------------------------------------- */

/// Solution of an assignment problem.
///
/// `x[i]` is the column assigned to row `i`, `y[j]` the row assigned to
/// column `j`; `None` means the row or column is left open.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LapSolution {
    pub x: Vec<Option<usize>>,
    pub y: Vec<Option<usize>>,
}

impl LapSolution {
    fn unassigned(n_rows: usize, n_cols: usize) -> Self {
        Self {
            x: vec![None; n_rows],
            y: vec![None; n_cols],
        }
    }

    pub(crate) fn total_cost(&self, cost: &DMatrix<f64>) -> f64 {
        self.x
            .iter()
            .enumerate()
            .filter_map(|(i, j)| j.map(|j| cost[(i, j)]))
            .sum()
    }
}

/// Minimum-cost assignment for a rectangular cost matrix.
///
/// Exactly `min(rows, cols)` pairs are produced. An empty matrix yields an
/// all-open solution; a non-finite entry is rejected.
pub(crate) fn lapjv(cost: &DMatrix<f64>) -> Result<LapSolution, TrackError> {
    let (n_rows, n_cols) = cost.shape();
    if n_rows == 0 || n_cols == 0 {
        return Ok(LapSolution::unassigned(n_rows, n_cols));
    }
    if let Some(bad) = cost.iter().find(|c| !c.is_finite()) {
        return Err(LapjvError(format!(
            "cost matrix must be finite, found {}",
            bad
        )));
    }

    // The solver below inserts rows, so it needs rows <= cols.
    if n_rows <= n_cols {
        let col_owner = augment_rows(cost)?;
        Ok(solution_from_owners(&col_owner, n_rows, n_cols))
    } else {
        let transposed = cost.transpose();
        let row_owner = augment_rows(&transposed)?;
        let flipped = solution_from_owners(&row_owner, n_cols, n_rows);
        Ok(LapSolution {
            x: flipped.y,
            y: flipped.x,
        })
    }
}

/// Returns, for every column (1-based slot, slot 0 is the virtual root), the
/// 1-based row that owns it or 0.
fn augment_rows(cost: &DMatrix<f64>) -> Result<Vec<usize>, TrackError> {
    let (n, m) = cost.shape();
    debug_assert!(n <= m, "augment_rows needs rows <= cols");

    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    let mut owner = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];
    let mut minv = vec![f64::INFINITY; m + 1];
    let mut used = vec![false; m + 1];

    for row in 1..=n {
        owner[0] = row;
        let mut j0 = 0usize;
        minv.fill(f64::INFINITY);
        used.fill(false);

        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            if j1 == 0 {
                return Err(LapjvError(format!(
                    "no augmenting path found for row {}",
                    row - 1
                )));
            }

            for j in 0..=m {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }

        // flip the alternating path back to the root
        while j0 != 0 {
            let prev = way[j0];
            owner[j0] = owner[prev];
            j0 = prev;
        }
    }

    Ok(owner)
}

fn solution_from_owners(
    owner: &[usize],
    n_rows: usize,
    n_cols: usize,
) -> LapSolution {
    let mut solution = LapSolution::unassigned(n_rows, n_cols);
    for (slot, &row) in owner.iter().enumerate().skip(1) {
        if row != 0 {
            solution.x[row - 1] = Some(slot - 1);
            solution.y[slot - 1] = Some(row - 1);
        }
    }
    solution
}
