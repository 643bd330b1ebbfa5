//! Truncated SVD of a sparse term × document matrix
//!
//! Randomized range finder with power iterations, followed by an exact
//! eigen-decomposition of the small projected Gram matrix. No LAPACK.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::Result;
use crate::vectorizer::lsi::ColumnSource;
use crate::vectorizer::sparse::SparseVec;

/// Relative tolerance for discarding directions with no energy left
const RANK_TOL: f64 = 1e-8;
/// Upper bound on Jacobi sweeps; convergence is quadratic so this is rarely reached
const MAX_SWEEPS: usize = 64;

/// Left singular vectors and singular values, largest first
#[derive(Debug, Clone)]
pub(crate) struct Svd {
    /// num_rows × rank
    pub u: Array2<f64>,
    pub s: Vec<f64>,
}

/// Sampling knobs of the randomized decomposition
#[derive(Debug, Clone, Copy)]
pub(crate) struct SvdParams {
    pub rank: usize,
    pub extra_samples: usize,
    pub power_iters: usize,
    pub seed: u64,
    /// documents held in memory at once
    pub chunk_size: usize,
}

impl Svd {
    fn empty(num_rows: usize) -> Self {
        Svd {
            u: Array2::zeros((num_rows, 0)),
            s: Vec::new(),
        }
    }
}

/// Decompose A, where every column of `columns` is a column of A (a
/// document) and indices are row numbers below `num_rows` (terms)
///
/// The columns are streamed chunk by chunk, once per pass; only
/// `num_rows × samples` and `samples × samples` matrices stay resident.
/// Returns at most `params.rank` components; fewer when A has lower
/// numerical rank.
pub(crate) fn truncated_svd<C>(columns: &C, num_rows: usize, params: &SvdParams) -> Result<Svd>
where
    C: ColumnSource + ?Sized,
{
    let num_cols = columns.num_columns();
    let samples = (params.rank + params.extra_samples).min(num_rows).min(num_cols);
    if samples == 0 || params.rank == 0 {
        return Ok(Svd::empty(num_rows));
    }
    let chunk_size = params.chunk_size.max(1);

    // Y = A Ω, with Ω drawn one document row at a time
    let mut rng = StdRng::seed_from_u64(params.seed);
    let die = Uniform::new_inclusive(-1.0, 1.0);
    let mut y = Array2::zeros((num_rows, samples));
    columns.for_each_chunk(chunk_size, &mut |chunk: &[SparseVec<f64>]| {
        for col in chunk {
            let omega: Array1<f64> = (0..samples).map(|_| die.sample(&mut rng)).collect();
            accumulate(&mut y, col, omega.view());
        }
        Ok(())
    })?;
    let mut q = orthonormalize(y);

    // Q <- orth(A Aᵀ Q)
    for _ in 0..params.power_iters {
        if q.ncols() == 0 {
            break;
        }
        let mut y = Array2::zeros((num_rows, q.ncols()));
        columns.for_each_chunk(chunk_size, &mut |chunk: &[SparseVec<f64>]| {
            let z = project(chunk, &q);
            for (col, z_row) in chunk.iter().zip(z.rows()) {
                accumulate(&mut y, col, z_row);
            }
            Ok(())
        })?;
        q = orthonormalize(y);
    }
    if q.ncols() == 0 {
        return Ok(Svd::empty(num_rows));
    }

    // Qᵀ A Aᵀ Q = W Λ Wᵀ, so A Aᵀ ≈ (QW) Λ (QW)ᵀ
    let mut gram: Array2<f64> = Array2::zeros((q.ncols(), q.ncols()));
    columns.for_each_chunk(chunk_size, &mut |chunk: &[SparseVec<f64>]| {
        let b = project(chunk, &q);
        gram += &b.t().dot(&b);
        Ok(())
    })?;
    let (eigvals, eigvecs) = symmetric_eigen(gram);

    let mut order: Vec<usize> = (0..eigvals.len()).collect();
    order.sort_by(|&a, &b| eigvals[b].total_cmp(&eigvals[a]));
    let sigma_max = eigvals[order[0]].max(0.0).sqrt();
    let keep: Vec<usize> = order
        .into_iter()
        .filter(|&i| eigvals[i].max(0.0).sqrt() > RANK_TOL * sigma_max)
        .take(params.rank)
        .collect();

    let s = keep.iter().map(|&i| eigvals[i].max(0.0).sqrt()).collect();
    let u = q.dot(&eigvecs.select(Axis(1), &keep));
    Ok(Svd { u, s })
}

/// out += col ⊗ row
fn accumulate(out: &mut Array2<f64>, col: &SparseVec<f64>, row: ArrayView1<'_, f64>) {
    for (i, v) in col.iter() {
        if i < out.nrows() {
            out.row_mut(i).scaled_add(v, &row);
        }
    }
}

/// Cᵀ · M for a chunk of columns C, one row per column
fn project(chunk: &[SparseVec<f64>], m: &Array2<f64>) -> Array2<f64> {
    let rows: Vec<Array1<f64>> = chunk
        .par_iter()
        .map(|col| {
            let mut row = Array1::zeros(m.ncols());
            for (i, v) in col.iter() {
                if i < m.nrows() {
                    row.scaled_add(v, &m.row(i));
                }
            }
            row
        })
        .collect();
    let mut out = Array2::zeros((chunk.len(), m.ncols()));
    for (j, row) in rows.iter().enumerate() {
        out.row_mut(j).assign(row);
    }
    out
}

/// Orthonormal basis of the column space of `m` (modified Gram-Schmidt,
/// two passes), dropping columns that are numerically dependent
fn orthonormalize(m: Array2<f64>) -> Array2<f64> {
    let mut basis: Vec<Array1<f64>> = Vec::with_capacity(m.ncols());
    for col in m.columns() {
        let mut v = col.to_owned();
        let original = v.dot(&v).sqrt();
        if original == 0.0 {
            continue;
        }
        for _ in 0..2 {
            for q in &basis {
                let proj = q.dot(&v);
                v.scaled_add(-proj, q);
            }
        }
        let residual = v.dot(&v).sqrt();
        if residual <= RANK_TOL * original {
            continue;
        }
        v /= residual;
        basis.push(v);
    }
    let mut out = Array2::zeros((m.nrows(), basis.len()));
    for (j, q) in basis.iter().enumerate() {
        out.column_mut(j).assign(q);
    }
    out
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations
///
/// # Returns
/// * `Vec<f64>` - eigenvalues, unordered
/// * `Array2<f64>` - eigenvectors as columns, in the same order
fn symmetric_eigen(mut a: Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= 1e-30 * scale {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                rotate_columns(&mut a, p, q, c, s);
                rotate_rows(&mut a, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
    }
    let eigvals = a.diag().to_vec();
    (eigvals, v)
}

#[inline]
fn rotate_columns(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.nrows() {
        let (mp, mq) = (m[[k, p]], m[[k, q]]);
        m[[k, p]] = c * mp - s * mq;
        m[[k, q]] = s * mp + c * mq;
    }
}

#[inline]
fn rotate_rows(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.ncols() {
        let (mp, mq) = (m[[p, k]], m[[q, k]]);
        m[[p, k]] = c * mp - s * mq;
        m[[q, k]] = s * mp + c * mq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(rank: usize) -> SvdParams {
        SvdParams {
            rank,
            extra_samples: 10,
            power_iters: 2,
            seed: 7,
            chunk_size: 2,
        }
    }

    #[test]
    fn jacobi_diagonalizes_symmetric_matrix() {
        let m = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let (vals, vecs) = symmetric_eigen(m.clone());
        let reconstructed = m.dot(&vecs);
        for j in 0..3 {
            for i in 0..3 {
                assert!((reconstructed[[i, j]] - vals[j] * vecs[[i, j]]).abs() < 1e-10);
            }
        }
        let trace: f64 = vals.iter().sum();
        assert!((trace - 8.0).abs() < 1e-10);
    }

    #[test]
    fn orthonormalize_drops_dependent_columns() {
        let m = array![[1.0, 2.0, 0.0], [0.0, 0.0, 1.0], [1.0, 2.0, 0.0]];
        let q = orthonormalize(m);
        assert_eq!(q.ncols(), 2);
        let gram = q.t().dot(&q);
        assert!((gram[[0, 0]] - 1.0).abs() < 1e-12);
        assert!(gram[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn recovers_singular_values_of_diagonal_matrix() {
        // columns of diag(3, 2, 1)
        let columns: Vec<SparseVec<f64>> = vec![
            vec![(0, 3.0)].into_iter().collect(),
            vec![(1, 2.0)].into_iter().collect(),
            vec![(2, 1.0)].into_iter().collect(),
        ];
        let svd = truncated_svd(&columns, 3, &params(2)).unwrap();
        assert_eq!(svd.s.len(), 2);
        assert!((svd.s[0] - 3.0).abs() < 1e-9);
        assert!((svd.s[1] - 2.0).abs() < 1e-9);
        assert!((svd.u[[0, 0]].abs() - 1.0).abs() < 1e-9);
        assert!((svd.u[[1, 1]].abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rank_deficient_input_yields_fewer_components() {
        let col: SparseVec<f64> = vec![(0, 1.0), (1, 1.0)].into_iter().collect();
        let svd = truncated_svd(&vec![col.clone(), col], 4, &params(3)).unwrap();
        assert_eq!(svd.s.len(), 1);
        assert!((svd.s[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn chunking_does_not_change_the_result() {
        let columns: Vec<SparseVec<f64>> = vec![
            vec![(0, 0.8), (1, 0.6)].into_iter().collect(),
            vec![(1, 0.6), (2, 0.8)].into_iter().collect(),
            vec![(3, 1.0)].into_iter().collect(),
            vec![(0, 0.5), (3, 0.5)].into_iter().collect(),
            vec![(2, 1.0)].into_iter().collect(),
        ];
        let whole = truncated_svd(&columns, 4, &SvdParams { chunk_size: 100, ..params(3) }).unwrap();
        let one_by_one = truncated_svd(&columns, 4, &SvdParams { chunk_size: 1, ..params(3) }).unwrap();
        assert_eq!(whole.s.len(), one_by_one.s.len());
        for (a, b) in whole.s.iter().zip(&one_by_one.s) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_input_yields_no_components() {
        let svd = truncated_svd(&Vec::<SparseVec<f64>>::new(), 5, &params(3)).unwrap();
        assert!(svd.s.is_empty());
        assert_eq!(svd.u.dim(), (5, 0));
    }
}
