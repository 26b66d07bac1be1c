//! Index vectors and dense vector arithmetic.

use oorandom::Rand64;

use super::params::Hyperparameters;

/// Sparse ternary random vector: `(position, ±1/√nonzeros)` pairs.
pub type IndexVector = Vec<(usize, f32)>;

/// Norms below this are treated as zero.
pub const ZERO_NORM: f32 = 1e-9;

/// Deterministic index vector for a vocabulary key.
///
/// The same key, seed, dimension and sparsity always produce the same
/// vector, on every platform.
#[must_use]
pub fn index_vector(key: &str, params: &Hyperparameters) -> IndexVector {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&params.seed.to_le_bytes());
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    let mut seed = [0u8; 16];
    seed.copy_from_slice(&digest.as_bytes()[..16]);
    let mut rng = Rand64::new(u128::from_le_bytes(seed));

    let value = 1.0 / (params.nonzeros as f32).sqrt();
    let mut entries: IndexVector = Vec::with_capacity(params.nonzeros);
    while entries.len() < params.nonzeros {
        let position = rng.rand_range(0..params.dimension as u64) as usize;
        if entries.iter().any(|&(p, _)| p == position) {
            continue;
        }
        let sign = if rng.rand_u64() & 1 == 0 { value } else { -value };
        entries.push((position, sign));
    }
    entries
}

/// `dense += scale * sparse`
pub fn add_sparse(dense: &mut [f32], sparse: &[(usize, f32)], scale: f32) {
    for &(position, value) in sparse {
        dense[position] += scale * value;
    }
}

/// `dense += scale * other`
pub fn add_dense(dense: &mut [f32], other: &[f32], scale: f32) {
    for (d, o) in dense.iter_mut().zip(other) {
        *d += scale * o;
    }
}

#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[must_use]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Scales `v` to unit length. Returns `false` and leaves `v` untouched if
/// it is (numerically) zero.
pub fn normalize(v: &mut [f32]) -> bool {
    let n = norm(v);
    if !n.is_finite() || n < ZERO_NORM {
        return false;
    }
    v.iter_mut().for_each(|x| *x /= n);
    true
}

/// Cosine similarity clamped to `[-1.0, 1.0]`; zero vectors score `0.0`.
#[must_use]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if !denom.is_finite() || denom < ZERO_NORM {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_vectors_are_deterministic_and_unit_length() {
        let params = Hyperparameters::default();
        let a = index_vector("~detective", &params);
        let b = index_vector("~detective", &params);
        assert_eq!(a, b);
        assert_eq!(a.len(), params.nonzeros);

        let mut dense = vec![0.0; params.dimension];
        add_sparse(&mut dense, &a, 1.0);
        assert!((norm(&dense) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn index_vectors_depend_on_key_and_seed() {
        let params = Hyperparameters::default();
        assert_ne!(index_vector("chef", &params), index_vector("cook", &params));
        assert_ne!(
            index_vector("chef", &params),
            index_vector("chef", &params.clone().with_seed(7))
        );
    }

    #[test]
    fn positions_are_distinct_and_in_range() {
        let params = Hyperparameters::new().with_dimension(16).with_nonzeros(8);
        let v = index_vector("crowded", &params);
        let mut positions: Vec<_> = v.iter().map(|&(p, _)| p).collect();
        positions.sort_unstable();
        positions.dedup();
        assert_eq!(positions.len(), 8);
        assert!(positions.iter().all(|&p| p < 16));
    }

    #[test]
    fn cosine_conventions() {
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn normalize_refuses_zero_vector() {
        let mut zero = vec![0.0; 4];
        assert!(!normalize(&mut zero));
        let mut v = vec![3.0, 4.0];
        assert!(normalize(&mut v));
        assert!((v[0] - 0.6).abs() < 1e-6 && (v[1] - 0.8).abs() < 1e-6);
    }
}
