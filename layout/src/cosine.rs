//! Cosine geometry over raw embeddings.
//!
//! All accumulation happens in f64 regardless of the f32 storage type.

/// Cosine distance: 1 - cosine_similarity, in `[0, 2]`.
///
/// Returns 2.0 on dimension mismatch and 1.0 when either vector is zero.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 2.0;
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let x = x as f64;
        let y = y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    // Clamp to [-1, 1] to absorb rounding.
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    1.0 - similarity
}

/// Component-wise mean of the given vectors. Empty input yields `dim` zeros.
pub fn mean_embedding<'a, I>(vectors: I, dim: usize) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum = vec![0.0f64; dim];
    let mut n = 0usize;
    for v in vectors {
        for (acc, &x) in sum.iter_mut().zip(v) {
            *acc += x as f64;
        }
        n += 1;
    }
    if n == 0 {
        return vec![0.0; dim];
    }
    sum.into_iter().map(|s| (s / n as f64) as f32).collect()
}

/// Dispersion of the vectors around their mean direction.
///
/// Defined as `1 - |mean(unit(v))|^2`, the mean squared distance of the
/// unit vectors from their own mean. 0 for a single vector or identical
/// directions, at most 1. Zero vectors have no direction and are skipped.
pub fn dispersion<'a, I>(vectors: I, dim: usize) -> f64
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum = vec![0.0f64; dim];
    let mut n = 0usize;
    for v in vectors {
        let norm = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (acc, &x) in sum.iter_mut().zip(v) {
            *acc += x as f64 / norm;
        }
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }
    let mean_sq: f64 = sum.iter().map(|s| (s / n as f64).powi(2)).sum();
    (1.0 - mean_sq).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        let d = cosine_distance(&[1.0, 0.0, 0.0], &[2.0, 0.0, 0.0]);
        assert!(d.abs() < 1e-9, "identical: got {d}");
    }

    #[test]
    fn test_orthogonal() {
        let d = cosine_distance(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!((d - 1.0).abs() < 1e-9, "orthogonal: got {d}");
    }

    #[test]
    fn test_opposite() {
        let d = cosine_distance(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((d - 2.0).abs() < 1e-9, "opposite: got {d}");
    }

    #[test]
    fn test_zero_vector_is_orthogonal() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 2.0);
    }

    #[test]
    fn test_mean_of_vectors() {
        let a = [1.0f32, 0.0];
        let b = [0.0f32, 3.0];
        let m = mean_embedding([&a[..], &b[..]], 2);
        assert_eq!(m, vec![0.5, 1.5]);
        assert_eq!(mean_embedding(std::iter::empty::<&[f32]>(), 3), vec![0.0; 3]);
    }

    #[test]
    fn test_dispersion_bounds() {
        let a = [1.0f32, 0.0];
        let b = [5.0f32, 0.0];
        assert!(dispersion([&a[..], &b[..]], 2).abs() < 1e-12);
        assert!(dispersion([&a[..]], 2).abs() < 1e-12);

        // Two orthogonal unit vectors: mean is (0.5, 0.5), |mean|^2 = 0.5.
        let c = [0.0f32, 1.0];
        assert!((dispersion([&a[..], &c[..]], 2) - 0.5).abs() < 1e-12);

        // Opposite directions cancel completely.
        let d = [-1.0f32, 0.0];
        assert!((dispersion([&a[..], &d[..]], 2) - 1.0).abs() < 1e-12);

        let z = [0.0f32, 0.0];
        assert_eq!(dispersion([&z[..]], 2), 0.0);
        assert!(dispersion([&a[..], &z[..]], 2).abs() < 1e-12);
    }
}
