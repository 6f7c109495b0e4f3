//! Vector helpers for centroid-based cluster measurements.
//! All functions assume the caller already checked that vectors share one dimensionality.

/// Euclidean (L2) distance between two vectors.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Calculate centroid (element-wise mean) of multiple vectors.
///
/// Returns `None` for an empty set, where the mean is undefined.
pub fn calculate_centroid<'a, I>(vectors: I) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut iter = vectors.into_iter();
    let mut centroid = iter.next()?.to_vec();
    let mut n = 1usize;

    for vector in iter {
        for (acc, val) in centroid.iter_mut().zip(vector.iter()) {
            *acc += val;
        }
        n += 1;
    }

    let n = n as f64;
    for val in centroid.iter_mut() {
        *val /= n;
    }

    Some(centroid)
}

/// Mean of the Euclidean distances from each vector to `center`.
///
/// This is a dispersion radius (mean of distances), not a variance.
/// Returns `None` for an empty set.
pub fn mean_distance_to<'a, I>(vectors: I, center: &[f64]) -> Option<f64>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut total = 0.0;
    let mut n = 0usize;
    for vector in vectors {
        total += euclidean_distance(vector, center);
        n += 1;
    }

    if n == 0 {
        return None;
    }
    Some(total / n as f64)
}
