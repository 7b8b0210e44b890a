/// Run-length encoded `f64` vector.
///
/// Operator vectors are mostly long runs of one value (1.0 in vacuum,
/// 0.0 around conductors), so they are stored as `(value, count)` runs.
/// Values compare bitwise, so `-0.0` and `0.0` form separate runs and NaNs
/// survive unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompressedVector {
    runs: Vec<(f64, usize)>,
    len: usize,
}

impl CompressedVector {
    /// Encodes a slice.
    #[must_use]
    pub fn compress(values: &[f64]) -> Self {
        let mut runs: Vec<(f64, usize)> = Vec::new();
        for &value in values {
            match runs.last_mut() {
                Some((last, count)) if last.to_bits() == value.to_bits() => *count += 1,
                _ => runs.push((value, 1)),
            }
        }
        Self {
            runs,
            len: values.len(),
        }
    }

    /// Expands back into a plain vector.
    #[must_use]
    pub fn decompress(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.len);
        for &(value, count) in &self.runs {
            values.extend(std::iter::repeat(value).take(count));
        }
        values
    }

    /// Value at `index`, walking the runs.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        let mut start = 0;
        for &(value, count) in &self.runs {
            if index < start + count {
                return Some(value);
            }
            start += count;
        }
        None
    }

    /// Number of encoded values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_collapse_repeats() {
        let values = [1.0, 1.0, 1.0, 0.0, 0.0, 2.5, 1.0];
        let packed = CompressedVector::compress(&values);
        assert_eq!(packed.run_count(), 4);
        assert_eq!(packed.len(), 7);
        assert_eq!(packed.decompress(), values.to_vec());
        assert_eq!(packed.get(4), Some(0.0));
        assert_eq!(packed.get(6), Some(1.0));
        assert_eq!(packed.get(7), None);
    }

    #[test]
    fn signed_zeros_stay_apart() {
        let packed = CompressedVector::compress(&[0.0, -0.0, -0.0]);
        assert_eq!(packed.run_count(), 2);
        assert!(packed.decompress()[1].is_sign_negative());
    }

    #[test]
    fn empty_vector() {
        let packed = CompressedVector::compress(&[]);
        assert!(packed.is_empty());
        assert!(packed.decompress().is_empty());
        assert_eq!(packed.get(0), None);
    }
}
