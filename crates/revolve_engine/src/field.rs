//! Numeric arrays exchanged between checkpoints and codecs.

use crate::compression::CompressionError;

/// Dense row-major `f64` array with an explicit shape.
///
/// A `Field` is what a [`Checkpoint`](crate::Checkpoint) produces on save and
/// consumes on load, and what every codec compresses. The shape is carried
/// along so that decompression can rebuild an array of the same layout.
///
/// # Examples
///
/// ```
/// use revolve_engine::Field;
///
/// let field = Field::zeros(vec![10, 10]);
/// assert_eq!(field.len(), 100);
/// assert_eq!(field.shape(), &[10, 10]);
///
/// let bad = Field::new(vec![2, 3], vec![0.0; 5]);
/// assert!(bad.is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl Field {
    /// Creates a field, checking that `shape` describes `values.len()` elements.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::ShapeMismatch`] if the product of `shape`
    /// differs from the number of values.
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, CompressionError> {
        let expected = element_count(&shape);
        if expected != Some(values.len()) {
            return Err(CompressionError::ShapeMismatch {
                shape,
                len: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// Creates a field filled with `value`.
    pub fn filled(shape: Vec<usize>, value: f64) -> Self {
        let len = element_count(&shape).unwrap_or(0);
        Self {
            shape,
            values: vec![value; len],
        }
    }

    /// Creates a field filled with zeros.
    #[inline]
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::filled(shape, 0.0)
    }

    /// Creates a one-dimensional field from a vector.
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            values,
        }
    }

    /// Shape of the field.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Values in row-major order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable values in row-major order.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the field holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Adds `delta` to every element.
    pub fn add_scalar(&mut self, delta: f64) {
        self.values.iter_mut().for_each(|v| *v += delta);
    }

    /// Largest absolute element-wise difference to `other`.
    ///
    /// Returns `None` if the shapes differ.
    pub fn max_abs_diff(&self, other: &Field) -> Option<f64> {
        if self.shape != other.shape {
            return None;
        }
        Some(
            self.values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }

    /// Approximate memory footprint in bytes.
    pub fn memory_size(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
            + self.shape.len() * std::mem::size_of::<usize>()
    }
}

/// Product of the dimensions, `None` on overflow.
pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_new_valid() {
        let field = Field::new(vec![2, 3], vec![1.0; 6]).unwrap();
        assert_eq!(field.len(), 6);
        assert!(!field.is_empty());
    }

    #[test]
    fn test_field_scalar_shape() {
        // The empty shape describes a single element.
        let field = Field::new(vec![], vec![4.0]).unwrap();
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_field_shape_mismatch() {
        let err = Field::new(vec![4], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, CompressionError::ShapeMismatch { len: 3, .. }));
    }

    #[test]
    fn test_add_scalar_and_diff() {
        let mut field = Field::zeros(vec![3, 2]);
        field.add_scalar(2.5);
        let reference = Field::filled(vec![3, 2], 2.0);
        assert_eq!(field.max_abs_diff(&reference), Some(0.5));
        assert_eq!(field.max_abs_diff(&Field::zeros(vec![6])), None);
    }

    #[test]
    fn test_memory_size() {
        let field = Field::zeros(vec![10, 10]);
        assert_eq!(field.memory_size(), 100 * 8 + 2 * std::mem::size_of::<usize>());
    }
}
