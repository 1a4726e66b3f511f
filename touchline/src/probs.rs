//! Utilities for working with probabilities.

use crate::linear::matrix::Matrix;

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn normalise(&mut self, target: f64) -> f64;
    fn scale(&mut self, factor: f64);
    fn inverted(&self) -> Vec<f64>;
    fn argmax(&self) -> Option<usize>;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    /// Scales the elements so that they add up to `target`, returning the sum prior to scaling.
    /// A zero-sum slice is left untouched.
    fn normalise(&mut self, target: f64) -> f64 {
        let sum = self.sum();
        if sum > 0.0 {
            self.scale(target / sum);
        }
        sum
    }

    fn scale(&mut self, factor: f64) {
        for element in self {
            *element *= factor;
        }
    }

    fn inverted(&self) -> Vec<f64> {
        self.iter().map(|element| 1.0 / element).collect()
    }

    /// Index of the largest element, favouring the earliest on ties.
    fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &element) in self.iter().enumerate() {
            match best {
                Some((_, max)) if element <= max => {}
                _ => best = Some((index, element)),
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Sum of all cells of a matrix satisfying `filter(row, col)`.
pub fn gather(matrix: &Matrix<f64>, mut filter: impl FnMut(usize, usize) -> bool) -> f64 {
    matrix
        .cells()
        .filter(|(row, col, _)| filter(*row, *col))
        .map(|(_, _, &prob)| prob)
        .sum()
}

/// Rounds to the given number of decimal places.
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use touchline_testing::assert_slice_f64_near;

    use super::*;

    #[test]
    fn sum() {
        let data = [0.0, 0.1, 0.2];
        assert_f64_near!(0.30000000000000004, data.sum(), 1);
    }

    #[test]
    fn normalise() {
        let mut data = [0.05, 0.1, 0.15, 0.2];
        let sum = data.normalise(1.0);
        assert_f64_near!(0.5, sum, 1);
        assert_slice_f64_near(&[0.1, 0.2, 0.3, 0.4], &data, 1);
    }

    #[test]
    fn normalise_zero_sum() {
        let mut data = [0.0, 0.0];
        assert_eq!(0.0, data.normalise(1.0));
        assert_eq!([0.0, 0.0], data);
    }

    #[test]
    fn inverted() {
        assert_slice_f64_near(&[0.5, 0.25], &[2.0, 4.0].inverted(), 1);
    }

    #[test]
    fn argmax() {
        assert_eq!(Some(2), [0.1, 0.2, 0.5, 0.2].argmax());
        assert_eq!(Some(0), [0.3, 0.3].argmax());
        assert_eq!(None, Vec::<f64>::new().argmax());
    }

    #[test]
    fn gather_diagonal() {
        let mut matrix = Matrix::allocate(2, 2);
        matrix[0].copy_from_slice(&[0.1, 0.2]);
        matrix[1].copy_from_slice(&[0.3, 0.4]);
        assert_float_absolute_eq!(0.5, gather(&matrix, |row, col| row == col));
        assert_float_absolute_eq!(0.3, gather(&matrix, |row, col| row > col));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(33.33, round_to(33.3333, 2));
        assert_eq!(66.67, round_to(66.6666, 2));
        assert_eq!(1.0, round_to(0.96, 1));
    }
}
