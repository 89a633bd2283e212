use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::{Value, Vector};

/// A dense, row-major matrix.
#[derive(Clone, Deserialize, PartialEq, Serialize)]
pub struct Matrix {
    columns: usize,
    rows: Vec<Vector>,
}

impl Matrix {
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            columns,
            rows: vec![Vector::zeros(columns); rows],
        }
    }

    pub fn from_fn(rows: usize, columns: usize, mut f: impl FnMut(usize, usize) -> Value) -> Self {
        Self {
            columns,
            rows: (0..rows)
                .map(|r| Vector::from_fn(columns, |c| f(r, c)))
                .collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector> {
        self.rows.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.rows.iter().flat_map(|row| row.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.rows.iter_mut().flat_map(|row| row.iter_mut())
    }

    /// Computes `self · v`.
    pub fn mul_vector(&self, v: &Vector) -> Vector {
        assert_eq!(
            v.len(),
            self.columns,
            "vector length must match the matrix column count",
        );
        self.rows.iter().map(|row| row.dot(v)).collect()
    }

    /// Computes `selfᵀ · v` without materializing the transpose.
    pub fn transpose_mul_vector(&self, v: &Vector) -> Vector {
        assert_eq!(
            v.len(),
            self.rows(),
            "vector length must match the matrix row count",
        );
        let mut result = Vector::zeros(self.columns);
        for (row, &scale) in self.rows.iter().zip(v.iter()) {
            for (r, &x) in result.iter_mut().zip(row.iter()) {
                *r += x * scale;
            }
        }
        result
    }

    /// Subtracts the scaled outer product `scale · u vᵀ` in place.
    pub fn sub_scaled_outer(&mut self, scale: Value, u: &Vector, v: &Vector) {
        assert_eq!(u.len(), self.rows(), "outer product row count mismatch");
        assert_eq!(v.len(), self.columns, "outer product column count mismatch");
        for (row, &a) in self.rows.iter_mut().zip(u.iter()) {
            for (w, &b) in row.iter_mut().zip(v.iter()) {
                *w -= scale * a * b;
            }
        }
    }
}

impl Index<usize> for Matrix {
    type Output = Vector;

    fn index(&self, row: usize) -> &Self::Output {
        &self.rows[row]
    }
}

impl IndexMut<usize> for Matrix {
    fn index_mut(&mut self, row: usize) -> &mut Self::Output {
        &mut self.rows[row]
    }
}

impl<const R: usize, const C: usize> From<[[Value; C]; R]> for Matrix {
    fn from(values: [[Value; C]; R]) -> Self {
        Self {
            columns: C,
            rows: values.into_iter().map(Vector::from).collect(),
        }
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for row in &self.rows {
            writeln!(f, "  {row:?}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_vector() {
        let m = Matrix::from([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let v = Vector::from([1.0, 0.0, -1.0]);

        assert_eq!(m.mul_vector(&v), Vector::from([-2.0, -2.0]));
        assert_eq!(
            m.transpose_mul_vector(&Vector::from([1.0, 2.0])),
            Vector::from([9.0, 12.0, 15.0]),
        );
    }

    #[test]
    fn outer_product_update() {
        let mut m = Matrix::zeros(2, 3);
        m.sub_scaled_outer(0.5, &Vector::from([2.0, -2.0]), &Vector::from([1.0, 2.0, 3.0]));

        assert_eq!(m, Matrix::from([[-1.0, -2.0, -3.0], [1.0, 2.0, 3.0]]));
    }

    #[test]
    fn shape() {
        let m = Matrix::from_fn(3, 4, |r, c| (r * 4 + c) as Value);
        assert_eq!((m.rows(), m.columns()), (3, 4));
        assert_eq!(m[2][3], 11.0);
        assert_eq!(m.values().count(), 12);
    }

    #[test]
    #[should_panic(expected = "column count")]
    fn mismatched_multiply_panics() {
        Matrix::zeros(2, 3).mul_vector(&Vector::zeros(2));
    }
}
