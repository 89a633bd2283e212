use std::fmt;
use std::ops::{
    Add, AddAssign, Deref, DerefMut, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign,
};

use serde::{Deserialize, Serialize};

use super::{Value, ValueType};

#[repr(transparent)]
#[derive(Clone, Default, Deserialize, PartialEq, Serialize)]
pub struct Vector(Vec<Value>);

impl Vector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![Value::ZERO; len])
    }

    pub fn ones(len: usize) -> Self {
        Self(vec![Value::ONE; len])
    }

    pub fn from_fn(len: usize, f: impl FnMut(usize) -> Value) -> Self {
        Self((0..len).map(f).collect())
    }

    pub fn dot(&self, b: &Self) -> Value {
        assert_eq!(self.len(), b.len(), "dot product of mismatched vectors");
        self.iter().zip(b.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn sum(&self) -> Value {
        self.iter().sum()
    }

    /// The arithmetic mean of the elements, or zero for an empty vector.
    pub fn mean(&self) -> Value {
        if self.is_empty() {
            Value::ZERO
        } else {
            self.sum() / self.len() as Value
        }
    }

    /// Returns the index and value of the largest element. The first maximum wins ties.
    pub fn argmax(&self) -> Option<(usize, Value)> {
        self.iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, x)| match best {
                Some((_, b)) if b >= x => best,
                _ => Some((i, x)),
            })
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

macro_rules! op_impl {
    ($op:ident, $op_method:ident, $op_assign:ident, $op_assign_method:ident) => {
        impl $op<Value> for Vector {
            type Output = Vector;

            fn $op_method(mut self, rhs: Value) -> Self::Output {
                self.$op_assign_method(rhs);
                self
            }
        }

        impl $op<Value> for &Vector {
            type Output = Vector;

            fn $op_method(self, rhs: Value) -> Self::Output {
                self.clone().$op_method(rhs)
            }
        }

        impl $op<Vector> for Vector {
            type Output = Vector;

            fn $op_method(mut self, rhs: Vector) -> Self::Output {
                self.$op_assign_method(&rhs);
                self
            }
        }

        impl $op<&Vector> for Vector {
            type Output = Vector;

            fn $op_method(mut self, rhs: &Vector) -> Self::Output {
                self.$op_assign_method(rhs);
                self
            }
        }

        impl $op<&Vector> for &Vector {
            type Output = Vector;

            fn $op_method(self, rhs: &Vector) -> Self::Output {
                self.clone().$op_method(rhs)
            }
        }

        impl $op_assign<Value> for Vector {
            fn $op_assign_method(&mut self, rhs: Value) {
                for r in self.iter_mut() {
                    (*r).$op_assign_method(rhs)
                }
            }
        }

        impl $op_assign<&Vector> for Vector {
            fn $op_assign_method(&mut self, rhs: &Vector) {
                assert_eq!(
                    self.len(),
                    rhs.len(),
                    concat!("mismatched vector lengths in ", stringify!($op_method)),
                );
                for (r, b) in self.iter_mut().zip(rhs.iter()) {
                    (*r).$op_assign_method(*b)
                }
            }
        }
    };
}

op_impl!(Add, add, AddAssign, add_assign);
op_impl!(Sub, sub, SubAssign, sub_assign);
op_impl!(Mul, mul, MulAssign, mul_assign);
op_impl!(Div, div, DivAssign, div_assign);

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Self::Output {
        self * -Value::ONE
    }
}

impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Self::Output {
        self * -Value::ONE
    }
}

impl Deref for Vector {
    type Target = [Value];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Vector {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Value>> for Vector {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[Value; N]> for Vector {
    fn from(values: [Value; N]) -> Self {
        Self(values.to_vec())
    }
}

impl FromIterator<Value> for Vector {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Vector {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut Vector {
    type Item = &'a mut Value;
    type IntoIter = std::slice::IterMut<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, x) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            x.fmt(f)?;
        }
        write!(f, "]")
    }
}
