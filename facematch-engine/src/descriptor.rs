use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Face descriptor produced by an external embedding model.
///
/// The length is model defined (128 for the common ResNet-34 face net) and is
/// checked on every comparison rather than fixed at the type level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Descriptor {
    values: Vec<f32>,
}

impl Descriptor {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::EmptyDescriptor);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteComponent { index });
        }
        Ok(Self { values })
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.clone()
    }

    /// Borrow the components as a 1-D ndarray view.
    pub fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(self.values.as_slice())
    }

    /// Fails with `DimensionMismatch` unless `other` has the same length.
    pub fn ensure_same_dim(&self, other: &Descriptor) -> Result<()> {
        check_dim(self.dim(), other)
    }
}

pub(crate) fn check_dim(expected: usize, descriptor: &Descriptor) -> Result<()> {
    if descriptor.dim() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: descriptor.dim(),
        });
    }
    Ok(())
}

impl TryFrom<Vec<f32>> for Descriptor {
    type Error = Error;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::new(values)
    }
}

impl TryFrom<&[f32]> for Descriptor {
    type Error = Error;

    fn try_from(values: &[f32]) -> Result<Self> {
        Self::new(values.to_vec())
    }
}

impl From<Descriptor> for Vec<f32> {
    fn from(descriptor: Descriptor) -> Self {
        descriptor.values
    }
}
