use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Two descriptors of different lengths were compared.
    #[error("descriptor dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("descriptor has no components")]
    EmptyDescriptor,
    #[error("descriptor component {index} is not finite")]
    NonFiniteComponent { index: usize },
}
