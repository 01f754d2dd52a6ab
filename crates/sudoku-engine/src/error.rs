use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("board must have 81 cells, got {0}")]
    InvalidLength(usize),

    #[error("invalid character '{ch}' at cell {index}")]
    InvalidCharacter { ch: char, index: usize },

    #[error("cell index {0} out of range")]
    InvalidIndex(usize),

    #[error("invalid value {value} at cell {index}")]
    InvalidValue { value: u8, index: usize },

    #[error("board has conflicting clues at cells {0:?}")]
    Conflicting(Vec<usize>),

    #[error("board has no solution")]
    Unsolvable,
}

pub type Result<T> = std::result::Result<T, EngineError>;
