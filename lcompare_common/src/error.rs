use thiserror::Error;

#[derive(Error, Debug)]
pub enum LCompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is not opened: {0}")]
    NotOpened(String),

    #[error("invalid directive: {0}")]
    Format(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("invalid row length: {0}")]
    InvalidRowLength(String),

    #[error("invalid header title: {0}")]
    InvalidHeaderTitle(String),

    #[error("invalid column length: {0}")]
    InvalidColumnLength(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, LCompareError>;
