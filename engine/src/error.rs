use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Processor resolution error: {0}")]
    Resolution(String),
    #[error("Processor execution error: {0}")]
    Processor(String),
    #[error("Expression evaluation error: {0}")]
    Expression(String),
    #[error("Translation error: {0}")]
    Translate(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    pub fn resolution(message: impl Into<String>) -> Self {
        EngineError::Resolution(message.into())
    }

    pub fn processor(message: impl Into<String>) -> Self {
        EngineError::Processor(message.into())
    }

    pub fn expression(message: impl Into<String>) -> Self {
        EngineError::Expression(message.into())
    }

    pub fn translate(message: impl Into<String>) -> Self {
        EngineError::Translate(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument(message.into())
    }
}
