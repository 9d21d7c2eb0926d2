#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("Argument #{index} is missing")]
    MissingArgument { index: usize },
    #[error("Argument #{index} has incorrect type, expected: {expected}")]
    IncorrectArgument { index: usize, expected: &'static str },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
