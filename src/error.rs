pub type BoardResult<T> = Result<T, BoardError>;

#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error("data error: {0}")]
    Data(String),

    #[error("filter syntax error: {0}")]
    FilterSyntax(String),

    #[error("unsupported chart type '{0}'")]
    UnsupportedChart(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn filter_syntax(msg: impl Into<String>) -> Self {
        Self::FilterSyntax(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
