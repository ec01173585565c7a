use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to render. Original error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Invalid URL: {0}.")]
    UrlError(#[from] url::ParseError),
}

/// Convenience type alias for Results with this crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The text shown in place of output when rendering degrades to a message.
    ///
    /// Engine errors surface the engine's own message; everything else uses
    /// the error's display form.
    pub fn render_message(&self) -> String {
        match self {
            Error::TemplateError(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}
