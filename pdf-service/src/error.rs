use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

impl From<printpdf::Error> for PdfError {
    fn from(err: printpdf::Error) -> Self {
        PdfError::RenderFailed(err.to_string())
    }
}

pub type PdfResult<T> = Result<T, PdfError>;
