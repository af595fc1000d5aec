use crate::emotion::EmotionScores;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum EmotionError {
    #[error("input text is blank")]
    BlankInput,
    #[error("service rejected the input as unprocessable (HTTP 400)")]
    UnprocessableInput,
    #[error("request to emotion service failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("emotion service returned HTTP {0}")]
    ServiceStatus(u16),
    #[error("invalid response from emotion service: {0}")]
    InvalidResponse(String),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl EmotionError {
    /// Whether the failure is about the input rather than the service.
    pub fn is_input_error(&self) -> bool {
        matches!(self, EmotionError::BlankInput | EmotionError::UnprocessableInput)
    }
}

pub trait EmotionAnalyzer: Send + Sync {
    fn try_analyze(&self, text: String) -> BoxFuture<'_, Result<EmotionScores, EmotionError>>;

    /// Like [`EmotionAnalyzer::try_analyze`], but every failure collapses into
    /// [`EmotionScores::empty`].
    fn analyze(&self, text: String) -> BoxFuture<'_, EmotionScores> {
        self.try_analyze(text)
            .map(|result| match result {
                Ok(scores) => scores,
                Err(e) if e.is_input_error() => {
                    debug!(error = %e, "no emotion scores for input");
                    EmotionScores::empty()
                }
                Err(e) => {
                    warn!(error = %e, "emotion analysis failed, returning empty scores");
                    EmotionScores::empty()
                }
            })
            .boxed()
    }
}
