use crate::config::{EmotionServiceConfig, MODEL_ID_HEADER};
use crate::emotion::{EmotionAnalyzer, EmotionError, EmotionScores};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Client for the hosted Watson NLP `EmotionPredict` endpoint.
#[derive(Clone)]
pub struct WatsonEmotionClient {
    client: Client,
    config: EmotionServiceConfig,
}

impl WatsonEmotionClient {
    pub fn new(config: EmotionServiceConfig) -> Result<Self, EmotionError> {
        let client = Client::builder()
            .timeout(config.timeout.duration())
            .build()
            .map_err(EmotionError::Client)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: EmotionServiceConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &EmotionServiceConfig {
        &self.config
    }
}

#[derive(Serialize)]
struct EmotionPredictRequest<'a> {
    raw_document: RawDocument<'a>,
}

#[derive(Serialize)]
struct RawDocument<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmotionPredictResponse {
    #[serde(default)]
    document: Option<PredictedDocument>,
}

#[derive(Deserialize)]
struct PredictedDocument {
    #[serde(default)]
    emotion: Option<EmotionPrediction>,
}

#[derive(Deserialize, Default)]
struct EmotionPrediction {
    #[serde(default)]
    anger: Option<f64>,
    #[serde(default)]
    disgust: Option<f64>,
    #[serde(default)]
    fear: Option<f64>,
    #[serde(default)]
    joy: Option<f64>,
    #[serde(default)]
    sadness: Option<f64>,
}

impl EmotionPredictResponse {
    fn into_scores(self) -> EmotionScores {
        let e = self
            .document
            .and_then(|d| d.emotion)
            .unwrap_or_default();
        EmotionScores::from_scores(e.anger, e.disgust, e.fear, e.joy, e.sadness)
    }
}

pub(crate) fn parse_response(body: &str) -> Result<EmotionScores, EmotionError> {
    let response: EmotionPredictResponse = serde_json::from_str(body)
        .map_err(|e| EmotionError::InvalidResponse(format!("failed to parse JSON: {e}")))?;
    Ok(response.into_scores())
}

impl EmotionAnalyzer for WatsonEmotionClient {
    fn try_analyze(&self, text: String) -> BoxFuture<'_, Result<EmotionScores, EmotionError>> {
        async move {
            if text.trim().is_empty() {
                return Err(EmotionError::BlankInput);
            }

            let request = EmotionPredictRequest {
                raw_document: RawDocument { text: &text },
            };

            debug!(endpoint = %self.config.endpoint, chars = text.chars().count(), "sending emotion predict request");

            let response = self
                .client
                .post(self.config.endpoint.clone())
                .header(MODEL_ID_HEADER, self.config.model_id.as_str())
                .timeout(self.config.timeout.duration())
                .json(&request)
                .send()
                .await
                .map_err(EmotionError::Transport)?;

            let status = response.status();
            if status == StatusCode::BAD_REQUEST {
                return Err(EmotionError::UnprocessableInput);
            }
            if !status.is_success() {
                return Err(EmotionError::ServiceStatus(status.as_u16()));
            }

            let body = response.text().await.map_err(EmotionError::Transport)?;
            let scores = parse_response(&body)?;

            debug!(
                dominant = scores.dominant_emotion.map(|e| e.as_str()),
                "emotion predict response decoded"
            );

            Ok(scores)
        }
        .boxed()
    }
}
