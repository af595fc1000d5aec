use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_EMOTION_URL: &str = "https://sn-watson-emotion.labs.skills.network/v1/watson.runtime.nlp.v1/NlpService/EmotionPredict";
pub const DEFAULT_MODEL_ID: &str = "emotion_aggregated-workflow_lang_en_stock";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MODEL_ID_HEADER: &str = "grpc-metadata-mm-model-id";
pub const ENV_EMOTION_ENDPOINT_URL: &str = "EMOTION_ENDPOINT_URL";
pub const ENV_EMOTION_MODEL_ID: &str = "EMOTION_MODEL_ID";

/// Value sent in the model-selection header on every prediction request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelId(String);

impl ModelId {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyModelId);
        }
        if HeaderValue::from_str(&v).is_err() {
            return Err(ConfigError::InvalidModelId(v));
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self(DEFAULT_MODEL_ID.to_owned())
    }
}

/// Upper bound on one prediction request, connect through body read.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestTimeout {
    pub timeout_ms: u64,
}

impl RequestTimeout {
    pub fn new(timeout_ms: u64) -> Result<Self, ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self { timeout_ms })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RequestTimeout {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Where and how the emotion client reaches the prediction service.
///
/// Built once and handed to the client; the client never mutates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmotionServiceConfig {
    pub endpoint: Url,
    pub model_id: ModelId,
    pub timeout: RequestTimeout,
}

impl EmotionServiceConfig {
    pub fn new(
        endpoint: &str,
        model_id: ModelId,
        timeout: RequestTimeout,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            model_id,
            timeout,
        })
    }
}

impl Default for EmotionServiceConfig {
    fn default() -> Self {
        // DEFAULT_EMOTION_URL is pinned by default_config_targets_watson_emotion_predict.
        Self {
            endpoint: Url::parse(DEFAULT_EMOTION_URL).expect("default endpoint is a valid url"),
            model_id: ModelId::default(),
            timeout: RequestTimeout::default(),
        }
    }
}

/// Parses an endpoint URL, accepting only `http` and `https`.
pub fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(ConfigError::InvalidEndpoint)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_owned())),
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(url::ParseError),
    #[error("endpoint scheme must be http or https, got {0:?}")]
    UnsupportedScheme(String),
    #[error("model id must not be empty")]
    EmptyModelId,
    #[error("model id {0:?} is not a valid header value")]
    InvalidModelId(String),
    #[error("timeout must be > 0 ms")]
    ZeroTimeout,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_model_id(
    cli_value: Option<String>,
    env: &impl Env,
) -> Result<ModelId, ConfigError> {
    ModelId::new(resolve_string_with_default(
        cli_value,
        ENV_EMOTION_MODEL_ID,
        env,
        DEFAULT_MODEL_ID,
    ))
}

pub fn resolve_endpoint(cli_value: Option<String>, env: &impl Env) -> Result<Url, ConfigError> {
    parse_endpoint(&resolve_string_with_default(
        cli_value,
        ENV_EMOTION_ENDPOINT_URL,
        env,
        DEFAULT_EMOTION_URL,
    ))
}
