mod analyzer;
mod watson;


use serde::{Deserialize, Serialize};
use std::fmt;

pub use analyzer::{EmotionAnalyzer, EmotionError};
pub use watson::WatsonEmotionClient;

/// The five labels scored by the prediction service, in declaration order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger,
    Disgust,
    Fear,
    Joy,
    Sadness,
}

impl Emotion {
    /// Declaration order; also the tie-break order for the dominant label.
    pub const ALL: [Emotion; 5] = [
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Joy,
        Emotion::Sadness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat score record returned by an analysis.
///
/// Every field is `None` when the text was blank or the service could not
/// produce an answer. An individual score is `None` when the service left it
/// out of an otherwise valid response.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EmotionScores {
    pub anger: Option<f64>,
    pub disgust: Option<f64>,
    pub fear: Option<f64>,
    pub joy: Option<f64>,
    pub sadness: Option<f64>,
    pub dominant_emotion: Option<Emotion>,
}

impl EmotionScores {
    /// The "no opinion" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a record from raw scores and fills in the dominant label.
    pub fn from_scores(
        anger: Option<f64>,
        disgust: Option<f64>,
        fear: Option<f64>,
        joy: Option<f64>,
        sadness: Option<f64>,
    ) -> Self {
        let mut scores = Self {
            anger,
            disgust,
            fear,
            joy,
            sadness,
            dominant_emotion: None,
        };
        scores.dominant_emotion = dominant_emotion(&scores);
        scores
    }

    pub fn score(&self, emotion: Emotion) -> Option<f64> {
        match emotion {
            Emotion::Anger => self.anger,
            Emotion::Disgust => self.disgust,
            Emotion::Fear => self.fear,
            Emotion::Joy => self.joy,
            Emotion::Sadness => self.sadness,
        }
    }

    pub fn is_empty(&self) -> bool {
        Emotion::ALL.iter().all(|e| self.score(*e).is_none()) && self.dominant_emotion.is_none()
    }
}

/// Label with the highest present score; earlier labels win ties.
pub fn dominant_emotion(scores: &EmotionScores) -> Option<Emotion> {
    let mut best: Option<(Emotion, f64)> = None;
    for emotion in Emotion::ALL {
        let Some(value) = scores.score(emotion) else {
            continue;
        };
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((emotion, value)),
        }
    }
    best.map(|(emotion, _)| emotion)
}
