#![deny(warnings)]

use anyhow::Context;
use clap::{Parser, ValueEnum};
use emotion_detector_core::config::{
    resolve_endpoint, resolve_model_id, Env, EmotionServiceConfig, RequestTimeout, StdEnv,
    DEFAULT_TIMEOUT_MS,
};
use emotion_detector_core::emotion::{EmotionAnalyzer, EmotionScores, WatsonEmotionClient};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "emotion-detector")]
#[command(about = "Score text for anger, disgust, fear, joy and sadness via Watson NLP")]
struct Args {
    /// Text to analyze; reads one text per stdin line when omitted.
    #[arg(long)]
    text: Option<String>,

    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long)]
    model_id: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(&args, &env)?;

    tracing::info!(
        endpoint = %cfg.endpoint,
        model_id = cfg.model_id.as_str(),
        timeout_ms = cfg.timeout.timeout_ms,
        "config loaded"
    );

    let client = WatsonEmotionClient::new(cfg).context("failed to create emotion client")?;

    let mut out = std::io::stdout();
    match args.text {
        Some(text) => {
            let scores = client.analyze(text).await;
            write_scores(&mut out, &scores, args.format)?;
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            let analyzed = run_lines(&client, stdin, args.format, &mut out).await?;
            tracing::debug!(lines = analyzed, "stdin exhausted");
        }
    }

    Ok(())
}

/// Analyzes each input line in turn, one request per line, writing one result line each.
async fn run_lines<A, R, W>(
    analyzer: &A,
    input: R,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<usize>
where
    A: EmotionAnalyzer + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut analyzed = 0;
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        let scores = analyzer.analyze(line).await;
        write_scores(out, &scores, format)?;
        analyzed += 1;
    }
    Ok(analyzed)
}

fn write_scores(
    out: &mut impl Write,
    scores: &EmotionScores,
    format: OutputFormat,
) -> anyhow::Result<()> {
    writeln!(out, "{}", render(scores, format)?).context("failed to write output")
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(args: &Args, env: &impl Env) -> anyhow::Result<EmotionServiceConfig> {
    Ok(EmotionServiceConfig {
        endpoint: resolve_endpoint(args.endpoint.clone(), env)?,
        model_id: resolve_model_id(args.model_id.clone(), env)?,
        timeout: RequestTimeout::new(args.timeout_ms)?,
    })
}

fn render(scores: &EmotionScores, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(scores).context("failed to serialize scores"),
        OutputFormat::Text => Ok(render_text(scores)),
    }
}

fn render_text(scores: &EmotionScores) -> String {
    let Some(dominant) = scores.dominant_emotion else {
        return "Invalid text! Please try again!".to_owned();
    };
    let fmt_score = |s: Option<f64>| s.map_or_else(|| "None".to_owned(), |v| v.to_string());
    format!(
        "For the given statement, the system response is 'anger': {}, 'disgust': {}, 'fear': {}, 'joy': {} and 'sadness': {}. The dominant emotion is {}.",
        fmt_score(scores.anger),
        fmt_score(scores.disgust),
        fmt_score(scores.fear),
        fmt_score(scores.joy),
        fmt_score(scores.sadness),
        dominant,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use emotion_detector_core::config::{
        MapEnv, DEFAULT_MODEL_ID, ENV_EMOTION_ENDPOINT_URL, ENV_EMOTION_MODEL_ID,
    };
    use emotion_detector_core::emotion::EmotionError;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores every non-blank text as joy and counts calls.
    #[derive(Default)]
    struct JoyfulAnalyzer {
        calls: AtomicUsize,
    }

    impl EmotionAnalyzer for JoyfulAnalyzer {
        fn try_analyze(&self, text: String) -> BoxFuture<'_, Result<EmotionScores, EmotionError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if text.trim().is_empty() {
                    return Err(EmotionError::BlankInput);
                }
                Ok(EmotionScores::from_scores(Some(0.01), Some(0.02), Some(0.03), Some(0.9), Some(0.04)))
            }
            .boxed()
        }
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["emotion-detector"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn config_defaults_to_watson_endpoint() {
        let cfg = build_config(&args(&[]), &MapEnv::default()).expect("valid config");
        assert_eq!(cfg, EmotionServiceConfig::default());
    }

    #[test]
    fn config_reads_env_overrides() {
        let env = MapEnv::default()
            .with_var(ENV_EMOTION_ENDPOINT_URL, "http://localhost:9000/predict")
            .with_var(ENV_EMOTION_MODEL_ID, "emotion_custom");
        let cfg = build_config(&args(&["--timeout-ms", "500"]), &env).expect("valid config");
        assert_eq!(cfg.endpoint.as_str(), "http://localhost:9000/predict");
        assert_eq!(cfg.model_id.as_str(), "emotion_custom");
        assert_eq!(cfg.timeout.timeout_ms, 500);
    }

    #[test]
    fn config_rejects_zero_timeout() {
        assert!(build_config(&args(&["--timeout-ms", "0"]), &MapEnv::default()).is_err());
    }

    #[test]
    fn cli_model_id_wins_over_env() {
        let env = MapEnv::default().with_var(ENV_EMOTION_MODEL_ID, "from-env");
        let cfg = build_config(&args(&["--model-id", DEFAULT_MODEL_ID]), &env).expect("valid");
        assert_eq!(cfg.model_id.as_str(), DEFAULT_MODEL_ID);
    }

    #[test]
    fn text_output_names_dominant_emotion() {
        let scores = EmotionScores::from_scores(Some(0.01), Some(0.02), Some(0.03), Some(0.9), Some(0.04));
        assert_eq!(
            render_text(&scores),
            "For the given statement, the system response is 'anger': 0.01, 'disgust': 0.02, 'fear': 0.03, 'joy': 0.9 and 'sadness': 0.04. The dominant emotion is joy."
        );
    }

    #[test]
    fn text_output_for_empty_scores() {
        assert_eq!(
            render_text(&EmotionScores::empty()),
            "Invalid text! Please try again!"
        );
    }

    #[test]
    fn json_output_keeps_nulls() {
        let out = render(&EmotionScores::empty(), OutputFormat::Json).expect("json");
        assert_eq!(
            out,
            r#"{"anger":null,"disgust":null,"fear":null,"joy":null,"sadness":null,"dominant_emotion":null}"#
        );
    }

    #[tokio::test]
    async fn each_input_line_gets_one_output_line() {
        let analyzer = JoyfulAnalyzer::default();
        let input: &[u8] = b"I am thrilled\n\n   \nso happy today";
        let mut out = Vec::new();

        let analyzed = run_lines(&analyzer, input, OutputFormat::Text, &mut out)
            .await
            .expect("run");

        assert_eq!(analyzed, 4);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 4);
        let out = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("The dominant emotion is joy."));
        assert_eq!(lines[1], "Invalid text! Please try again!");
        assert_eq!(lines[2], "Invalid text! Please try again!");
        assert!(lines[3].ends_with("The dominant emotion is joy."));
    }

    #[tokio::test]
    async fn json_lines_mode_writes_one_object_per_line() {
        let analyzer = JoyfulAnalyzer::default();
        let input: &[u8] = b"first\n\nsecond\n";
        let mut out = Vec::new();

        run_lines(&analyzer, input, OutputFormat::Json, &mut out)
            .await
            .expect("run");

        let out = String::from_utf8(out).expect("utf8");
        let parsed: Vec<EmotionScores> = out
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].dominant_emotion.map(|e| e.as_str()), Some("joy"));
        assert!(parsed[1].is_empty());
        assert_eq!(parsed[2].joy, Some(0.9));
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let analyzer = JoyfulAnalyzer::default();
        let input: &[u8] = b"";
        let mut out = Vec::new();

        let analyzed = run_lines(&analyzer, input, OutputFormat::Json, &mut out)
            .await
            .expect("run");

        assert_eq!(analyzed, 0);
        assert!(out.is_empty());
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }
}
