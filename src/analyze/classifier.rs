//! Classifier adapter: provider abstraction for the per-cycle LLM call.
//!
//! The adapter returns the raw reply body; turning it into verdicts (and
//! tolerating garbage) is `analyze::verdict`'s job.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::classifier::ClassifierConfig;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier disabled")]
    Disabled,
    #[error("classifier http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier answered with status {0}")]
    Status(u16),
    #[error("classifier returned an empty reply")]
    EmptyReply,
}

pub type ClassifyFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ClassifierError>> + Send + 'a>>;

/// Trait object used by the classification run.
pub trait Classifier: Send + Sync {
    /// One call per run: system instruction plus the joined topic blocks.
    fn classify<'a>(&'a self, system: &'a str, user: &'a str) -> ClassifyFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Factory: build a classifier according to config and environment variables.
///
/// * If `CLASSIFIER_TEST_MODE=mock`, returns a mock that answers `{}`.
/// * Else if `config.enabled==false`, returns a disabled client.
/// * Else builds the configured provider; a missing API key degrades to disabled.
pub fn build_classifier(config: &ClassifierConfig) -> DynClassifier {
    if std::env::var("CLASSIFIER_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockClassifier::new("{}"));
    }

    if !config.enabled {
        return Arc::new(DisabledClassifier);
    }

    match config.provider.as_str() {
        "openai" => {
            let key = match config.resolve_api_key() {
                Ok(k) => k,
                Err(e) => {
                    tracing::warn!(target: "classify", error = %e, "classifier key unavailable, disabling");
                    return Arc::new(DisabledClassifier);
                }
            };
            match OpenAiClassifier::new(
                key,
                &config.model,
                config.temperature,
                Duration::from_secs(config.timeout_secs),
            ) {
                Ok(c) => Arc::new(c),
                Err(e) => {
                    tracing::warn!(target: "classify", error = %e, "building http client failed, disabling");
                    Arc::new(DisabledClassifier)
                }
            }
        }
        "mock" => Arc::new(MockClassifier::new("{}")),
        other => {
            tracing::warn!(target: "classify", provider = other, "unknown classifier provider, disabling");
            Arc::new(DisabledClassifier)
        }
    }
}

/// OpenAI Chat Completions in JSON-object mode.
pub struct OpenAiClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClassifier {
    pub fn new(
        api_key: String,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ticker-feed/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            temperature,
        })
    }
}

impl Classifier for OpenAiClassifier {
    fn classify<'a>(&'a self, system: &'a str, user: &'a str) -> ClassifyFuture<'a> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Msg<'m> {
                role: &'m str,
                content: &'m str,
            }
            #[derive(Serialize)]
            struct ResponseFormat {
                #[serde(rename = "type")]
                kind: &'static str,
            }
            #[derive(Serialize)]
            struct Req<'m> {
                model: &'m str,
                messages: Vec<Msg<'m>>,
                temperature: f32,
                response_format: ResponseFormat,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                #[serde(default)]
                content: Option<String>,
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: system,
                    },
                    Msg {
                        role: "user",
                        content: user,
                    },
                ],
                temperature: self.temperature,
                response_format: ResponseFormat {
                    kind: "json_object",
                },
            };

            let resp = self
                .http
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(ClassifierError::Status(resp.status().as_u16()));
            }
            let body: Resp = resp.json().await?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or(ClassifierError::EmptyReply)
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always fails with `Disabled`; used when classification is switched off.
pub struct DisabledClassifier;

impl Classifier for DisabledClassifier {
    fn classify<'a>(&'a self, _system: &'a str, _user: &'a str) -> ClassifyFuture<'a> {
        Box::pin(async { Err(ClassifierError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Canned reply for tests and dry runs. Remembers the user messages it received.
pub struct MockClassifier {
    reply: String,
    seen: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_messages(&self) -> Vec<String> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Classifier for MockClassifier {
    fn classify<'a>(&'a self, _system: &'a str, user: &'a str) -> ClassifyFuture<'a> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(user.to_string());
        }
        let out = self.reply.clone();
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_reports_disabled() {
        let err = DisabledClassifier.classify("s", "u").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Disabled));
    }

    #[tokio::test]
    async fn mock_echoes_reply_and_records_input() {
        let m = MockClassifier::new(r#"{"A":{}}"#);
        assert_eq!(m.classify("sys", "blocks").await.unwrap(), r#"{"A":{}}"#);
        assert_eq!(m.seen_messages(), vec!["blocks".to_string()]);
    }

    #[serial_test::serial]
    #[test]
    fn factory_respects_enabled_flag_and_provider() {
        std::env::remove_var("CLASSIFIER_TEST_MODE");
        let off = build_classifier(&ClassifierConfig::default());
        assert_eq!(off.provider_name(), "disabled");

        let mock = build_classifier(&ClassifierConfig {
            enabled: true,
            provider: "mock".into(),
            ..ClassifierConfig::default()
        });
        assert_eq!(mock.provider_name(), "mock");

        let literal_key = build_classifier(&ClassifierConfig {
            enabled: true,
            api_key: "sk-test".into(),
            ..ClassifierConfig::default()
        });
        assert_eq!(literal_key.provider_name(), "openai");
    }

    #[serial_test::serial]
    #[test]
    fn test_mode_env_forces_mock() {
        std::env::set_var("CLASSIFIER_TEST_MODE", "mock");
        let c = build_classifier(&ClassifierConfig::default());
        std::env::remove_var("CLASSIFIER_TEST_MODE");
        assert_eq!(c.provider_name(), "mock");
    }
}
