// Generator module
// Hugging Face Inference API client that turns retrieved context into an answer


use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::GeneratorConfig;
use crate::embeddings::truncate_to_token_budget;
use crate::http::{RetryPolicy, build_agent, send_with_retry};
use crate::{RagError, Result};

/// Produces an answer to `question` grounded in `context`.
///
/// The output may be empty; callers decide how to present that.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, context: &str, question: &str) -> Result<String>;
}

impl<G: AnswerGenerator + ?Sized> AnswerGenerator for Box<G> {
    #[inline]
    fn generate(&self, context: &str, question: &str) -> Result<String> {
        (**self).generate(context, question)
    }
}

#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    model_url: Url,
    token: Option<String>,
    manual_name: String,
    max_context_tokens: usize,
    max_new_tokens: u32,
    temperature: f32,
    agent: ureq::Agent,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    return_full_text: bool,
    max_new_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Generations(Vec<Generation>),
    Error { error: String },
}

impl HuggingFaceClient {
    /// Create a client for the configured model.
    ///
    /// The bearer token is read from the environment variable named in the
    /// config. Without one, requests are sent anonymously.
    #[inline]
    pub fn new(config: &GeneratorConfig, manual_name: &str) -> Result<Self> {
        let model_url = config.model_url()?;

        let token = config.api_token();
        if token.is_none() {
            warn!(
                "{} is not set, sending anonymous requests to {}",
                config.token_env, model_url
            );
        }

        Ok(Self {
            model_url,
            token,
            manual_name: manual_name.to_string(),
            max_context_tokens: config.max_context_tokens,
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            agent: build_agent(Duration::from_secs(config.timeout_seconds)),
            retry: RetryPolicy::default(),
        })
    }

    #[inline]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry.attempts = attempts;
        self
    }

    #[inline]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.base_delay = delay;
        self
    }

    #[inline]
    pub fn model_url(&self) -> &Url {
        &self.model_url
    }

    /// Instruction prompt for `question`, with `context` cut to the token budget
    #[inline]
    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        let context = match truncate_to_token_budget(context, self.max_context_tokens) {
            Some(truncated) => {
                warn!(
                    "Context truncated to {} tokens",
                    self.max_context_tokens
                );
                truncated
            }
            None => context.to_string(),
        };

        format!(
            "You are an expert on {manual}, helping users find information in its documentation.\n\
             Answer briefly, clearly and only from the provided context.\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question:\n\
             {question}\n\
             \n\
             1. Do not repeat the question.\n\
             2. Do not add extra information.\n\
             3. If the answer is found, give a specific answer.\n\
             4. If the answer is not found, write: \"Information not found.\"\n\
             \n\
             Answer:",
            manual = self.manual_name,
            context = context.trim(),
            question = question.trim(),
        )
    }

    fn request_generation(&self, prompt: &str) -> anyhow::Result<String> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                return_full_text: false,
                max_new_tokens: self.max_new_tokens,
                temperature: self.temperature,
            },
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generation request")?;

        debug!("Requesting generation from {}", self.model_url);

        send_with_retry(self.retry, self.model_url.as_str(), || {
            let builder = self
                .agent
                .post(self.model_url.as_str())
                .header("Content-Type", "application/json");
            let builder = match &self.token {
                Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
                None => builder,
            };
            builder
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Failed to call the inference API")
    }
}

impl AnswerGenerator for HuggingFaceClient {
    #[inline]
    fn generate(&self, context: &str, question: &str) -> Result<String> {
        let prompt = self.build_prompt(context, question);

        let response_text = self
            .request_generation(&prompt)
            .map_err(|e| RagError::Upstream(format!("{:#}", e)))?;

        let answer = parse_generation(&response_text)?;
        info!("Received {} characters from the model", answer.len());
        Ok(answer)
    }
}

fn parse_generation(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| RagError::Upstream(format!("unexpected inference response: {}", e)))?;

    match response {
        GenerateResponse::Generations(generations) => generations
            .into_iter()
            .next()
            .map(|generation| generation.generated_text.trim().to_string())
            .ok_or_else(|| RagError::Upstream("inference API returned no generations".to_string())),
        GenerateResponse::Error { error } => {
            warn!("Inference API reported an error: {}", error);
            Err(RagError::Upstream(error))
        }
    }
}
