//! Google Gemini backend.
//!
//! This module provides a client for the Google Gemini API with support for:
//! - Per-request model selection (different requests can use different models)
//! - Client pooling with lazy initialization (one client per model)
//! - Per-model rate limiting (each model has independent rate limits)
//! - Thread-safe concurrent access
//!
//! # Architecture
//!
//! The [`GeminiClient`] maintains a pool of model-specific clients, each wrapped in its
//! own rate limiter. When a request specifies a model (via `GenerateRequest.model` or
//! `IllustrateRequest.model`), the client either retrieves the existing entry for that
//! model or creates a new one on-demand.
//!
//! Text generation goes through the `gemini-rust` SDK. Illustration goes through the
//! REST `generateContent` endpoint directly, because the request must attach an inline
//! reference image and ask for image response modalities. When the primary model
//! answers an illustration request without an image, the call is repeated once against
//! the fallback model; an imageless result after that is returned to the caller, who
//! decides whether to retry the page.
//!
//! # Example
//!
//! ```no_run
//! use caldecott_interface::{Illustrate, IllustrateRequestBuilder};
//! use caldecott_models::GeminiClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new()?;
//!
//! let request = IllustrateRequestBuilder::default()
//!     .prompt("A fox crossing a mossy stone bridge at dusk")
//!     .build()?;
//! let response = client.illustrate(&request).await?;
//!
//! if let Some((mime, bytes)) = response.image() {
//!     println!("rendered {} bytes ({})", bytes.len(), mime.unwrap_or("unknown"));
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use base64::Engine;
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

use gemini_rust::{Gemini, client::Model};

use caldecott_core::{GenerateRequest, GenerateResponse, Input, Output, Role};
use caldecott_error::{CaldecottResult, GeminiError, GeminiErrorKind};
use caldecott_interface::{ArtDriver, Illustrate, IllustrateRequest, Metadata, ModelMetadata};
use caldecott_rate_limit::{CaldecottConfig, RateLimiter, Tier, TierConfig};

use super::GeminiResult;
use super::rest::{
    ApiErrorBody, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};

/// Base URL for the REST `generateContent` endpoint.
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model when neither the request nor `GEMINI_MODEL` names one.
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Illustration model tried when the primary returns no image.
const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

/// Sampling temperature for illustration calls when the request has none.
const DEFAULT_IMAGE_TEMPERATURE: f32 = 0.4;

/// Arbitration note sent between the prompt and an attached reference image.
///
/// The text rules win over the pixels: the reference anchors style and palette,
/// while appearance details come from the prompt's mandatory rules.
const CONSISTENCY_NOTE: &str = "**CRITICAL CONSISTENCY NOTE:** Use the text-based MANDATORY APPEARANCE RULES (especially rules marked with \"ALWAYS\") as the PRIMARY source for character appearance details (features, clothing, colors). Use the reference image below MAINLY for overall style, color palette, character placement, and general visual guidance. If the reference image contradicts a specific \"ALWAYS\" rule in the text, FOLLOW THE TEXT RULE.";

//
// ─── TIERED GEMINI ──────────────────────────────────────────────────────────────
//

/// Couples a Gemini API client with its rate limiting tier.
///
/// This type wraps a `Gemini` client and a tier (implementing `Tier`) together,
/// enabling the `RateLimiter` to own both the client and its rate limit
/// configuration. This ensures that clients cannot be accessed without going
/// through rate limiting.
///
/// The struct implements `Tier` by delegating all methods to the inner tier,
/// allowing it to be used anywhere a `Tier` is expected (e.g., in `RateLimiter`).
#[derive(Clone)]
pub struct TieredGemini<T: Tier> {
    /// The Gemini API client
    pub client: Gemini,
    /// The tier configuration for rate limiting
    pub tier: T,
}

impl<T: Tier + std::fmt::Debug> std::fmt::Debug for TieredGemini<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredGemini")
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

impl<T: Tier> Tier for TieredGemini<T> {
    fn rpm(&self) -> Option<u32> {
        self.tier.rpm()
    }

    fn tpm(&self) -> Option<u64> {
        self.tier.tpm()
    }

    fn rpd(&self) -> Option<u32> {
        self.tier.rpd()
    }

    fn max_concurrent(&self) -> Option<u32> {
        self.tier.max_concurrent()
    }

    fn daily_quota_usd(&self) -> Option<f64> {
        self.tier.daily_quota_usd()
    }

    fn cost_per_million_input_tokens(&self) -> Option<f64> {
        self.tier.cost_per_million_input_tokens()
    }

    fn cost_per_million_output_tokens(&self) -> Option<f64> {
        self.tier.cost_per_million_output_tokens()
    }

    fn name(&self) -> &str {
        self.tier.name()
    }
}

//
// ─── CLIENT ─────────────────────────────────────────────────────────────────────
//

/// Client for Google Gemini API with per-model client pooling.
///
/// This client maintains a cache of model-specific Gemini clients, each with its
/// own rate limiter. Clients are created lazily on first use for each model.
///
/// # Architecture
///
/// - **Text pool**: `HashMap<String, RateLimiter<TieredGemini<TierConfig>>>`
/// - **Illustration pool**: `HashMap<String, RateLimiter<TierConfig>>` guarding
///   direct REST calls
/// - **Lazy Creation**: Entries are created on first request for each model
/// - **Model-Specific Rate Limiting**: Each model gets its own limits from config
/// - **Thread-Safe**: Uses `Arc<Mutex<HashMap>>` for concurrent access
pub struct GeminiClient {
    /// Cache of model-specific SDK clients with rate limiting
    clients: Arc<Mutex<HashMap<String, RateLimiter<TieredGemini<TierConfig>>>>>,
    /// Cache of model-specific rate limiters for the REST illustration path
    illustrate_limiters: Arc<Mutex<HashMap<String, RateLimiter<TierConfig>>>>,
    /// Shared HTTP client for REST calls
    http: reqwest::Client,
    /// API key for creating new clients
    api_key: String,
    /// Default model name when the request names none
    model_name: String,
    /// Illustration model tried when the primary returns no image
    fallback_model: String,
    /// Base tier configuration (tier-level defaults + model-specific overrides)
    base_tier: TierConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let client_count = self.clients.lock().unwrap().len();
        f.debug_struct("GeminiClient")
            .field("model_name", &self.model_name)
            .field("fallback_model", &self.fallback_model)
            .field("base_tier", &self.base_tier.name())
            .field("cached_clients", &client_count)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Convert a model name string to a gemini-rust Model enum variant.
    ///
    /// Maps common model name strings to their corresponding Model enum variants.
    /// Uses Model::Custom for unrecognized model names, automatically adding the
    /// "models/" prefix required by the Gemini API.
    ///
    /// # Examples
    ///
    /// - "gemini-2.5-flash" → Model::Gemini25Flash
    /// - "gemini-2.0-flash-exp" → Model::Custom("models/gemini-2.0-flash-exp")
    /// - "models/gemini-2.0-flash-exp" → Model::Custom("models/gemini-2.0-flash-exp") (preserved)
    fn model_name_to_enum(name: &str) -> Model {
        match name {
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-flash-lite" => Model::Gemini25FlashLite,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            "text-embedding-004" => Model::TextEmbedding004,
            // For other model names, use Custom variant with "models/" prefix
            other => {
                if other.starts_with("models/") {
                    Model::Custom(other.to_string())
                } else {
                    Model::Custom(format!("models/{}", other))
                }
            }
        }
    }

    /// Create a new Gemini client with default (Free tier) rate limiting.
    ///
    /// Reads the API key from the `GEMINI_API_KEY` environment variable. The
    /// default and fallback models come from `GEMINI_MODEL` and
    /// `GEMINI_FALLBACK_MODEL` when set.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use caldecott_models::GeminiClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = GeminiClient::new()?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "gemini_client_new")]
    pub fn new() -> CaldecottResult<Self> {
        Self::new_with_tier(None)
    }

    /// Create a new Gemini client with rate limiting from an explicit tier.
    ///
    /// Reads the API key from the `GEMINI_API_KEY` environment variable and
    /// applies rate limiting according to the provided tier. Passing `None`
    /// falls back to the Free tier defaults.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use caldecott_models::GeminiClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// // Create client with default tier (Free)
    /// let client = GeminiClient::new_with_tier(None)?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "gemini_client_new_with_tier", skip(tier))]
    pub fn new_with_tier(tier: Option<Box<dyn Tier>>) -> CaldecottResult<Self> {
        Self::new_internal(tier).map_err(Into::into)
    }

    /// Create a new Gemini client with rate limiting from configuration.
    ///
    /// Loads tier configuration from caldecott.toml and applies rate limiting,
    /// including model-specific rate limit overrides.
    ///
    /// # Arguments
    ///
    /// * `tier_name` - Optional tier name (uses provider default if None)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use caldecott_models::GeminiClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// // Use default tier from config (includes model-specific limits)
    /// let client = GeminiClient::new_with_config(None)?;
    ///
    /// // Use specific tier
    /// let client = GeminiClient::new_with_config(Some("payasyougo"))?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "gemini_client_new_with_config")]
    pub fn new_with_config(tier_name: Option<&str>) -> CaldecottResult<Self> {
        let tier_config = CaldecottConfig::load()
            .ok()
            .and_then(|config| config.get_tier("gemini", tier_name));

        Self::new_with_tier_config(tier_config).map_err(Into::into)
    }

    /// Internal constructor that returns Gemini-specific errors.
    fn new_internal(tier: Option<Box<dyn Tier>>) -> GeminiResult<Self> {
        // Model-specific overrides only survive the new_with_config() path,
        // where the tier is already a TierConfig loaded from caldecott.toml.
        let tier_config = tier.map(|tier| TierConfig {
            name: tier.name().to_string(),
            rpm: tier.rpm(),
            tpm: tier.tpm(),
            rpd: tier.rpd(),
            max_concurrent: tier.max_concurrent(),
            daily_quota_usd: tier.daily_quota_usd(),
            cost_per_million_input_tokens: tier.cost_per_million_input_tokens(),
            cost_per_million_output_tokens: tier.cost_per_million_output_tokens(),
            models: HashMap::new(),
        });

        Self::new_with_tier_config(tier_config)
    }

    /// Create a new Gemini client with a TierConfig (preserves model-specific overrides).
    fn new_with_tier_config(tier_config: Option<TierConfig>) -> GeminiResult<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::new(GeminiErrorKind::MissingApiKey))?;

        let base_tier = tier_config.unwrap_or_else(Self::default_tier);

        Ok(Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            illustrate_limiters: Arc::new(Mutex::new(HashMap::new())),
            http: reqwest::Client::new(),
            api_key,
            model_name: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            fallback_model: env::var("GEMINI_FALLBACK_MODEL")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_MODEL.to_string()),
            base_tier,
        })
    }

    /// Free tier limits applied when no configuration is available.
    fn default_tier() -> TierConfig {
        TierConfig {
            name: "Free".to_string(),
            rpm: Some(10),
            tpm: Some(250_000),
            rpd: Some(250),
            max_concurrent: Some(1),
            daily_quota_usd: None,
            cost_per_million_input_tokens: Some(0.0),
            cost_per_million_output_tokens: Some(0.0),
            models: HashMap::new(),
        }
    }

    /// Get or create the rate-limited SDK client for a model.
    fn text_client_for(
        &self,
        model_name: &str,
    ) -> GeminiResult<RateLimiter<TieredGemini<TierConfig>>> {
        let mut clients = self.clients.lock().unwrap();
        if let Some(existing) = clients.get(model_name) {
            return Ok(existing.clone());
        }

        let model_enum = Self::model_name_to_enum(model_name);
        let client = Gemini::with_model(&self.api_key, model_enum)
            .map_err(|e| GeminiError::new(GeminiErrorKind::ClientCreation(e.to_string())))?;

        // Model-specific tier overrides from config apply here
        let tiered = TieredGemini {
            client,
            tier: self.base_tier.for_model(model_name),
        };

        let limiter = RateLimiter::new(tiered);
        clients.insert(model_name.to_string(), limiter.clone());
        Ok(limiter)
    }

    /// Get or create the rate limiter guarding REST illustration calls for a model.
    fn illustrate_limiter_for(&self, model_name: &str) -> RateLimiter<TierConfig> {
        let mut limiters = self.illustrate_limiters.lock().unwrap();
        limiters
            .entry(model_name.to_string())
            .or_insert_with(|| RateLimiter::new(self.base_tier.for_model(model_name)))
            .clone()
    }

    /// Check if input contains non-text media
    fn has_media(inputs: &[Input]) -> bool {
        inputs.iter().any(|i| !matches!(i, Input::Text(_)))
    }

    /// Estimate token count from text (rough approximation: chars / 4).
    ///
    /// This is a conservative estimate. Actual token count may be lower.
    fn estimate_tokens(text: &str) -> u64 {
        (text.len() / 4).max(1) as u64
    }

    /// Internal generate method that returns Gemini-specific errors.
    async fn generate_internal(&self, req: &GenerateRequest) -> GeminiResult<GenerateResponse> {
        // Determine which model to use
        let model_name = req.model.as_deref().unwrap_or(self.model_name.as_str());

        let limiter = self.text_client_for(model_name)?;

        // Estimate tokens for rate limiting
        let estimated_tokens: u64 = req
            .messages
            .iter()
            .flat_map(|msg| &msg.content)
            .filter_map(Input::as_text)
            .map(Self::estimate_tokens)
            .sum();

        // Add max_tokens if specified (output token estimate)
        let total_estimate = estimated_tokens + req.max_tokens.unwrap_or(1000) as u64;

        // Execute with rate limiting and automatic retry
        let response = limiter
            .execute(total_estimate, || async {
                // Access the client through the rate limiter
                let client = &limiter.inner().client;

                let mut builder = client.generate_content();
                let mut system_prompt = None;

                for msg in &req.messages {
                    match msg.role {
                        Role::System => {
                            // Gemini uses a separate system prompt
                            if let Some(text) = msg.content.iter().find_map(Input::as_text) {
                                system_prompt = Some(text);
                            }
                        }
                        Role::User => {
                            for input in &msg.content {
                                if let Some(text) = input.as_text() {
                                    builder = builder.with_user_message(text);
                                }
                            }

                            // Reference images travel the illustrate path,
                            // never the text builder.
                            if Self::has_media(&msg.content) {
                                return Err(GeminiError::new(
                                    GeminiErrorKind::MultimodalNotSupported,
                                ));
                            }
                        }
                        Role::Assistant => {
                            if let Some(text) = msg.content.iter().find_map(Input::as_text) {
                                builder = builder.with_model_message(text);
                            }
                        }
                    }
                }

                if let Some(prompt) = system_prompt {
                    builder = builder.with_system_prompt(prompt);
                }

                if let Some(temperature) = req.temperature {
                    builder = builder.with_temperature(temperature);
                }

                if let Some(max_tokens) = req.max_tokens {
                    builder = builder.with_max_output_tokens(max_tokens as i32);
                }

                // Execute the request and parse errors
                builder.execute().await.map_err(Self::parse_gemini_error)
            })
            .await?;

        let text = response.text();

        Ok(GenerateResponse {
            outputs: vec![Output::Text(text)],
        })
    }

    /// Internal illustrate method that returns Gemini-specific errors.
    ///
    /// When the primary model answers without an image, the same request body is
    /// sent once to the fallback model. An imageless result after that is still
    /// `Ok`; the caller inspects `GenerateResponse::image()` to decide what to do.
    async fn illustrate_internal(&self, req: &IllustrateRequest) -> GeminiResult<GenerateResponse> {
        let model_name = req.model.as_deref().unwrap_or(self.model_name.as_str());
        let estimated_tokens = Self::estimate_tokens(&req.prompt);
        let body = Self::illustrate_request_body(req);

        let response = {
            let limiter = self.illustrate_limiter_for(model_name);
            let _guard = limiter.acquire(estimated_tokens).await;
            self.post_generate_content(model_name, &body).await?
        };

        let outputs = Self::decode_outputs(&response)?;
        if Self::has_image(&outputs) {
            return Ok(GenerateResponse { outputs });
        }

        // Already on the fallback model: nothing further to try
        if self.fallback_model == model_name {
            warn!(model = %model_name, "Illustration response contained no image");
            return Ok(GenerateResponse { outputs });
        }

        info!(
            model = %model_name,
            fallback = %self.fallback_model,
            "Primary model returned no image, trying fallback model"
        );

        let fallback_response = {
            let limiter = self.illustrate_limiter_for(&self.fallback_model);
            let _guard = limiter.acquire(estimated_tokens).await;
            self.post_generate_content(&self.fallback_model, &body)
                .await?
        };

        let outputs = Self::decode_outputs(&fallback_response)?;
        if !Self::has_image(&outputs) {
            warn!(model = %self.fallback_model, "Fallback model also returned no image");
        }

        Ok(GenerateResponse { outputs })
    }

    /// Build the REST request body for an illustration call.
    ///
    /// Parts are ordered prompt, consistency note, reference image. The note is
    /// only sent when a reference is attached.
    fn illustrate_request_body(req: &IllustrateRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::text(req.prompt.clone())];

        if let Some(reference) = &req.reference {
            parts.push(Part::text(CONSISTENCY_NOTE));
            parts.push(Part::inline_data(
                reference.mime.clone(),
                base64::engine::general_purpose::STANDARD.encode(&reference.data),
            ));
        }

        GenerateContentRequest {
            contents: vec![Content::user(parts)],
            generation_config: GenerationConfig::for_illustration(
                req.temperature.unwrap_or(DEFAULT_IMAGE_TEMPERATURE),
            ),
        }
    }

    /// POST a `generateContent` request to the REST endpoint.
    async fn post_generate_content(
        &self,
        model_name: &str,
        body: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = format!("{API_BASE}/models/{model_name}:generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeminiError::new(GeminiErrorKind::Timeout(e.to_string()))
                } else {
                    GeminiError::new(GeminiErrorKind::ApiRequest(e.to_string()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            // Prefer the structured service message when the body parses
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .ok()
                .and_then(|body| body.error)
                .map(|detail| detail.message)
                .unwrap_or(raw);

            return Err(GeminiError::new(GeminiErrorKind::HttpError {
                status_code: status.as_u16(),
                message,
            }));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiError::new(GeminiErrorKind::ResponseDecode(e.to_string())))
    }

    /// Decode response candidates into outputs, decoding inline image data.
    fn decode_outputs(response: &GenerateContentResponse) -> GeminiResult<Vec<Output>> {
        let mut outputs = Vec::new();

        for candidate in &response.candidates {
            let Some(content) = &candidate.content else {
                continue;
            };

            for part in &content.parts {
                if let Some(text) = &part.text {
                    outputs.push(Output::Text(text.clone()));
                }

                if let Some(inline) = &part.inline_data {
                    let data = base64::engine::general_purpose::STANDARD
                        .decode(&inline.data)
                        .map_err(|e| {
                            GeminiError::new(GeminiErrorKind::Base64Decode(e.to_string()))
                        })?;
                    outputs.push(Output::Image {
                        mime: Some(inline.mime_type.clone()),
                        data,
                    });
                }
            }
        }

        Ok(outputs)
    }

    /// Whether the outputs contain a usable image (image MIME type, nonempty bytes).
    fn has_image(outputs: &[Output]) -> bool {
        outputs.iter().any(|output| match output {
            Output::Image { mime, data } => {
                !data.is_empty() && mime.as_deref().is_some_and(|m| m.starts_with("image/"))
            }
            _ => false,
        })
    }

    /// Parse gemini-rust errors to extract HTTP status codes.
    ///
    /// Converts generic API error strings into structured GeminiError
    /// with HTTP status codes when available.
    fn parse_gemini_error(err: impl std::fmt::Display) -> GeminiError {
        let err_msg = err.to_string();

        // Try to extract HTTP status code from error message
        // Example: "bad response from server; code 503; description: ..."
        if let Some(status_code) = Self::extract_status_code(&err_msg) {
            GeminiError::new(GeminiErrorKind::HttpError {
                status_code,
                message: err_msg,
            })
        } else {
            GeminiError::new(GeminiErrorKind::ApiRequest(err_msg))
        }
    }

    /// Extract HTTP status code from error message string.
    ///
    /// Parses strings like "bad response from server; code 503; description: ..."
    /// and extracts the numeric status code.
    fn extract_status_code(error_msg: &str) -> Option<u16> {
        if let Some(code_start) = error_msg.find("code ") {
            let code_str = &error_msg[code_start + 5..];
            if let Some(end) = code_str.find(|c: char| !c.is_numeric()) {
                return code_str[..end].parse().ok();
            }
        }
        None
    }
}

#[async_trait]
impl ArtDriver for GeminiClient {
    async fn generate(&self, req: &GenerateRequest) -> CaldecottResult<GenerateResponse> {
        self.generate_internal(req).await.map_err(Into::into)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    /// Returns the default model name used when `GenerateRequest.model` is None.
    ///
    /// Note: This returns the default model configured at client creation time.
    /// Individual requests may use different models by specifying `GenerateRequest.model`.
    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Illustrate for GeminiClient {
    async fn illustrate(&self, req: &IllustrateRequest) -> CaldecottResult<GenerateResponse> {
        self.illustrate_internal(req).await.map_err(Into::into)
    }
}

impl Metadata for GeminiClient {
    /// Returns metadata for the default model.
    ///
    /// Note: This returns capabilities for the default model configured at client
    /// creation. Different Gemini models may have different capabilities and
    /// limits. When using per-request model selection, verify that the requested
    /// model supports the features you need.
    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            provider: "gemini",
            model: self.model_name.clone(),
            max_input_tokens: 1_048_576,
            max_output_tokens: 8192,
            supports_vision: true,
            supports_illustration: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::rest::Candidate;
    use caldecott_interface::ReferenceImage;

    #[test]
    fn status_code_extraction_parses_terminated_codes() {
        assert_eq!(
            GeminiClient::extract_status_code(
                "bad response from server; code 503; description: overloaded"
            ),
            Some(503)
        );
        assert_eq!(GeminiClient::extract_status_code("connection refused"), None);
        assert_eq!(
            GeminiClient::extract_status_code("code abc; description"),
            None
        );
    }

    #[test]
    fn token_estimate_never_drops_to_zero() {
        assert_eq!(GeminiClient::estimate_tokens(""), 1);
        assert_eq!(GeminiClient::estimate_tokens("abcd"), 1);
        assert_eq!(GeminiClient::estimate_tokens("abcdefgh"), 2);
    }

    #[test]
    fn custom_model_names_gain_the_models_prefix() {
        assert!(matches!(
            GeminiClient::model_name_to_enum("gemini-2.0-flash-exp"),
            Model::Custom(name) if name == "models/gemini-2.0-flash-exp"
        ));
        assert!(matches!(
            GeminiClient::model_name_to_enum("models/gemini-2.0-flash-exp"),
            Model::Custom(name) if name == "models/gemini-2.0-flash-exp"
        ));
        assert!(matches!(
            GeminiClient::model_name_to_enum("gemini-2.5-flash"),
            Model::Gemini25Flash
        ));
    }

    #[test]
    fn illustrate_body_orders_prompt_note_then_reference() {
        let request = IllustrateRequest {
            prompt: "Page 3: the fox finds the lantern".to_string(),
            reference: Some(ReferenceImage {
                mime: "image/png".to_string(),
                data: vec![1, 2, 3],
            }),
            temperature: Some(0.45),
            model: None,
        };

        let body = GeminiClient::illustrate_request_body(&request);

        assert_eq!(body.contents.len(), 1);
        let parts = &body.contents[0].parts;
        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[0].text.as_deref(),
            Some("Page 3: the fox finds the lantern")
        );
        assert!(
            parts[1]
                .text
                .as_deref()
                .is_some_and(|note| note.contains("CRITICAL CONSISTENCY NOTE"))
        );
        let inline = parts[2].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(
            base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(body.generation_config.temperature, 0.45);
        assert_eq!(body.generation_config.top_p, 1.0);
        assert_eq!(body.generation_config.top_k, 32);
        assert_eq!(
            body.generation_config.response_modalities,
            vec!["Text".to_string(), "Image".to_string()]
        );
    }

    #[test]
    fn illustrate_body_without_reference_is_a_single_part() {
        let request = IllustrateRequest {
            prompt: "Cover art for Maple the Fox".to_string(),
            ..Default::default()
        };

        let body = GeminiClient::illustrate_request_body(&request);

        assert_eq!(body.contents[0].parts.len(), 1);
        assert_eq!(body.contents[0].role.as_deref(), Some("user"));
        assert_eq!(body.generation_config.temperature, DEFAULT_IMAGE_TEMPERATURE);
    }

    #[test]
    fn outputs_decode_text_and_image_parts() {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![
                        Part::text("Here you go."),
                        Part::inline_data(
                            "image/png",
                            base64::engine::general_purpose::STANDARD
                                .encode([137u8, 80, 78, 71]),
                        ),
                    ],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
        };

        let outputs = GeminiClient::decode_outputs(&response).unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(matches!(&outputs[0], Output::Text(text) if text == "Here you go."));
        assert!(matches!(
            &outputs[1],
            Output::Image { mime: Some(mime), data } if mime == "image/png" && data[..] == [137, 80, 78, 71]
        ));
        assert!(GeminiClient::has_image(&outputs));
    }

    #[test]
    fn invalid_base64_surfaces_a_decode_error() {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::inline_data("image/png", "not valid base64!!!")],
                }),
                finish_reason: None,
            }],
        };

        let error = GeminiClient::decode_outputs(&response).unwrap_err();
        assert!(matches!(error.kind, GeminiErrorKind::Base64Decode(_)));
    }

    #[test]
    fn text_only_outputs_have_no_image() {
        let outputs = vec![Output::Text("No picture today.".to_string())];
        assert!(!GeminiClient::has_image(&outputs));

        let empty_image = vec![Output::Image {
            mime: Some("image/png".to_string()),
            data: Vec::new(),
        }];
        assert!(!GeminiClient::has_image(&empty_image));
    }
}
