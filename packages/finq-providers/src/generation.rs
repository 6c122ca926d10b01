use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Single non-streaming completion against an Ollama style `/api/generate` endpoint.
pub async fn generate(cfg: &finq_config::GenerationProviderConfig, prompt: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"prompt": prompt,
		"stream": false,
		"options": { "temperature": cfg.temperature },
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_generation_response(&json)
}

/// Trimmed completion text. An empty string is a valid reply; callers decide what it means.
pub fn parse_generation_response(json: &Value) -> Result<String> {
	if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
		return Err(eyre::eyre!("Generation provider returned an error: {error}"));
	}

	json.get("response")
		.and_then(|v| v.as_str())
		.map(|text| text.trim().to_string())
		.ok_or_else(|| eyre::eyre!("Generation response is missing response text."))
}
