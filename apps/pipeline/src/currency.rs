//! Currency normalization — turns a loosely formatted rate string such as
//! `"85.5 USD"` into a USD amount via the external FX service.
//!
//! Extraction and conversion failures both produce `None`. A converted
//! amount of `0.0` is a legitimate `Some(0.0)`, distinct from `None`.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::error;

use crate::errors::PipelineError;
use crate::retry::Retry;

/// All rates are normalized into this currency before rule evaluation.
pub const REFERENCE_CURRENCY: &str = "USD";

/// Rate strings containing this marker carry no usable currency information.
const OPT_OUT_MARKER: &str = "Others";

fn amount_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid amount pattern"))
}

fn currency_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{3}\b").expect("valid currency pattern"))
}

/// Extracts `(amount, currency_code)` from a display string: the first
/// numeric token and the first standalone three-uppercase-letter token.
/// Returns `None` if either is missing or the opt-out marker is present.
pub fn parse_rate(display: &str) -> Option<(f64, String)> {
    if display.contains(OPT_OUT_MARKER) {
        return None;
    }
    let amount = amount_pattern()
        .find(display)
        .and_then(|m| m.as_str().parse::<f64>().ok())?;
    let currency = currency_pattern().find(display)?.as_str().to_string();
    Some((amount, currency))
}

/// External FX conversion seam.
#[async_trait]
pub trait FxConverter: Send + Sync {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, PipelineError>;
}

#[derive(Debug, Deserialize)]
struct FxResponse {
    result: Option<f64>,
}

/// FX client against an exchangerate-style `/convert` endpoint.
#[derive(Clone)]
pub struct HttpFxConverter {
    client: Client,
    api_url: String,
}

impl HttpFxConverter {
    pub fn new(api_url: String) -> Self {
        HttpFxConverter {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
        }
    }
}

#[async_trait]
impl FxConverter for HttpFxConverter {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, PipelineError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("from", from), ("to", to), ("amount", &amount.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Conversion(format!(
                "FX service returned {status}: {body}"
            )));
        }

        let payload: FxResponse = response.json().await?;
        payload.result.ok_or_else(|| {
            PipelineError::Conversion(format!("FX service returned no result for {from}->{to}"))
        })
    }
}

/// Pass-through converter for tests and single-currency deployments.
pub struct IdentityFx;

#[async_trait]
impl FxConverter for IdentityFx {
    async fn convert(&self, amount: f64, _from: &str, _to: &str) -> Result<f64, PipelineError> {
        Ok(amount)
    }
}

/// Normalizes display rates to USD through the retry-wrapped FX service.
#[derive(Clone)]
pub struct CurrencyNormalizer {
    fx: Arc<dyn FxConverter>,
    retry: Retry,
}

impl CurrencyNormalizer {
    pub fn new(fx: Arc<dyn FxConverter>, retry: Retry) -> Self {
        CurrencyNormalizer { fx, retry }
    }

    /// `None` on extraction failure, opt-out marker, or a conversion that
    /// still fails after retries; `Some` otherwise, including `Some(0.0)`.
    pub async fn to_usd(&self, display: &str) -> Option<f64> {
        let (amount, currency) = parse_rate(display)?;
        match self
            .retry
            .run("fx conversion", || {
                self.fx.convert(amount, &currency, REFERENCE_CURRENCY)
            })
            .await
        {
            Ok(converted) => Some(converted),
            Err(e) => {
                let rate_display = display;
                error!("Could not normalize rate '{rate_display}': {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use tokio_util::sync::CancellationToken;

    fn normalizer(fx: Arc<dyn FxConverter>) -> CurrencyNormalizer {
        CurrencyNormalizer::new(fx, Retry::new(RetryPolicy::default(), CancellationToken::new()))
    }

    struct AlwaysFailsFx;

    #[async_trait]
    impl FxConverter for AlwaysFailsFx {
        async fn convert(&self, _: f64, _: &str, _: &str) -> Result<f64, PipelineError> {
            Err(PipelineError::Conversion("fx offline".into()))
        }
    }

    #[test]
    fn test_parse_rate_extracts_amount_and_code() {
        assert_eq!(parse_rate("85.5 USD"), Some((85.5, "USD".into())));
        assert_eq!(parse_rate("rate: 100 in EUR please"), Some((100.0, "EUR".into())));
    }

    #[test]
    fn test_parse_rate_rejects_opt_out_marker() {
        assert_eq!(parse_rate("Others"), None);
        assert_eq!(parse_rate("90 USD or Others"), None);
    }

    #[test]
    fn test_parse_rate_requires_both_tokens() {
        assert_eq!(parse_rate("not a rate"), None);
        assert_eq!(parse_rate("85.5"), None);
        assert_eq!(parse_rate("USD"), None);
    }

    #[test]
    fn test_parse_rate_ignores_lowercase_codes() {
        assert_eq!(parse_rate("85.5 usd"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_amount_is_a_value_not_a_failure() {
        let n = normalizer(Arc::new(IdentityFx));
        assert_eq!(n.to_usd("0 USD").await, Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_failure_yields_none_after_retries() {
        let n = normalizer(Arc::new(AlwaysFailsFx));
        assert_eq!(n.to_usd("85.5 USD").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_display_never_reaches_the_service() {
        let n = normalizer(Arc::new(AlwaysFailsFx));
        assert_eq!(n.to_usd("Others").await, None);
        assert_eq!(n.to_usd("not a rate").await, None);
    }
}
