//! Scoring engine: normalization, URL featurization, both classifiers and
//! verdict fusion behind one shared, immutable value.

use crate::config::AppConfig;
use crate::error::{ModelLoadError, ScoringError};
use crate::models::aggregator::{Assessment, SignalSource, VerdictAggregator};
use crate::models::classifier::{Classifier, OnnxTextClassifier, OnnxUrlClassifier};
use crate::models::loader::ModelLoader;
use crate::text::TextNormalizer;
use crate::types::{ScoringRequest, ScoringVerdict};
use crate::url::{UrlExtractor, UrlFeaturizer, UrlFeatures};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_URLS: usize = 32;

/// Per-call resource limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringLimits {
    /// URLs beyond this many are not scored
    pub max_urls: usize,
    /// Wall-clock budget for one scoring call
    pub budget: Option<Duration>,
}

impl Default for ScoringLimits {
    fn default() -> Self {
        Self {
            max_urls: DEFAULT_MAX_URLS,
            budget: Some(Duration::from_millis(1000)),
        }
    }
}

impl ScoringLimits {
    pub fn unbounded() -> Self {
        Self {
            max_urls: usize::MAX,
            budget: None,
        }
    }
}

/// Engine over the production ONNX models
pub type OnnxScoringEngine = ScoringEngine<OnnxTextClassifier, OnnxUrlClassifier>;

/// Built once at startup and shared by reference across all scoring calls.
pub struct ScoringEngine<T, U> {
    normalizer: TextNormalizer,
    extractor: UrlExtractor,
    featurizer: UrlFeaturizer,
    text_model: T,
    url_model: U,
    limits: ScoringLimits,
}

impl OnnxScoringEngine {
    /// Load both artifacts. Either one missing or unusable is fatal.
    pub fn from_config(config: &AppConfig) -> Result<Self, ModelLoadError> {
        let models = &config.models;
        let loader = ModelLoader::new(models.onnx_threads, models.session_pool_size)?;

        let text_model =
            OnnxTextClassifier::from_model(loader.load_model(models.text_model_path(), "text")?)?;
        let url_model =
            OnnxUrlClassifier::from_model(loader.load_model(models.url_model_path(), "url")?)?;

        info!(
            url_layout = ?url_model.layout(),
            max_urls = config.pipeline.max_urls_per_message,
            timeout_ms = config.pipeline.timeout_ms,
            "Scoring engine initialized"
        );

        Ok(Self::new(text_model, url_model, config.pipeline.limits()))
    }
}

impl<T, U> ScoringEngine<T, U>
where
    T: Classifier<Input = str>,
    U: Classifier<Input = UrlFeatures>,
{
    pub fn new(text_model: T, url_model: U, limits: ScoringLimits) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            extractor: UrlExtractor::new(),
            featurizer: UrlFeaturizer::new(),
            text_model,
            url_model,
            limits,
        }
    }

    pub fn limits(&self) -> ScoringLimits {
        self.limits
    }

    pub fn score(&self, request: &ScoringRequest) -> Result<ScoringVerdict, ScoringError> {
        self.assess(&request.content).map(|a| a.verdict)
    }

    /// Score content and keep every computed signal.
    pub fn assess(&self, content: &str) -> Result<Assessment, ScoringError> {
        let started = Instant::now();
        let mut aggregator = VerdictAggregator::new();

        let normalized = self.normalizer.normalize(content);
        let text_prob = self.text_model.score(&normalized)?;
        aggregator.observe(SignalSource::Text, text_prob);

        let urls = self.extractor.extract(content);
        if urls.len() > self.limits.max_urls {
            warn!(
                urls_found = urls.len(),
                max_urls = self.limits.max_urls,
                "Message has more URLs than the per-message cap; scoring the first ones only"
            );
        }

        let mut urls_scored = 0;
        for (index, url) in urls.iter().take(self.limits.max_urls).enumerate() {
            self.check_budget(started)?;

            let features = self.featurizer.extract(url);
            let url_prob = self.url_model.score(&features)?;
            aggregator.observe(
                SignalSource::Url {
                    index,
                    url: url.to_string(),
                },
                url_prob,
            );
            urls_scored += 1;
        }

        let assessment = aggregator.finish(urls.len(), urls_scored);
        debug!(
            text_model = %self.text_model.name(),
            url_model = %self.url_model.name(),
            text_prob = text_prob,
            urls_scored = urls_scored,
            is_fraudulent = assessment.verdict.is_fraudulent,
            fraud_probability = assessment.verdict.fraud_probability,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Message scored"
        );

        Ok(assessment)
    }

    fn check_budget(&self, started: Instant) -> Result<(), ScoringError> {
        if let Some(budget) = self.limits.budget {
            let elapsed = started.elapsed();
            if elapsed > budget {
                return Err(ScoringError::Timeout { elapsed, budget });
            }
        }
        Ok(())
    }
}
