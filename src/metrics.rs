//! Scoring statistics with a periodic log summary.

use crate::error::ScoringError;
use crate::models::aggregator::{Assessment, SignalSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_SAMPLES: usize = 10_000;

/// Counters shared by every scoring task
pub struct ScoringMetrics {
    pub messages_scored: AtomicU64,
    pub messages_flagged: AtomicU64,
    pub inference_failures: AtomicU64,
    pub timeouts: AtomicU64,
    pub bad_requests: AtomicU64,
    pub urls_scored: AtomicU64,
    /// Messages whose URL list was cut at the per-message cap
    pub urls_truncated: AtomicU64,
    flagged_by_text: AtomicU64,
    flagged_by_url: AtomicU64,
    /// Scoring latency samples in microseconds
    processing_times: RwLock<Vec<u64>>,
    /// Highest signal probability per message, in tenths
    peak_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self {
            messages_scored: AtomicU64::new(0),
            messages_flagged: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            bad_requests: AtomicU64::new(0),
            urls_scored: AtomicU64::new(0),
            urls_truncated: AtomicU64::new(0),
            flagged_by_text: AtomicU64::new(0),
            flagged_by_url: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            peak_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully scored message
    pub fn record_assessment(&self, assessment: &Assessment, elapsed: Duration) {
        self.messages_scored.fetch_add(1, Ordering::Relaxed);
        self.urls_scored
            .fetch_add(assessment.urls_scored as u64, Ordering::Relaxed);
        if assessment.urls_truncated() {
            self.urls_truncated.fetch_add(1, Ordering::Relaxed);
        }

        if assessment.is_fraudulent() {
            self.messages_flagged.fetch_add(1, Ordering::Relaxed);
            if assessment
                .triggered()
                .any(|s| matches!(s.source, SignalSource::Text))
            {
                self.flagged_by_text.fetch_add(1, Ordering::Relaxed);
            }
            if assessment
                .triggered()
                .any(|s| matches!(s.source, SignalSource::Url { .. }))
            {
                self.flagged_by_url.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(elapsed.as_micros() as u64);
            if times.len() > MAX_SAMPLES {
                times.drain(0..MAX_SAMPLES / 2);
            }
        }

        let bucket = (assessment.peak_probability() * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.peak_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a scoring call that produced no verdict
    pub fn record_failure(&self, error: &ScoringError) {
        match error {
            ScoringError::Inference(_) => self.inference_failures.fetch_add(1, Ordering::Relaxed),
            ScoringError::Timeout { .. } => self.timeouts.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_bad_request(&self) {
        self.bad_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Messages scored per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.messages_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn peak_distribution(&self) -> [u64; 10] {
        self.peak_buckets.read().map(|b| *b).unwrap_or_default()
    }

    pub fn flagged_by_source(&self) -> (u64, u64) {
        (
            self.flagged_by_text.load(Ordering::Relaxed),
            self.flagged_by_url.load(Ordering::Relaxed),
        )
    }

    pub fn log_summary(&self) {
        let scored = self.messages_scored.load(Ordering::Relaxed);
        let flagged = self.messages_flagged.load(Ordering::Relaxed);
        let flag_rate = if scored > 0 {
            flagged as f64 / scored as f64 * 100.0
        } else {
            0.0
        };
        let (by_text, by_url) = self.flagged_by_source();
        let processing = self.processing_stats();

        info!(
            scored = scored,
            flagged = flagged,
            flag_rate = format!("{:.1}%", flag_rate),
            flagged_by_text = by_text,
            flagged_by_url = by_url,
            throughput = format!("{:.1} msg/s", self.throughput()),
            "Scoring summary"
        );
        info!(
            inference_failures = self.inference_failures.load(Ordering::Relaxed),
            timeouts = self.timeouts.load(Ordering::Relaxed),
            bad_requests = self.bad_requests.load(Ordering::Relaxed),
            urls_scored = self.urls_scored.load(Ordering::Relaxed),
            urls_truncated = self.urls_truncated.load(Ordering::Relaxed),
            "Scoring errors and URL load"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Scoring latency"
        );

        let dist = self.peak_distribution();
        let total: u64 = dist.iter().sum();
        if total > 0 {
            let rendered: Vec<String> = dist
                .iter()
                .enumerate()
                .map(|(i, count)| format!("{:.1}-{:.1}:{}", i as f64 / 10.0, (i + 1) as f64 / 10.0, count))
                .collect();
            info!(distribution = %rendered.join(" "), "Peak signal probability");
        }
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics in microseconds
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Logs a metrics summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<ScoringMetrics>,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ScoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.log_summary();
        }
    }
}
