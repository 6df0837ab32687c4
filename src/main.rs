//! Chat Fraud Scoring Pipeline - Main Entry Point
//!
//! Answers scoring requests over NATS and publishes alerts for flagged
//! messages.

use anyhow::{Context, Result};
use chat_fraud_pipeline::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    metrics::{MetricsReporter, ScoringMetrics},
    models::OnnxScoringEngine,
    producer::VerdictPublisher,
    service::ScoringService,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("chat_fraud_pipeline={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Chat Fraud Scoring Pipeline");
    info!(
        text_model = %config.models.text_model_path().display(),
        url_model = %config.models.url_model_path().display(),
        workers = config.pipeline.workers,
        "Configuration loaded"
    );

    // A missing or incompatible artifact ends the process here.
    let engine = Arc::new(
        OnnxScoringEngine::from_config(&config).context("Failed to load scoring models")?,
    );
    let metrics = Arc::new(ScoringMetrics::new());
    let service = ScoringService::new(engine, metrics.clone());

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(
        client.clone(),
        &config.nats.request_subject,
        config.nats.queue_group.as_deref(),
    );
    let publisher = VerdictPublisher::new(client.clone(), &config.nats.alert_subject);

    if config.pipeline.metrics_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
        tokio::spawn(reporter.start());
    }

    let semaphore = Arc::new(Semaphore::new(config.pipeline.workers.max(1)));
    let handled = Arc::new(AtomicU64::new(0));

    info!(
        request_subject = %consumer.subject(),
        alert_subject = %publisher.alert_subject(),
        workers = config.pipeline.workers,
        "Serving scoring requests"
    );

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        let service = service.clone();
        let publisher = publisher.clone();
        let handled = handled.clone();

        tokio::spawn(async move {
            let processed = service.process(&message.payload).await;

            match message.reply {
                Some(reply_subject) => {
                    if let Err(e) = publisher.reply(reply_subject, &processed.reply).await {
                        error!(error = %e, "Failed to send scoring reply");
                    }
                }
                None => debug!("Scoring request without a reply subject"),
            }

            if let Some(alert) = &processed.alert {
                if let Err(e) = publisher.publish_alert(alert).await {
                    error!(alert_id = %alert.alert_id, error = %e, "Failed to publish fraud alert");
                }
            }

            let count = handled.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 1000 == 0 {
                let stats = service.metrics().processing_stats();
                info!(
                    handled = count,
                    throughput = format!("{:.1} msg/s", service.metrics().throughput()),
                    avg_latency_us = stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!("Subscription closed, shutting down");
    metrics.log_summary();

    Ok(())
}
