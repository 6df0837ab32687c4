//! Test Message Sender
//!
//! Generates legitimate and scam-like chat messages, sends them as scoring
//! requests over NATS and logs the verdicts.

use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Request body matching the service's expected format
#[derive(Debug, Clone, Serialize)]
struct ScoringRequest {
    content: String,
    message_id: String,
}

const GREETINGS: &[&str] = &["hey", "hi", "hello", "morning", "yo"];
const SMALL_TALK: &[&str] = &[
    "are we still on for lunch tomorrow?",
    "running ten minutes late, sorry",
    "did you see the game last night",
    "can you send me the meeting notes",
    "happy birthday! hope you have a great day",
];
const SAFE_LINKS: &[&str] = &[
    "https://docs.example.com/notes",
    "https://maps.example.org/place/cafe",
    "http://blog.example.net/2024/recipes",
];
const SCAM_LINES: &[&str] = &[
    "Congratulations! You have WON a free prize, claim now at",
    "URGENT: your account is suspended. Verify your identity here",
    "You are selected for a cash reward, confirm your bank details at",
    "Final notice: unusual login detected, secure your account now",
];
const SCAM_LINKS: &[&str] = &[
    "http://login-verify-account.com",
    "http://secure-login.bank-support.xyz/verify",
    "http://free-prize-claim.win/account",
    "http://verify.account-update.co/login",
];

struct MessageGenerator {
    rng: rand::rngs::ThreadRng,
    counter: u64,
}

impl MessageGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("msg_{:010}", self.counter)
    }

    fn generate_legitimate(&mut self) -> ScoringRequest {
        let mut content = format!(
            "{} {}",
            self.random_choice(GREETINGS),
            self.random_choice(SMALL_TALK)
        );
        if self.rng.gen_bool(0.3) {
            content.push(' ');
            content.push_str(self.random_choice(SAFE_LINKS));
        }

        ScoringRequest {
            content,
            message_id: self.next_id(),
        }
    }

    fn generate_scam(&mut self) -> ScoringRequest {
        let mut content = format!(
            "{} {}",
            self.random_choice(SCAM_LINES),
            self.random_choice(SCAM_LINKS)
        );
        if self.rng.gen_bool(0.25) {
            content.push_str(" or ");
            content.push_str(self.random_choice(SCAM_LINKS));
        }

        ScoringRequest {
            content,
            message_id: self.next_id(),
        }
    }

    fn generate(&mut self, scam_rate: f64) -> (ScoringRequest, bool) {
        if self.rng.gen_bool(scam_rate) {
            (self.generate_scam(), true)
        } else {
            (self.generate_legitimate(), false)
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("send_test_messages=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("chat.fraud.score");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(50);
    let scam_rate: f64 = args
        .get(4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.2_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        scam_rate = scam_rate,
        delay_ms = delay_ms,
        "Starting test message sender"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, scam_rate).await;
        }
    };

    let mut generator = MessageGenerator::new();
    let mut flagged = 0;
    let mut scams_sent = 0;
    let mut failed = 0;

    for _ in 0..count {
        let (request, is_scam) = generator.generate(scam_rate);
        if is_scam {
            scams_sent += 1;
        }
        let payload = serde_json::to_vec(&request)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(reply) => {
                let body: serde_json::Value = serde_json::from_slice(&reply.payload)?;
                if body["is_fraudulent"].as_bool() == Some(true) {
                    flagged += 1;
                }
                info!(
                    message_id = %request.message_id,
                    sent_as_scam = is_scam,
                    reply = %body,
                    "{}",
                    request.content
                );
            }
            Err(e) => {
                failed += 1;
                warn!(message_id = %request.message_id, error = %e, "Request failed");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        sent = count,
        scams_sent = scams_sent,
        flagged = flagged,
        failed = failed,
        "Completed"
    );

    Ok(())
}

async fn run_dry_mode(count: u64, scam_rate: f64) -> anyhow::Result<()> {
    let mut generator = MessageGenerator::new();

    for i in 0..count {
        let (request, is_scam) = generator.generate(scam_rate);
        if i < 10 {
            info!(sent_as_scam = is_scam, "{}", serde_json::to_string(&request)?);
        }
    }

    Ok(())
}
