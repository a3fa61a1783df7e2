use std::error::Error;
use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;

use palmkey_hand_core::errors::{AppError, AppResult};

use crate::cli::OutputMode;
use crate::commands::{
    EnrollOutcome, QualityOutcome, RemoveOutcome, StatusOutcome, VerifyOutcome,
};

fn render<S: Serialize>(summary: &S, logs: &[String], closing: &str, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            for line in logs {
                println!("{}", line);
            }
            if !closing.is_empty() {
                println!("{}", closing);
            }
        }
        OutputMode::Json => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let payload = serde_json::to_string(summary)?;
            handle.write_all(payload.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

pub fn render_quality(outcome: &QualityOutcome, mode: OutputMode) -> AppResult<()> {
    let closing = format!(
        "Quality: {} / {}",
        outcome.summary.lighting,
        if outcome.summary.sharp { "sharp" } else { "blurry" }
    );
    render(&outcome.summary, &outcome.logs, &closing, mode)
}

pub fn render_enroll(outcome: &EnrollOutcome, mode: OutputMode) -> AppResult<()> {
    let closing = format!(
        "Enrolled {} {} capture: {}",
        outcome.summary.hand, outcome.summary.step, outcome.summary.image_path
    );
    render(&outcome.summary, &outcome.logs, &closing, mode)
}

pub fn render_status(outcome: &StatusOutcome, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            for line in &outcome.logs {
                println!("{}", line);
            }
            for hand in &outcome.summary.hands {
                println!("{} hand (next: {}):", hand.hand, hand.next_step);
                for step in &hand.steps {
                    let marker = if step.completed { "x" } else { " " };
                    match &step.path {
                        Some(path) => println!("  [{marker}] {:<7} {path}", step.step),
                        None => println!("  [{marker}] {}", step.step),
                    }
                }
            }
            Ok(())
        }
        OutputMode::Json => render(&outcome.summary, &outcome.logs, "", mode),
    }
}

pub fn render_verify(outcome: &VerifyOutcome, mode: OutputMode) -> AppResult<()> {
    let closing = format!(
        "{} (score {:.4}, threshold {:.2})",
        if outcome.summary.matched {
            "match"
        } else {
            "no match"
        },
        outcome.summary.score,
        outcome.summary.threshold
    );
    render(&outcome.summary, &outcome.logs, &closing, mode)
}

pub fn render_remove(outcome: &RemoveOutcome, mode: OutputMode) -> AppResult<()> {
    let closing = format!(
        "Removed {} artifact(s) for the {} hand",
        outcome.summary.removed.len(),
        outcome.summary.hand
    );
    render(&outcome.summary, &outcome.logs, &closing, mode)
}

pub fn render_error(err: &AppError, mode: OutputMode) {
    match mode {
        OutputMode::Human => {
            eprintln!("error: {}", err.human_message());
            if let Some(source) = err.source() {
                eprintln!("cause: {}", source);
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "success": false,
                "error": err.human_message(),
            });
            eprintln!("{}", payload);
        }
    }
}
