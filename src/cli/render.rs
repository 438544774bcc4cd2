//! Terminal rendering for progress events and reports

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Number, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::SubmissionResult;
use crate::progress::{ProgressEvent, ProgressKind};
use crate::run::AssessmentReport;

/// Spinner that follows a progress channel until the sender side closes.
pub fn spawn_spinner(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let line = format_event(&event);
            match event.kind {
                ProgressKind::Info => spinner.set_message(line),
                _ => spinner.println(line),
            }
        }
        spinner.finish_and_clear();
    })
}

pub fn format_event(event: &ProgressEvent) -> String {
    let marker = match event.kind {
        ProgressKind::Info => "…",
        ProgressKind::Success => "✅",
        ProgressKind::Warning => "⚠️ ",
        ProgressKind::Error => "❌",
    };
    format!("{marker} {}", event.message)
}

pub fn print_summary(report: &AssessmentReport) {
    let summary = &report.summary;
    println!("Assessed {} patients", summary.total_patients);
    println!("  High risk:           {}", summary.high_risk);
    println!("  Fever:               {}", summary.fever);
    println!("  Data quality issues: {}", summary.data_quality);
    println!("  No findings:         {}", summary.clean_patients);

    print_cohort("High risk", &report.cohorts.high_risk);
    print_cohort("Fever", &report.cohorts.fever);
    print_cohort("Data quality", &report.cohorts.data_quality);

    if let Some(result) = &report.submission {
        print_submission(result);
    }
}

fn print_cohort(label: &str, ids: &[String]) {
    if ids.is_empty() {
        println!("\n{label}: none");
    } else {
        println!("\n{label} ({}): {}", ids.len(), ids.join(", "));
    }
}

pub fn print_submission(result: &SubmissionResult) {
    println!("\nSubmission result");
    for (label, key) in [
        ("Status:    ", "status"),
        ("Score:     ", "score"),
        ("Percentage:", "percentage"),
    ] {
        if let Some(value) = result.get(key).filter(|v| !v.is_null()) {
            println!("  {label} {}", display(Some(value)));
        }
    }
    for (cohort, breakdown) in result.breakdown() {
        println!(
            "  {cohort}: {}/{} ({} matches of {} submitted)",
            count(breakdown.score()),
            count(breakdown.max()),
            count(breakdown.matches()),
            count(breakdown.submitted())
        );
    }
    if let Some(remaining) = result.get("remaining_attempts").filter(|v| !v.is_null()) {
        println!("  Remaining attempts: {}", display(Some(remaining)));
    }
}

fn count(value: Option<&Number>) -> String {
    value.map_or_else(|| "-".to_string(), Number::to_string)
}

/// Strings print bare, anything else as compact JSON, absent or null as `-`.
fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
