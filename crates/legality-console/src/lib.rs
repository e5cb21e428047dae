//! Colorful console output for legality runs.
//!
//! Provides a custom `tracing` layer that renders estimator, shard, merge
//! and analysis events as colored lines on stdout.

use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "legality_sampler=info,legality_cli=info";

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. `RUST_LOG`
/// overrides [`DEFAULT_DIRECTIVES`].
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(LegalityConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats legality events with colors.
pub struct LegalityConsoleLayer;

impl<S: Subscriber> Layer<S> for LegalityConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("legality") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        if let Some(output) = format_event(*metadata.level(), metadata.target(), &visitor) {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    message: Option<String>,
    error: Option<String>,
    path: Option<String>,
    output: Option<String>,
    work_dir: Option<String>,

    class_id: Option<u64>,
    sample_size: Option<u64>,
    failed: Option<u64>,
    duration_ms: Option<u64>,
    shard: Option<u64>,
    start: Option<u64>,
    end: Option<u64>,
    classes: Option<u64>,
    shards: Option<u64>,
    workers: Option<u64>,
    observations: Option<u64>,
    classes_sampled: Option<u64>,
    classes_resumed: Option<u64>,
    prior_classes: Option<u64>,
    files: Option<u64>,
    rows_read: Option<u64>,
    rows_written: Option<u64>,
    duplicates: Option<u64>,
    sampled: Option<u64>,
    unsampled: Option<u64>,

    legal_ratio: Option<f64>,
    std_error: Option<f64>,
    total_theoretical: Option<f64>,
    total_estimated_legal: Option<f64>,
    legal_fraction: Option<f64>,
    global_std: Option<f64>,
    relative_uncertainty: Option<f64>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value).trim_matches('"').to_string();
        self.record_str(field, &s);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "event" => &mut self.event,
            "message" => &mut self.message,
            "error" => &mut self.error,
            "path" | "input_dir" => &mut self.path,
            "output" => &mut self.output,
            "work_dir" => &mut self.work_dir,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let slot = match field.name() {
            "class_id" => &mut self.class_id,
            "sample_size" => &mut self.sample_size,
            "failed" => &mut self.failed,
            "duration_ms" => &mut self.duration_ms,
            "shard" => &mut self.shard,
            "start" => &mut self.start,
            "end" => &mut self.end,
            "classes" => &mut self.classes,
            "shards" => &mut self.shards,
            "workers" => &mut self.workers,
            "observations" => &mut self.observations,
            "classes_sampled" => &mut self.classes_sampled,
            "classes_resumed" => &mut self.classes_resumed,
            "prior_classes" => &mut self.prior_classes,
            "files" => &mut self.files,
            "rows_read" => &mut self.rows_read,
            "rows_written" => &mut self.rows_written,
            "duplicates" => &mut self.duplicates,
            "sampled" => &mut self.sampled,
            "unsampled" => &mut self.unsampled,
            _ => return,
        };
        *slot = Some(value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let slot = match field.name() {
            "legal_ratio" => &mut self.legal_ratio,
            "std_error" => &mut self.std_error,
            "total_theoretical" => &mut self.total_theoretical,
            "total_estimated_legal" => &mut self.total_estimated_legal,
            "legal_fraction" => &mut self.legal_fraction,
            "global_std" => &mut self.global_std,
            "relative_uncertainty" => &mut self.relative_uncertainty,
            _ => return,
        };
        *slot = Some(value);
    }
}

fn format_event(level: Level, target: &str, v: &EventVisitor) -> Option<String> {
    let formatted = match v.event.as_deref() {
        Some("run_start") => format_run_start(v),
        Some("shard_start") => format_shard_start(v),
        Some("class_sampled") => format_class_sampled(v),
        Some("shard_end") => format_shard_end(v),
        Some("shard_failed") => format_shard_failed(v),
        Some("run_end") => format_run_end(v),
        Some("merge_end") => format_merge_end(v),
        Some("analysis_summary") => format_analysis_summary(v),
        Some("enumerate_progress") | Some("enumerate_end") => format_enumerate(v),
        _ => return format_plain(level, target, v),
    };
    Some(formatted)
}

fn prefix(level: Level, tag: &str) -> String {
    let level = match level {
        Level::ERROR => "ERROR".bright_red().bold().to_string(),
        Level::WARN => " WARN".yellow().to_string(),
        Level::INFO => " INFO".bright_green().to_string(),
        Level::DEBUG => "DEBUG".bright_blue().to_string(),
        Level::TRACE => "TRACE".bright_black().to_string(),
    };
    format!(
        "{} {} {}",
        timestamp().bright_black(),
        level,
        format!("[{}]", tag).bright_cyan()
    )
}

fn count(n: Option<u64>) -> String {
    n.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn format_run_start(v: &EventVisitor) -> String {
    format!(
        "{} Sampling {} classes in {} shards on {} workers ({})",
        prefix(Level::INFO, "Run"),
        count(v.classes).bright_yellow(),
        count(v.shards).bright_yellow(),
        count(v.workers).bright_yellow(),
        v.work_dir.as_deref().unwrap_or(".").white()
    )
}

fn format_shard_start(v: &EventVisitor) -> String {
    format!(
        "{} classes {}..{} started, {} resumed from artifact",
        prefix(Level::INFO, &format!("Shard {}", v.shard.unwrap_or(0))),
        v.start.unwrap_or(0),
        v.end.unwrap_or(0),
        count(v.prior_classes).yellow()
    )
}

fn format_class_sampled(v: &EventVisitor) -> String {
    let mut line = format!(
        "    {} class {:>7} | n = {:>9} | ratio {} | se {} | {}",
        "->".bright_blue(),
        count(v.class_id).white(),
        count(v.sample_size),
        format_ratio(v.legal_ratio.unwrap_or(0.0)),
        format!("{:.3e}", v.std_error.unwrap_or(0.0)).white(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).bright_black()
    );
    if let Some(failed) = v.failed.filter(|&f| f > 0) {
        line.push_str(&format!(" | {} failed", failed).yellow().to_string());
    }
    line
}

fn format_shard_end(v: &EventVisitor) -> String {
    format!(
        "{} ended: time spent ({}), classes sampled ({}), resumed ({}), observations ({})",
        prefix(Level::INFO, &format!("Shard {}", v.shard.unwrap_or(0))),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        count(v.classes_sampled).bright_magenta(),
        count(v.classes_resumed).white(),
        count(v.observations).bright_magenta().bold()
    )
}

fn format_shard_failed(v: &EventVisitor) -> String {
    format!(
        "{} classes {}..{} excluded: {}",
        prefix(Level::ERROR, &format!("Shard {}", v.shard.unwrap_or(0))),
        v.start.unwrap_or(0),
        v.end.unwrap_or(0),
        v.error.as_deref().unwrap_or("unknown error").bright_red()
    )
}

fn format_run_end(v: &EventVisitor) -> String {
    let failed = v.failed.unwrap_or(0);
    let failed = if failed > 0 {
        failed.to_string().bright_red().bold().to_string()
    } else {
        failed.to_string().bright_green().to_string()
    };
    format!(
        "{} Sampling ended: time spent ({}), shards ({}), failed ({}), observations ({})",
        prefix(Level::INFO, "Run"),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        count(v.shards).white(),
        failed,
        count(v.observations).bright_magenta().bold()
    )
}

fn format_merge_end(v: &EventVisitor) -> String {
    format!(
        "{} {} files, {} rows read, {} written, {} duplicates -> {}",
        prefix(Level::INFO, "Merge"),
        count(v.files).bright_yellow(),
        count(v.rows_read).white(),
        count(v.rows_written).bright_magenta().bold(),
        count(v.duplicates).white(),
        v.output.as_deref().unwrap_or("").white()
    )
}

fn format_enumerate(v: &EventVisitor) -> String {
    let done = v.event.as_deref() == Some("enumerate_end");
    format!(
        "{} {} {} classes{}",
        prefix(Level::INFO, "Enumerate"),
        if done { "wrote" } else { "written" },
        count(v.classes).bright_yellow(),
        v.output
            .as_deref()
            .filter(|_| done)
            .map(|o| format!(" to {}", o))
            .unwrap_or_default()
    )
}

fn format_analysis_summary(v: &EventVisitor) -> String {
    let rows = [
        ("Total theoretical:", format_sci(v.total_theoretical)),
        ("Estimated legal:", format_sci(v.total_estimated_legal)),
        ("Legal fraction:", format_sci(v.legal_fraction)),
        ("Global std error:", format_sci(v.global_std)),
        ("Relative uncertainty:", format_sci(v.relative_uncertainty)),
        (
            "Classes sampled:",
            format!("{} / {}", count(v.sampled), count(v.classes)),
        ),
    ];

    let mut output = format!(
        "{} Analysis of {} classes ({} unsampled)",
        prefix(Level::INFO, "Analysis"),
        count(v.classes).bright_yellow(),
        count(v.unsampled).white()
    );
    output.push_str("\n\n");
    output.push_str(&"╔══════════════════════════════════════════════════════════╗".bright_cyan().to_string());
    output.push('\n');
    for (label, value) in rows {
        output.push_str(&format!(
            "{}  {:<22}{:>32}  {}",
            "║".bright_cyan(),
            label,
            value,
            "║".bright_cyan()
        ));
        output.push('\n');
    }
    output.push_str(&"╚══════════════════════════════════════════════════════════╝".bright_cyan().to_string());
    output.push('\n');
    output
}

fn format_plain(level: Level, target: &str, v: &EventVisitor) -> Option<String> {
    if level > Level::INFO && v.message.is_none() {
        return None;
    }
    let tag = target.rsplit("::").next().unwrap_or(target);
    let mut line = format!(
        "{} {}",
        prefix(level, tag),
        v.message.as_deref().or(v.event.as_deref()).unwrap_or("")
    );
    if let Some(class_id) = v.class_id {
        line.push_str(&format!(" (class {})", class_id));
    }
    if let Some(path) = &v.path {
        line.push_str(&format!(" {}", path.white()));
    }
    if let Some(error) = &v.error {
        line.push_str(&format!(": {}", error.bright_red()));
    }
    Some(line)
}

fn format_ratio(ratio: f64) -> String {
    let s = format!("{:.4e}", ratio);
    if ratio == 0.0 {
        s.bright_red().to_string()
    } else if ratio >= 0.5 {
        s.bright_green().to_string()
    } else {
        s.yellow().to_string()
    }
}

fn format_sci(value: Option<f64>) -> String {
    match value {
        Some(x) if x.is_nan() => "undefined".to_string(),
        Some(x) => format!("{:.6e}", x),
        None => "N/A".to_string(),
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_class_sampled_line() {
        let v = EventVisitor {
            event: Some("class_sampled".into()),
            class_id: Some(12),
            sample_size: Some(128_000),
            legal_ratio: Some(0.25),
            std_error: Some(0.001),
            failed: Some(3),
            duration_ms: Some(40),
            ..Default::default()
        };
        let line = format_event(Level::INFO, "legality_sampler::estimator", &v).unwrap();
        assert!(line.contains("128,000"));
        assert!(line.contains("2.5000e-1"));
        assert!(line.contains("3 failed"));
    }

    #[test]
    fn test_analysis_summary_marks_undefined() {
        let v = EventVisitor {
            event: Some("analysis_summary".into()),
            classes: Some(2),
            legal_fraction: Some(f64::NAN),
            ..Default::default()
        };
        let output = format_event(Level::INFO, "legality_sampler::analysis", &v).unwrap();
        assert!(output.contains("undefined"));
        assert!(output.contains("Legal fraction:"));
    }

    #[test]
    fn test_unstructured_debug_events_are_dropped() {
        let v = EventVisitor {
            event: Some("class_done".into()),
            ..Default::default()
        };
        assert!(format_event(Level::DEBUG, "legality_sampler::estimator", &v).is_none());

        let warn = EventVisitor {
            event: Some("results_missing".into()),
            message: Some("no results table".into()),
            path: Some("results.jsonl".into()),
            ..Default::default()
        };
        let line = format_event(Level::WARN, "legality_sampler::analysis", &warn).unwrap();
        assert!(line.contains("no results table"));
        assert!(line.contains("[analysis]"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
