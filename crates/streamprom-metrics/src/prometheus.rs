//! Prometheus text exposition format.
//!
//! Renders family snapshots into the Prometheus text format (0.0.4) for
//! scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use crate::sample::{MetricFamilySnapshot, Sample};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render family snapshots into Prometheus text format.
pub fn render_prometheus(families: &[MetricFamilySnapshot]) -> String {
    let mut out = String::new();

    for family in families {
        let _ = writeln!(out, "# HELP {} {}", family.name, escape_help(&family.help));
        let _ = writeln!(out, "# TYPE {} {}", family.name, family.metric_type);
        for sample in &family.samples {
            render_sample(&mut out, sample);
        }
    }

    out
}

fn render_sample(out: &mut String, sample: &Sample) {
    out.push_str(&sample.name);

    if !sample.label_names.is_empty() {
        out.push('{');
        for (i, (name, value)) in sample.labels().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}=\"{}\"", name, escape_label_value(value));
        }
        out.push('}');
    }

    let _ = write!(out, " {}", format_value(sample.value));
    if let Some(ts) = sample.timestamp_ms {
        let _ = write!(out, " {ts}");
    }
    out.push('\n');
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
