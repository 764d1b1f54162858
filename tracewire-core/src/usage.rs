//! Usage record normalization.
//!
//! Providers report token consumption under different names depending on the
//! API (`prompt_tokens` for chat completions, `input_tokens` for responses)
//! and nest breakdowns under `*_tokens_details`. Everything is flattened onto
//! the canonical names used by spans:
//!
//! ```text
//! { "input_tokens": 14,
//!   "input_tokens_details": { "cached_tokens": 3 },
//!   "total_tokens": 20 }
//!
//! => { "prompt_tokens": 14, "prompt_cached_tokens": 3, "tokens": 20 }
//! ```

use serde_json::Value;

use crate::Metrics;

const DETAILS_SUFFIX: &str = "_tokens_details";

fn canonical_name(name: &str) -> &str {
    match name {
        "total_tokens" | "tokens" => "tokens",
        "prompt_tokens" | "input_tokens" => "prompt_tokens",
        "completion_tokens" | "output_tokens" => "completion_tokens",
        other => other,
    }
}

fn canonical_prefix(prefix: &str) -> &str {
    match prefix {
        "input" => "prompt",
        "output" => "completion",
        other => other,
    }
}

/// Flattens a provider usage record into canonical metrics.
///
/// Anything that is not an object yields empty metrics, and non-numeric
/// values are skipped.
pub fn normalize_usage(usage: &Value) -> Metrics {
    let mut metrics = Metrics::new();
    let Some(fields) = usage.as_object() else {
        return metrics;
    };

    for (name, value) in fields {
        if let Some(prefix) = name.strip_suffix(DETAILS_SUFFIX) {
            let Some(details) = value.as_object() else {
                continue;
            };
            let prefix = canonical_prefix(prefix);
            for (detail, detail_value) in details {
                metrics.insert_value(format!("{prefix}_{detail}"), detail_value);
            }
        } else {
            metrics.insert_value(canonical_name(name), value);
        }
    }

    metrics
}

/// The fixed three-field mapping reported by the structured responses API.
pub fn response_usage_metrics(usage: &Value) -> Metrics {
    let mut metrics = Metrics::new();
    for (source, target) in [
        ("total_tokens", "tokens"),
        ("input_tokens", "prompt_tokens"),
        ("output_tokens", "completion_tokens"),
    ] {
        if let Some(value) = usage.get(source) {
            metrics.insert_value(target, value);
        }
    }
    metrics
}
