/// Run summary computation and rendering.
mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::error::AppError;
use crate::report::OutcomeRecord;

/// Latency digest over a set of observed response times.
#[derive(Debug, Clone, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
}

impl LatencyStats {
    fn from_samples(samples: &mut Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self {
                count: 0,
                avg_ms: 0.0,
                min_ms: 0.0,
                max_ms: 0.0,
                p50_ms: 0.0,
                p95_ms: 0.0,
            };
        }
        samples.sort_by(|a, b| a.total_cmp(b));
        let count = samples.len();
        let sum: f64 = samples.iter().sum();
        let p95_index = ((count as f64) * 0.95).ceil() as usize;
        let p95_index = p95_index.clamp(0, count - 1);
        Self {
            count,
            avg_ms: sum / count as f64,
            min_ms: samples[0],
            max_ms: samples[count - 1],
            p50_ms: samples[count / 2],
            p95_ms: samples[p95_index],
        }
    }
}

/// Per-operation-kind slice of the summary.
#[derive(Debug, Clone, Serialize)]
pub struct OpBreakdown {
    pub request_type: String,
    pub total: usize,
    pub failed: usize,
    pub latency: LatencyStats,
}

/// Distinct failure message with its occurrence count.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorCount {
    pub message: String,
    pub count: usize,
}

/// Aggregated view of one run, computed from the reporter stream.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub total_requests: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub elapsed_secs: f64,
    pub throughput_rps: f64,
    pub total_response_bytes: u64,
    pub latency: LatencyStats,
    pub operations: Vec<OpBreakdown>,
    pub errors: Vec<ErrorCount>,
}

/// Folds outcome records into a [`LoadSummary`].
#[derive(Default)]
pub struct SummaryBuilder {
    latencies: Vec<f64>,
    per_op: HashMap<String, (usize, usize, Vec<f64>)>,
    errors: HashMap<String, usize>,
    succeeded: usize,
    failed: usize,
    response_bytes: u64,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, record: &OutcomeRecord) {
        self.latencies.push(record.response_time_ms);
        self.response_bytes += record.response_length as u64;

        let entry = self
            .per_op
            .entry(record.request_type.clone())
            .or_insert_with(|| (0, 0, Vec::new()));
        entry.0 += 1;
        entry.2.push(record.response_time_ms);

        match &record.error {
            Some(message) => {
                self.failed += 1;
                entry.1 += 1;
                *self.errors.entry(message.clone()).or_insert(0) += 1;
            }
            None => self.succeeded += 1,
        }
    }

    pub fn finish(mut self, elapsed: Duration) -> LoadSummary {
        let total_requests = self.succeeded + self.failed;
        let success_rate = if total_requests > 0 {
            (self.succeeded as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };
        let elapsed_secs = elapsed.as_secs_f64();
        let throughput_rps = if elapsed_secs > 0.0 {
            total_requests as f64 / elapsed_secs
        } else {
            0.0
        };

        let mut operations: Vec<OpBreakdown> = self
            .per_op
            .into_iter()
            .map(|(request_type, (total, failed, mut samples))| OpBreakdown {
                request_type,
                total,
                failed,
                latency: LatencyStats::from_samples(&mut samples),
            })
            .collect();
        operations.sort_by(|a, b| a.request_type.cmp(&b.request_type));

        let mut errors: Vec<ErrorCount> = self
            .errors
            .into_iter()
            .map(|(message, count)| ErrorCount { message, count })
            .collect();
        errors.sort_by(|a, b| b.count.cmp(&a.count).then(a.message.cmp(&b.message)));

        LoadSummary {
            total_requests,
            succeeded: self.succeeded,
            failed: self.failed,
            success_rate,
            elapsed_secs,
            throughput_rps,
            total_response_bytes: self.response_bytes,
            latency: LatencyStats::from_samples(&mut self.latencies),
            operations,
            errors,
        }
    }
}

/// Renders a summary for the operator.
pub trait Formatter {
    fn format(&self, summary: &LoadSummary) -> Result<String, AppError>;
}
