/// Human-readable summary output.
use std::fmt::Write;

use crate::error::AppError;
use crate::output::{Formatter, LoadSummary};

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, summary: &LoadSummary) -> Result<String, AppError> {
        let mut out = String::new();
        let _ = writeln!(out, "Load Test Results");
        let _ = writeln!(out, "=================");
        let _ = writeln!(out, "Total requests:  {}", summary.total_requests);
        let _ = writeln!(
            out,
            "Succeeded:       {} ({:.1}%)",
            summary.succeeded, summary.success_rate
        );
        let _ = writeln!(out, "Failed:          {}", summary.failed);
        let _ = writeln!(
            out,
            "Elapsed:         {:.2}s ({:.1} req/s)",
            summary.elapsed_secs, summary.throughput_rps
        );
        let _ = writeln!(out, "Response bytes:  {}", summary.total_response_bytes);
        let _ = writeln!(
            out,
            "Latency (ms):    avg {:.3} min {:.3} p50 {:.3} p95 {:.3} max {:.3}",
            summary.latency.avg_ms,
            summary.latency.min_ms,
            summary.latency.p50_ms,
            summary.latency.p95_ms,
            summary.latency.max_ms
        );

        if !summary.operations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Per operation:");
            for op in &summary.operations {
                let _ = writeln!(
                    out,
                    "  {:<4} total {:<6} failed {:<6} avg {:.3}ms p95 {:.3}ms",
                    op.request_type, op.total, op.failed, op.latency.avg_ms, op.latency.p95_ms
                );
            }
        }

        if !summary.errors.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Errors:");
            for error in &summary.errors {
                let _ = writeln!(out, "  {:>6}x {}", error.count, error.message);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SummaryBuilder;
    use crate::report::OutcomeRecord;
    use std::time::Duration;

    #[test]
    fn renders_totals_and_errors() {
        let mut builder = SummaryBuilder::new();
        builder.observe(&OutcomeRecord {
            request_type: "GET".into(),
            name: "kv_get".into(),
            response_time_ms: 1.5,
            response_length: 0,
            error: Some("Key not found".into()),
        });
        let summary = builder.finish(Duration::from_secs(1));

        let text = TextFormatter.format(&summary).unwrap();
        assert!(text.contains("Total requests:  1"));
        assert!(text.contains("Failed:          1"));
        assert!(text.contains("Key not found"));
    }
}
