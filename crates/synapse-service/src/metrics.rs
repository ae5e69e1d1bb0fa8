//! Lightweight Prometheus-compatible metrics using atomic counters.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::classify::HttpStatus;
use crate::error::ConditionType;

/// Application-wide metrics collected via atomic counters.
pub struct Metrics {
    queries_total: AtomicU64,
    query_errors_total: AtomicU64,
    /// Accumulated translation time stored as microseconds.
    query_duration_us_sum: AtomicU64,
    query_duration_count: AtomicU64,
    /// Classified failures, indexed by `ConditionType as usize`.
    failures: [AtomicU64; ConditionType::ALL.len()],
    /// Classified failures, indexed by `HttpStatus as usize`.
    failures_by_status: [AtomicU64; HttpStatus::ALL.len()],
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            queries_total: AtomicU64::new(0),
            query_errors_total: AtomicU64::new(0),
            query_duration_us_sum: AtomicU64::new(0),
            query_duration_count: AtomicU64::new(0),
            failures: [const { AtomicU64::new(0) }; ConditionType::ALL.len()],
            failures_by_status: [const { AtomicU64::new(0) }; HttpStatus::ALL.len()],
        }
    }

    /// Record a successful translation.
    pub fn record_query(&self, duration_us: u64) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.query_duration_us_sum
            .fetch_add(duration_us, Ordering::Relaxed);
        self.query_duration_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected query.
    pub fn record_query_error(&self) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.query_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failure after it has been classified.
    pub fn record_failure(&self, condition: ConditionType, status: HttpStatus) {
        self.failures[condition as usize].fetch_add(1, Ordering::Relaxed);
        self.failures_by_status[status as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn failures(&self, condition: ConditionType) -> u64 {
        self.failures[condition as usize].load(Ordering::Relaxed)
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self, uptime_seconds: u64) -> String {
        let mut out = String::with_capacity(2048);

        gauge(
            &mut out,
            "synapse_uptime_seconds",
            "Server uptime in seconds",
            uptime_seconds,
        );

        counter(
            &mut out,
            "synapse_queries_total",
            "Total queries translated.",
            self.queries_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "synapse_query_errors_total",
            "Total queries rejected.",
            self.query_errors_total.load(Ordering::Relaxed),
        );

        let us = self.query_duration_us_sum.load(Ordering::Relaxed);
        let secs = us as f64 / 1_000_000.0;
        writeln!(
            out,
            "# HELP synapse_query_duration_seconds_sum Total query translation time in seconds."
        )
        .unwrap();
        writeln!(out, "# TYPE synapse_query_duration_seconds_sum counter").unwrap();
        writeln!(out, "synapse_query_duration_seconds_sum {secs:.6}").unwrap();

        counter(
            &mut out,
            "synapse_query_duration_seconds_count",
            "Total number of timed queries.",
            self.query_duration_count.load(Ordering::Relaxed),
        );

        writeln!(
            out,
            "# HELP synapse_failures_total Failures by condition, after classification."
        )
        .unwrap();
        writeln!(out, "# TYPE synapse_failures_total counter").unwrap();
        for condition in ConditionType::ALL {
            let label = condition.label();
            let count = self.failures(condition);
            writeln!(
                out,
                "synapse_failures_total{{condition=\"{label}\"}} {count}"
            )
            .unwrap();
        }

        writeln!(
            out,
            "# HELP synapse_responses_failed_total Failure responses by HTTP status."
        )
        .unwrap();
        writeln!(out, "# TYPE synapse_responses_failed_total counter").unwrap();
        for status in HttpStatus::ALL {
            let code = status.code();
            let count = self.failures_by_status[status as usize].load(Ordering::Relaxed);
            writeln!(
                out,
                "synapse_responses_failed_total{{status=\"{code}\"}} {count}"
            )
            .unwrap();
        }

        out
    }
}

fn gauge(out: &mut String, name: &str, help: &str, value: impl std::fmt::Display) {
    writeln!(out, "# HELP {name} {help}").unwrap();
    writeln!(out, "# TYPE {name} gauge").unwrap();
    writeln!(out, "{name} {value}").unwrap();
}

fn counter(out: &mut String, name: &str, help: &str, value: u64) {
    writeln!(out, "# HELP {name} {help}").unwrap();
    writeln!(out, "# TYPE {name} counter").unwrap();
    writeln!(out, "{name} {value}").unwrap();
}
