//! Metrics definitions for the signup API.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SIGNUP_REQUESTS: MetricDef = MetricDef {
    name: "signup.requests",
    metric_type: MetricType::Counter,
    description: "Signup submissions handled. Tagged with the response status.",
};

pub const SIGNUP_DURATION: MetricDef = MetricDef {
    name: "signup.duration",
    metric_type: MetricType::Histogram,
    description: "Time to answer a signup submission in seconds, retries included",
};

pub const APPEND_ATTEMPTS: MetricDef = MetricDef {
    name: "signup.append.attempts",
    metric_type: MetricType::Counter,
    description: "Calls made to the spreadsheet append API",
};

pub const APPEND_RETRIES: MetricDef = MetricDef {
    name: "signup.append.retries",
    metric_type: MetricType::Counter,
    description: "Append calls retried after a rate-limit response",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SIGNUP_REQUESTS,
    SIGNUP_DURATION,
    APPEND_ATTEMPTS,
    APPEND_RETRIES,
];
