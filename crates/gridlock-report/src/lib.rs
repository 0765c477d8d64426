#![deny(missing_docs)]

//! Best-effort push of named metrics and parameters to a Prometheus
//! pushgateway.
//!
//! The coordinator treats this crate as a fire-and-forget sink: observations
//! are enqueued on a bounded channel and a background worker delivers them
//! with a bounded number of retries. Enqueueing never blocks; when the queue
//! is full the observation is dropped and counted. Training loops must never
//! stall on monitoring.

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use gridlock_core::{ErrorInfo, GridlockError};
use tracing::{debug, warn};

/// Environment variable naming the pushgateway base URL.
pub const GATEWAY_URL_VAR: &str = "reporterGatewayURL";

/// Environment variable carrying the pod identity used as the grouping key.
pub const POD_UUID_VAR: &str = "podUUID";

/// Grouping key attached to every push.
pub const GROUPING_KEY: &str = "podUUID";

const JOB_NAME: &str = "reporter_pod_info";
const METRIC_PREFIX: &str = "gridlock_push_gateway_metric";
const PARAMETER_PREFIX: &str = "gridlock_push_gateway_parameter";

/// A single name/value pair tagged as metric or parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Numeric training metric, e.g. loss or accuracy.
    Metric {
        /// Metric name as labeled on the gauge.
        name: String,
        /// Observed value.
        value: f64,
    },
    /// Run parameter reported once per run, carried in labels with a fixed
    /// gauge value of 1.
    Parameter {
        /// Parameter name as labeled on the gauge.
        name: String,
        /// Parameter value rendered into the label set.
        value: String,
    },
}

/// Delivery configuration for a [`Reporter`].
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Base URL of the pushgateway, without a trailing slash.
    pub gateway_url: String,
    /// Job segment of the push URL.
    pub job: String,
    /// Value of the `podUUID` grouping key.
    pub grouping_value: String,
    /// Bounded queue capacity; a full queue drops new observations.
    pub queue_capacity: usize,
    /// Delivery attempts per observation before giving up.
    pub retry_limit: usize,
    /// Pause between delivery attempts.
    pub retry_delay: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ReporterConfig {
    /// Creates a configuration with default queue and retry settings.
    pub fn new(gateway_url: impl Into<String>, grouping_value: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            job: JOB_NAME.to_string(),
            grouping_value: grouping_value.into(),
            queue_capacity: 64,
            retry_limit: 3,
            retry_delay: Duration::from_millis(200),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Builds the configuration from the `reporterGatewayURL` and `podUUID`
    /// environment variables.
    pub fn from_env() -> Result<Self, GridlockError> {
        let gateway_url = require_env(GATEWAY_URL_VAR)?;
        let grouping_value = require_env(POD_UUID_VAR)?;
        Ok(Self::new(gateway_url, grouping_value))
    }
}

fn require_env(name: &str) -> Result<String, GridlockError> {
    env::var(name).map_err(|_| {
        GridlockError::Report(
            ErrorInfo::new("reporter-env", "required environment variable is not set")
                .with_context("variable", name),
        )
    })
}

/// Asynchronous, retry-bounded, best-effort observation publisher.
///
/// Dropping or shutting down the reporter drains observations already queued
/// before letting the worker exit.
#[derive(Debug)]
pub struct Reporter {
    sender: Option<SyncSender<Observation>>,
    worker: Option<thread::JoinHandle<()>>,
    dropped: AtomicU64,
}

impl Reporter {
    /// Builds the HTTP client and spawns the delivery worker.
    pub fn spawn(config: ReporterConfig) -> Result<Self, GridlockError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| {
                GridlockError::Report(ErrorInfo::new("reporter-client", err.to_string()))
            })?;
        let (sender, receiver) = sync_channel(config.queue_capacity);
        let worker = thread::spawn(move || deliver(receiver, client, config));
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            dropped: AtomicU64::new(0),
        })
    }

    /// Enqueues a numeric metric observation. Never blocks.
    pub fn metric(&self, name: impl Into<String>, value: f64) {
        self.enqueue(Observation::Metric {
            name: name.into(),
            value,
        });
    }

    /// Enqueues a parameter observation. Never blocks.
    pub fn parameter(&self, name: impl Into<String>, value: impl Into<String>) {
        self.enqueue(Observation::Parameter {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Enqueues an observation, dropping it when the queue is full.
    pub fn enqueue(&self, observation: Observation) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(observation) {
            Ok(()) => {}
            Err(TrySendError::Full(observation)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(?observation, "reporter queue full, dropping observation");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Returns how many observations were dropped because the queue was
    /// full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drains queued observations and joins the worker.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.close();
    }
}

fn deliver(
    receiver: Receiver<Observation>,
    client: reqwest::blocking::Client,
    config: ReporterConfig,
) {
    let url = push_url(&config);
    for observation in receiver {
        let body = encode(&observation);
        let mut delivered = false;
        for attempt in 1..=config.retry_limit.max(1) {
            let outcome = client
                .post(&url)
                .header("Content-Type", "text/plain; version=0.0.4")
                .body(body.clone())
                .send();
            match outcome {
                Ok(response) if response.status().is_success() => {
                    delivered = true;
                    break;
                }
                Ok(response) => {
                    warn!(status = %response.status(), attempt, "pushgateway rejected observation");
                }
                Err(err) => {
                    warn!(error = %err, attempt, "pushgateway delivery failed");
                }
            }
            if attempt < config.retry_limit.max(1) {
                thread::sleep(config.retry_delay);
            }
        }
        if !delivered {
            debug!(?observation, "giving up on observation after bounded retries");
        }
    }
}

fn push_url(config: &ReporterConfig) -> String {
    format!(
        "{}/metrics/job/{}/{}/{}",
        config.gateway_url.trim_end_matches('/'),
        config.job,
        GROUPING_KEY,
        config.grouping_value
    )
}

fn encode(observation: &Observation) -> String {
    match observation {
        Observation::Metric { name, value } => {
            let gauge = format!("{METRIC_PREFIX}_{}", sanitize(name));
            format!(
                "# TYPE {gauge} gauge\n{gauge}{{metric_name=\"{}\",push_gateway_type=\"metric\"}} {value}\n",
                escape_label(name)
            )
        }
        Observation::Parameter { name, value } => {
            let gauge = format!("{PARAMETER_PREFIX}_{}", sanitize(name));
            format!(
                "# TYPE {gauge} gauge\n{gauge}{{param_name=\"{}\",param_value=\"{}\",push_gateway_type=\"parameter\"}} 1\n",
                escape_label(name),
                escape_label(value)
            )
        }
    }
}

/// Rewrites a name into the metric-name charset `[a-zA-Z0-9_]`, prefixing an
/// underscore when the name would start with a digit.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (idx, ch) in name.chars().enumerate() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if idx == 0 && ch.is_ascii_digit() {
                out.push('_');
            }
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_sanitized() {
        assert_eq!(sanitize("val_loss"), "val_loss");
        assert_eq!(sanitize("loss/train"), "loss_train");
        assert_eq!(sanitize("1cycle"), "_1cycle");
    }

    #[test]
    fn label_values_are_escaped() {
        assert_eq!(escape_label("plain"), "plain");
        assert_eq!(escape_label("a\"b\\c"), "a\\\"b\\\\c");
    }

    #[test]
    fn metric_encoding_matches_the_gauge_scheme() {
        let body = encode(&Observation::Metric {
            name: "loss".to_string(),
            value: 0.31,
        });
        assert!(body.contains("gridlock_push_gateway_metric_loss"));
        assert!(body.contains("metric_name=\"loss\""));
        assert!(body.contains("push_gateway_type=\"metric\""));
        assert!(body.trim_end().ends_with("0.31"));
    }

    #[test]
    fn parameter_encoding_pins_the_gauge_to_one() {
        let body = encode(&Observation::Parameter {
            name: "optimizer".to_string(),
            value: "adam".to_string(),
        });
        assert!(body.contains("gridlock_push_gateway_parameter_optimizer"));
        assert!(body.contains("param_value=\"adam\""));
        assert!(body.trim_end().ends_with(" 1"));
    }

    #[test]
    fn push_url_includes_job_and_grouping_key() {
        let config = ReporterConfig::new("http://gateway:9091/", "pod-1");
        assert_eq!(
            push_url(&config),
            "http://gateway:9091/metrics/job/reporter_pod_info/podUUID/pod-1"
        );
    }
}
