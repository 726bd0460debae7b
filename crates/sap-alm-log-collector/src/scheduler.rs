// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fixed-cadence collection loop.
//!
//! ```text
//!   Idle ──> FetchingSource ──> Traversing ──> Forwarding ──┐
//!    ^            ^                                         │ next source
//!    │            └─────────────────────────────────────────┘
//!    └── Sleeping <── all sources done
//! ```
//!
//! Sources and records are handled strictly one after the other. A failing source or record is
//! logged and skipped; the cycle always moves on. The sleep between cycles is
//! `interval - elapsed`, so a slow cycle shortens the next wait instead of shifting the schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{Config, SourceSpec};
use crate::fetcher::SourceFetcher;
use crate::forwarder::{ForwardUnit, LogForwarder};
use crate::transform::record_id;
use crate::traversal::{is_empty_payload, traverse};

/// Timing knobs of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub source_pause: Duration,
    pub scope_pause: Duration,
    pub fault_cooldown: Duration,
    pub env_tag: String,
}

impl From<&Config> for SchedulerSettings {
    fn from(config: &Config) -> Self {
        SchedulerSettings {
            interval: config.collection_interval,
            source_pause: config.source_pause,
            scope_pause: config.scope_pause,
            fault_cooldown: config.fault_cooldown,
            env_tag: config.intake.env_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    /// No endpoint configured, nothing was fetched.
    Skipped,
    FetchFailed,
    /// The source answered with an empty object or list.
    Empty,
    Processed,
    /// The collector was asked to stop before the source was reached.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub identifier: String,
    pub outcome: SourceOutcome,
    pub records_seen: usize,
    pub records_forwarded: usize,
    /// Records dropped by the source's transform.
    pub records_filtered: usize,
    pub forward_failures: usize,
}

impl SourceReport {
    fn new(identifier: &str, outcome: SourceOutcome) -> Self {
        SourceReport {
            identifier: identifier.to_string(),
            outcome,
            records_seen: 0,
            records_forwarded: 0,
            records_filtered: 0,
            forward_failures: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub sources: Vec<SourceReport>,
    pub elapsed: Duration,
}

impl CycleReport {
    #[must_use]
    pub fn records_forwarded(&self) -> usize {
        self.sources.iter().map(|s| s.records_forwarded).sum()
    }

    #[must_use]
    pub fn forward_failures(&self) -> usize {
        self.sources.iter().map(|s| s.forward_failures).sum()
    }

    #[must_use]
    pub fn failed_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.outcome == SourceOutcome::FetchFailed)
            .count()
    }
}

/// Time left to wait before the next cycle. Never negative: a cycle that overran the interval is
/// followed immediately by the next one.
#[must_use]
pub fn compute_sleep(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Sleeps for `duration` unless cancelled first. Returns `false` on cancellation.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        () = cancel.cancelled() => false,
        () = sleep(duration) => true,
    }
}

pub struct CollectionScheduler<F, W> {
    sources: Vec<SourceSpec>,
    fetcher: F,
    forwarder: W,
    settings: SchedulerSettings,
}

impl<F, W> CollectionScheduler<F, W>
where
    F: SourceFetcher + Send + Sync + 'static,
    W: LogForwarder + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(
        sources: Vec<SourceSpec>,
        fetcher: F,
        forwarder: W,
        settings: SchedulerSettings,
    ) -> Self {
        CollectionScheduler {
            sources,
            fetcher,
            forwarder,
            settings,
        }
    }

    /// Runs cycles until `cancel` fires.
    ///
    /// Each cycle runs in its own task so that a panic inside it is contained: it is logged as
    /// critical and the loop resumes after the fault cooldown.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            "Starting collector with an interval of {} seconds over {} source(s)",
            self.settings.interval.as_secs(),
            self.sources.len()
        );

        let mut cycle: u64 = 0;
        while !cancel.is_cancelled() {
            cycle += 1;
            let start = Instant::now();

            let this = Arc::clone(&self);
            let cycle_cancel = cancel.clone();
            let handle = tokio::spawn(
                async move { this.run_cycle(&cycle_cancel).await }
                    .instrument(info_span!("cycle", n = cycle)),
            );

            let wait = match handle.await {
                Ok(report) => {
                    info!(
                        "--- Collection cycle {cycle} finished in {:.2} seconds: {} record(s) forwarded, {} forward failure(s), {} source(s) failed ---",
                        report.elapsed.as_secs_f64(),
                        report.records_forwarded(),
                        report.forward_failures(),
                        report.failed_sources(),
                    );
                    compute_sleep(self.settings.interval, start.elapsed())
                }
                Err(e) => {
                    error!("CRITICAL unexpected error in collection cycle {cycle}: {e}");
                    info!(
                        "Waiting {} seconds before resuming collection",
                        self.settings.fault_cooldown.as_secs()
                    );
                    self.settings.fault_cooldown
                }
            };

            if cancel.is_cancelled() {
                break;
            }
            info!("Waiting {:.2} seconds for the next cycle", wait.as_secs_f64());
            if !pause(wait, &cancel).await {
                break;
            }
        }
        info!("Collector stopped");
    }

    /// One pass over every configured source.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        info!("--- Starting collection cycle ---");
        let start = Instant::now();
        let mut sources = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            if cancel.is_cancelled() {
                sources.push(SourceReport::new(&source.identifier, SourceOutcome::Cancelled));
                continue;
            }

            let span = info_span!("source", id = %source.identifier);
            let report = self.process_source(source, cancel).instrument(span).await;
            let fetched = report.outcome != SourceOutcome::Skipped;
            sources.push(report);

            if fetched {
                pause(self.settings.source_pause, cancel).await;
            }
        }

        CycleReport {
            sources,
            elapsed: start.elapsed(),
        }
    }

    async fn process_source(&self, source: &SourceSpec, cancel: &CancellationToken) -> SourceReport {
        info!("Processing source '{}'", source.identifier);
        if source.endpoint.trim().is_empty() {
            warn!(
                "URL for source '{}' is empty in the configuration, skipping",
                source.identifier
            );
            return SourceReport::new(&source.identifier, SourceOutcome::Skipped);
        }

        let payload = match self.fetcher.fetch(source).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    "Failed to fetch data for source '{}', skipping until next cycle: {e}",
                    source.identifier
                );
                return SourceReport::new(&source.identifier, SourceOutcome::FetchFailed);
            }
        };

        if is_empty_payload(&payload) {
            info!(
                "Payload from source '{}' is empty, nothing to send",
                source.identifier
            );
            return SourceReport::new(&source.identifier, SourceOutcome::Empty);
        }

        let mut report = SourceReport::new(&source.identifier, SourceOutcome::Processed);
        let traversal = traverse(&payload);
        for e in &traversal.errors {
            warn!("Skipping part of the payload from '{}': {e}", source.identifier);
        }
        debug!(
            "Found {} record(s) in {} resourceLog(s) from '{}'",
            traversal.record_count(),
            traversal.resources.len(),
            source.identifier
        );

        'resources: for resource in &traversal.resources {
            for scope in &resource.scopes {
                let mut attempted = false;
                for record in &scope.records {
                    report.records_seen += 1;
                    let Some(message) = source.kind.transform(record) else {
                        debug!("Record {} has no forwardable content, skipping", record_id(record));
                        report.records_filtered += 1;
                        continue;
                    };

                    attempted = true;
                    let unit = ForwardUnit::new(
                        message,
                        &resource.attributes,
                        &source.identifier,
                        &self.settings.env_tag,
                    );
                    match self.forwarder.forward(&unit).await {
                        Ok(()) => report.records_forwarded += 1,
                        Err(e) => {
                            error!("Dropping record {}: {e}", record_id(record));
                            report.forward_failures += 1;
                        }
                    }
                }
                if attempted && !pause(self.settings.scope_pause, cancel).await {
                    break 'resources;
                }
            }
        }

        info!(
            "Source '{}': {} record(s) seen, {} forwarded, {} filtered, {} failed",
            source.identifier,
            report.records_seen,
            report.records_forwarded,
            report.records_filtered,
            report.forward_failures
        );
        report
    }
}
