// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use sap_alm_log_collector::{
    config::{self, Config},
    fetcher::SapAlmFetcher,
    forwarder::DatadogLogForwarder,
    hostname::get_hostname,
    logger,
    scheduler::{CollectionScheduler, SchedulerSettings},
    token::TokenProvider,
};

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> anyhow::Result<()> {
    let config = Config::new();

    let log_level = config.as_ref().map(|c| c.log_level).unwrap_or_default();
    if let Err(e) = logger::init(log_level) {
        eprintln!("Failed to set up logging: {e}");
    }
    debug!("Logging subsystem enabled");

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(
                "Unable to load configuration from '{}': {e}. Shutting down.",
                config::config_path().display()
            );
            return Err(e.into());
        }
    };
    config.log_warnings();
    info!("Loaded {} source(s) from configuration", config.sources.len());

    let https_proxy = config.https_proxy.as_deref();
    let token_provider = TokenProvider::new(config.auth.clone(), https_proxy);
    let fetcher = SapAlmFetcher::new(token_provider, https_proxy);
    let forwarder = DatadogLogForwarder::new(config.intake.clone(), get_hostname(), https_proxy);

    let scheduler = Arc::new(CollectionScheduler::new(
        config.sources.clone(),
        fetcher,
        forwarder,
        SchedulerSettings::from(&config),
    ));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for the interrupt signal: {e}");
            return;
        }
        info!("Collector interrupted, stopping after the current step");
        signal_cancel.cancel();
    });

    scheduler.run(cancel).await;
    Ok(())
}
