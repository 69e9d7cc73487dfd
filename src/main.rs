// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use agent_builder_server::{config::Config, error::ServerError, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; real deployments set the environment.
    let _ = dotenvy::dotenv();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> Result<(), ServerError> {
    // Logging needs the config; fall back to the default format to report
    // a config that does not parse.
    let config = Config::from_env().inspect_err(|_| logging::init(Default::default()))?;
    logging::init(config.log_format);
    run(config).await
}
