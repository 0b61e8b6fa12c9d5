//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

mod config;
mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{App, Arg};
use confd_commit::{CommitManager, ComponentSpec, ProcessScriptExecutor};
use confd_session::SessionManager;
use confd_tree::{RunningCell, Tree};
use config::{Config, LoggingFmtStyle};
use tracing::info;
use tracing_subscriber::prelude::*;

fn init_tracing(config: &config::Logging) {
    let log_level_filter = tracing::level_filters::LevelFilter::from_level(tracing::Level::TRACE);
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(config.stdout.show_thread_id)
        .with_file(config.stdout.show_source)
        .with_line_number(config.stdout.show_source)
        .with_ansi(config.stdout.colors);
    let layer = match config.stdout.style {
        LoggingFmtStyle::Compact => layer.compact().boxed(),
        LoggingFmtStyle::Full => layer.boxed(),
        LoggingFmtStyle::Json => layer.json().boxed(),
        LoggingFmtStyle::Pretty => layer.pretty().boxed(),
    };

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("confd=debug".parse().unwrap())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer.with_filter(log_level_filter))
        .init();
}

fn main() {
    // Parse command-line parameters.
    let matches = App::new("confd")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    // Initialize tracing.
    init_tracing(&config.logging);

    // Set panic handler to abort the process if any child task panics.
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    info!("starting up");

    let schema = demo::schema();
    let running = RunningCell::new(Tree::empty(schema.clone()));
    let components = vec![ComponentSpec {
        name: "system".to_owned(),
        owned_namespaces: vec!["sys".to_owned(), "if".to_owned()],
        before: Vec::new(),
        after: Vec::new(),
        is_default: true,
    }];
    let commit_manager = CommitManager::new(
        running.clone(),
        components,
        Arc::new(demo::LoggingComponents),
        Arc::new(ProcessScriptExecutor),
        PathBuf::from(&config.pre_commit_dir),
        PathBuf::from(&config.post_commit_dir),
        PathBuf::from(&config.running_config_path),
    );
    let _sessions = Arc::new(SessionManager::new(
        running,
        schema,
        commit_manager,
        Arc::new(ProcessScriptExecutor),
    ));

    // We're ready to go! A real front-end (NETCONF/CLI/gRPC transport) would
    // now accept client connections and drive `SessionManager`/`Session`
    // through this process; wiring that transport is outside this crate's
    // scope.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime");
    runtime.block_on(async {
        tokio::signal::ctrl_c().await.ok();
    });
}
