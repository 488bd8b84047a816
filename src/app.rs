//! Application orchestration layer
//!
//! Wires the command line to the components: resolves the identifier once, builds the fetcher
//! and renderer, and hands both to a [`TailEngine`]. Components receive their collaborators as
//! trait objects, so the same wiring runs against CloudWatch or an in-memory backend.

use crate::backend::{CloudWatchBackend, LogBackend};
use crate::cli::CliOptions;
use crate::config::Config;
use crate::duration;
use crate::engine::{shutdown, ShutdownSignal, TailEngine, TailOptions, TailOutcome};
use crate::error::Result;
use crate::fetcher::{EventFetcher, StreamStrategy};
use crate::render::{EventSink, TerminalRenderer, Theme};
use crate::resolver::{Chooser, ConsoleChooser, Resolution, ResolveMode, SourceResolver};
use chrono::{DateTime, Utc};
use std::io::IsTerminal;
use std::sync::Arc;

/// Everything a run needs besides its collaborators, validated up front
#[derive(Debug, Clone)]
pub struct TailRequest {
    pub identifier: String,
    pub mode: ResolveMode,
    pub use_paginate: bool,
    pub options: TailOptions,
}

impl TailRequest {
    /// Validate `cli` against the current time
    pub fn from_cli(cli: &CliOptions) -> Result<Self> {
        Self::from_cli_at(cli, Utc::now())
    }

    /// Validate `cli`, resolving relative times against `now`
    pub fn from_cli_at(cli: &CliOptions, now: DateTime<Utc>) -> Result<Self> {
        let mode = cli.resolve_mode()?;
        let since = duration::to_epoch_millis(duration::parse_at(&cli.since, now)?);
        let until = cli
            .to
            .as_deref()
            .map(|text| duration::parse_at(text, now).map(duration::to_epoch_millis))
            .transpose()?;

        if let Some(until) = until {
            if until <= since {
                log::warn!("--to ({}) is not after --since ({}); nothing can match", until, since);
            }
        }

        let mut options = TailOptions::new(since);
        options.filter_pattern = cli.filter.clone();
        options.until = until;
        options.keep_open = cli.keep_open;
        options.poll_interval = cli.interval;
        options.limit = cli.limit;

        Ok(Self {
            identifier: cli.identifier.clone(),
            mode,
            use_paginate: cli.use_paginate,
            options,
        })
    }
}

/// Application orchestrator
pub struct Application {
    backend: Arc<dyn LogBackend>,
    resolver: SourceResolver,
    request: TailRequest,
}

impl Application {
    pub fn new(backend: Arc<dyn LogBackend>, config: Config, request: TailRequest) -> Self {
        let resolver = SourceResolver::new(Arc::clone(&backend), config);
        Self {
            backend,
            resolver,
            request,
        }
    }

    /// Resolve the identifier to a target or log set; may prompt through `chooser`
    pub async fn resolve(&self, chooser: &mut dyn Chooser) -> Result<Resolution> {
        self.resolver
            .resolve(&self.request.identifier, self.request.mode, chooser)
            .await
    }

    /// Engine for an already resolved source
    pub fn engine(&self, resolution: Resolution, sink: Box<dyn EventSink>) -> TailEngine {
        let strategy = StreamStrategy::select(
            self.request.use_paginate,
            self.request.options.until.is_some(),
        );
        let fetcher = EventFetcher::new(Arc::clone(&self.backend), strategy);
        TailEngine::new(fetcher, resolution, self.request.options.clone(), sink)
    }

    /// Resolve, then tail until completion, `shutdown`, or failure
    pub async fn tail(
        &self,
        chooser: &mut dyn Chooser,
        sink: Box<dyn EventSink>,
        mut shutdown: ShutdownSignal,
    ) -> Result<TailOutcome> {
        let resolution = self.resolve(chooser).await?;
        let mut engine = self.engine(resolution, sink);
        engine.run(&mut shutdown).await
    }

    /// Interactive run: console prompt, terminal output, Ctrl-C once the tail has started
    pub async fn run(&self, theme: Theme) -> Result<TailOutcome> {
        let mut chooser = ConsoleChooser::stdio();
        let resolution = self.resolve(&mut chooser).await?;

        let (handle, mut signal) = shutdown::channel();
        let listener = shutdown::spawn_ctrl_c_listener(handle);

        let sink = Box::new(TerminalRenderer::stdout(theme));
        let mut engine = self.engine(resolution, sink);
        let outcome = engine.run(&mut signal).await;
        listener.abort();
        outcome
    }
}

/// Terminal theme honoring `--no-color` and redirected output
pub fn theme_for(cli: &CliOptions) -> Theme {
    if cli.no_color || !std::io::stdout().is_terminal() {
        Theme::monochrome()
    } else {
        Theme::default()
    }
}

/// Production entry point: CloudWatch backend, discovered config, terminal output
pub async fn run(cli: CliOptions) -> Result<TailOutcome> {
    let request = TailRequest::from_cli(&cli)?;
    let config = Config::discover(cli.config.as_deref())?;
    if let Some(path) = config.source() {
        log::debug!("Loaded log sets from {}", path.display());
    }

    let backend = CloudWatchBackend::from_env(cli.profile.as_deref(), cli.region.as_deref()).await;
    let app = Application::new(Arc::new(backend), config, request);
    app.run(theme_for(&cli)).await
}
