use std::{path::PathBuf, sync::Arc, time::Duration};

use bon::Builder;
use clap::Args;
use log::{debug, info, trace, warn};
use miette::{IntoDiagnostic, Result};
use repo_details_resolver::{
    Debouncer, ReferenceClient, ResolutionState, ResolveRequest, SessionStore, ASYNC_RUNTIME,
};
use repo_details_utils::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_POLL_INTERVAL_SECS, RD_DEBOUNCE_MS,
};
use tokio::{sync::watch, time::MissedTickBehavior};

use crate::render::{DetailsPanel, StatusPanel};

use super::{read_application, RepoDetailsCommand, ServerArgs};

#[derive(Debug, Clone, Args, Builder)]
pub struct WatchCommand {
    /// The application document to watch, as
    /// printed by `argocd app get <name> -o json`.
    #[arg()]
    #[builder(into)]
    application: PathBuf,

    /// Show the current and latest release
    /// instead of a one line status.
    #[arg(short, long)]
    #[builder(default)]
    details: bool,

    /// How often to re-read the application, in seconds.
    #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    #[builder(default = DEFAULT_POLL_INTERVAL_SECS)]
    interval: u64,

    /// How long a change has to settle before it
    /// is resolved, in milliseconds.
    #[arg(long, env = RD_DEBOUNCE_MS, default_value_t = DEFAULT_DEBOUNCE_MS)]
    #[builder(default = DEFAULT_DEBOUNCE_MS)]
    debounce_ms: u64,

    #[clap(flatten)]
    server: ServerArgs,
}

impl RepoDetailsCommand for WatchCommand {
    fn try_run(&mut self) -> Result<()> {
        trace!("WatchCommand::try_run()");

        let resolver = Arc::new(self.server.resolver()?);
        let debouncer = Debouncer::new(resolver, Duration::from_millis(self.debounce_ms));

        ASYNC_RUNTIME.block_on(self.watch(debouncer))
    }
}

impl WatchCommand {
    async fn watch<C, S>(&self, mut debouncer: Debouncer<C, S>) -> Result<()>
    where
        C: ReferenceClient + 'static,
        S: SessionStore + 'static,
    {
        let mut state = debouncer.subscribe();
        let mut poll = tokio::time::interval(Duration::from_secs(self.interval.max(1)));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_request: Option<ResolveRequest> = None;

        info!("Watching {}", self.application.display());

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.into_diagnostic()?;
                    debug!("Received Ctrl-C, cancelling pending resolution");
                    debouncer.cancel();
                    break;
                }
                _ = poll.tick() => {
                    let request = match self.read_request() {
                        Ok(request) => request,
                        Err(e) => {
                            warn!("{e:?}");
                            continue;
                        }
                    };

                    if last_request.as_ref() != Some(&request) {
                        debug!("Application references changed, scheduling resolution");
                        if debouncer.trigger(request.clone()).is_none() {
                            debug!("Nothing to resolve");
                        }
                        last_request = Some(request);
                    }
                }
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.render(&mut state);
                }
            }
        }

        Ok(())
    }

    fn read_request(&self) -> Result<ResolveRequest> {
        let application = read_application(&self.application)?;
        Ok(ResolveRequest::from_application(
            &application,
            &self.server.namespace_source,
        ))
    }

    fn render(&self, state: &mut watch::Receiver<ResolutionState>) {
        let state = state.borrow_and_update();

        if self.details {
            println!("{}\n", DetailsPanel::new(&state));
        } else {
            println!("{}", StatusPanel::new(&state));
        }
    }
}
