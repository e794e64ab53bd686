use std::{sync::Arc, time::Duration};

use log::{debug, trace};
use repo_details_utils::constants::DEFAULT_DEBOUNCE_MS;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    cache::SessionStore,
    client::ReferenceClient,
    release::ReleaseInfo,
    resolve::{ReleaseResolver, ResolveRequest},
};

/// What a consumer should currently display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResolutionState {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    Loading,
    Ready(ReleaseInfo),
    Failed(String),
}

/// Coalesces rapid resolution triggers from a single consumer.
///
/// Each trigger waits for the delay before resolving and supersedes
/// any earlier trigger. Only the newest trigger may publish a state.
/// Dropping the debouncer cancels whatever is pending.
#[derive(Debug)]
pub struct Debouncer<C, S> {
    resolver: Arc<ReleaseResolver<C, S>>,
    delay: Duration,
    state: Arc<watch::Sender<ResolutionState>>,
    pending: Option<CancellationToken>,
}

impl<C, S> Debouncer<C, S>
where
    C: ReferenceClient + 'static,
    S: SessionStore + 'static,
{
    #[must_use]
    pub fn new(resolver: Arc<ReleaseResolver<C, S>>, delay: Duration) -> Self {
        Self {
            resolver,
            delay,
            state: Arc::new(watch::Sender::new(ResolutionState::Idle)),
            pending: None,
        }
    }

    #[must_use]
    pub fn with_default_delay(resolver: Arc<ReleaseResolver<C, S>>) -> Self {
        Self::new(resolver, Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResolutionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> ResolutionState {
        self.state.borrow().clone()
    }

    /// Schedules a resolution, superseding any pending one.
    ///
    /// A request with missing fields fails right away and
    /// no task is spawned.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn trigger(&mut self, request: ResolveRequest) -> Option<JoinHandle<()>> {
        self.cancel();

        if let Err(e) = request.validate() {
            debug!("Not resolving: {e}");
            self.state.send_replace(ResolutionState::Failed(e.to_string()));
            return None;
        }

        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        self.state.send_replace(ResolutionState::Loading);

        let resolver = Arc::clone(&self.resolver);
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        Some(tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    trace!("Trigger superseded before the debounce delay elapsed");
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }

            let next = match resolver.resolve(&request, &token).await {
                Ok(info) => ResolutionState::Ready(info),
                Err(e) => ResolutionState::Failed(e.to_string()),
            };

            // Checked under the channel lock so a newer trigger's
            // Loading state can't be overwritten.
            let published = state.send_if_modified(|current| {
                if token.is_cancelled() {
                    false
                } else {
                    *current = next;
                    true
                }
            });
            if !published {
                debug!("Discarding superseded resolution result");
            }
        }))
    }

    /// Cancels the pending trigger, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<C, S> Drop for Debouncer<C, S> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{
        cache::MemoryStore,
        test::{identity, FakeClient},
    };

    use super::*;

    const DELAY: Duration = Duration::from_millis(DEFAULT_DEBOUNCE_MS);

    fn request(tag: &str) -> ResolveRequest {
        ResolveRequest::builder()
            .app_repository("org/repo")
            .image_tag(tag)
            .identity(identity())
            .build()
    }

    fn client() -> FakeClient {
        ["1.0.0", "1.1.0", "1.2.0"]
            .into_iter()
            .fold(FakeClient::new(), |client, tag| {
                client.with_body(
                    format!("org/repo-{tag}"),
                    json!({"current": {"ref": tag}}).to_string(),
                )
            })
    }

    fn ready(tag: &str) -> ResolutionState {
        ResolutionState::Ready(ReleaseInfo {
            current: Some(crate::release::ReleaseEntity {
                git_ref: Some(tag.into()),
                ..Default::default()
            }),
            latest: None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_trigger_fetches() {
        let resolver = Arc::new(ReleaseResolver::new(client(), MemoryStore::new()));
        let mut debouncer = Debouncer::new(Arc::clone(&resolver), DELAY);

        let first = debouncer.trigger(request("1.0.0")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = debouncer.trigger(request("1.1.0")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let last = debouncer.trigger(request("1.2.0")).unwrap();
        assert_eq!(debouncer.state(), ResolutionState::Loading);

        for handle in [first, second, last] {
            handle.await.unwrap();
        }

        assert_eq!(resolver.client().calls(), vec!["org/repo-1.2.0".to_string()]);
        assert_eq!(debouncer.state(), ready("1.2.0"));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending() {
        let resolver = Arc::new(ReleaseResolver::new(client(), MemoryStore::new()));
        let mut debouncer = Debouncer::new(Arc::clone(&resolver), DELAY);
        let state = debouncer.subscribe();

        let handle = debouncer.trigger(request("1.0.0")).unwrap();
        drop(debouncer);
        handle.await.unwrap();

        assert!(resolver.client().calls().is_empty());
        assert_eq!(*state.borrow(), ResolutionState::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_fields_fail_immediately() {
        let resolver = Arc::new(ReleaseResolver::new(client(), MemoryStore::new()));
        let mut debouncer = Debouncer::new(Arc::clone(&resolver), DELAY);

        let handle = debouncer.trigger(ResolveRequest::builder().image_tag("1.0.0").build());

        assert!(handle.is_none());
        assert_eq!(
            debouncer.state(),
            ResolutionState::Failed("Missing required fields: Application Repository.".into())
        );
        assert!(resolver.client().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_fetch_still_caches() {
        let client = client().with_latency(Duration::from_secs(2));
        let resolver = Arc::new(ReleaseResolver::new(client, MemoryStore::new()));
        let mut debouncer = Debouncer::new(Arc::clone(&resolver), DELAY);

        let stale = debouncer.trigger(request("1.0.0")).unwrap();
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        let fresh = debouncer.trigger(request("1.1.0")).unwrap();

        stale.await.unwrap();
        assert_eq!(debouncer.state(), ResolutionState::Loading);
        assert!(resolver.cache().get("org/repo-1.0.0").unwrap().is_some());

        fresh.await.unwrap();
        assert_eq!(debouncer.state(), ready("1.1.0"));
        assert_eq!(resolver.client().calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_published() {
        let resolver = Arc::new(ReleaseResolver::new(FakeClient::new(), MemoryStore::new()));
        let mut debouncer = Debouncer::with_default_delay(Arc::clone(&resolver));

        debouncer.trigger(request("9.9.9")).unwrap().await.unwrap();

        let ResolutionState::Failed(message) = debouncer.state() else {
            panic!("Expected a failure");
        };
        assert!(message.starts_with("Failed to fetch release info for 9.9.9 tag from org/repo"));
    }
}
