use bon::Builder;
use log::{debug, error, info, warn};
use repo_details_app_info::{Application, Identity, IdentityResolver};
use tokio_util::sync::CancellationToken;

use crate::{
    cache::{cache_key, ReleaseCache, SessionStore},
    client::{ReferenceClient, ReferenceQuery},
    error::{MissingField, MissingFields, ResolveError},
    normalize::normalize_payload,
    release::ReleaseInfo,
};

/// Everything needed to resolve the release of one application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct ResolveRequest {
    #[builder(into)]
    pub app_repository: Option<String>,

    #[builder(into)]
    pub image_tag: Option<String>,

    #[builder(default)]
    pub identity: Identity,
}

impl ResolveRequest {
    /// Builds a request from an application's extracted references.
    #[must_use]
    pub fn from_application<R>(application: &Application, identity: &R) -> Self
    where
        R: IdentityResolver + ?Sized,
    {
        let references = application.references();

        Self {
            app_repository: references.app_repository,
            image_tag: references.image_tag,
            identity: identity.resolve_identity(application),
        }
    }

    /// Returns the repository and tag when both are present.
    ///
    /// # Errors
    /// Will error naming every field that is absent or empty.
    pub fn validate(&self) -> Result<(&str, &str), ResolveError> {
        let app_repository = self.app_repository.as_deref().filter(|v| !v.is_empty());
        let image_tag = self.image_tag.as_deref().filter(|v| !v.is_empty());

        match (app_repository, image_tag) {
            (Some(repo), Some(tag)) => Ok((repo, tag)),
            (repo, tag) => {
                let mut missing = Vec::with_capacity(2);
                if repo.is_none() {
                    missing.push(MissingField::ApplicationRepository);
                }
                if tag.is_none() {
                    missing.push(MissingField::ImageTag);
                }
                Err(ResolveError::MissingFields(MissingFields(missing)))
            }
        }
    }
}

/// Resolves the deployed and newest release of an application,
/// consulting the session cache before the reference service.
#[derive(Debug)]
pub struct ReleaseResolver<C, S> {
    client: C,
    cache: ReleaseCache<S>,
}

impl<C, S> ReleaseResolver<C, S>
where
    C: ReferenceClient,
    S: SessionStore + 'static,
{
    #[must_use]
    pub fn new(client: C, store: S) -> Self {
        Self {
            client,
            cache: ReleaseCache::new(store),
        }
    }

    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub const fn cache(&self) -> &ReleaseCache<S> {
        &self.cache
    }

    /// Resolves the release info for a request.
    ///
    /// The token is checked before any network call is made. Once a
    /// fetch has started its result is cached even if the token is
    /// cancelled afterwards.
    ///
    /// # Errors
    /// Will error if the request is missing fields, the token was
    /// cancelled, the fetch fails, or the response can't be normalized.
    pub async fn resolve(
        &self,
        request: &ResolveRequest,
        cancel: &CancellationToken,
    ) -> Result<ReleaseInfo, ResolveError> {
        let (repo, git_ref) = request.validate()?;
        let key = cache_key(repo, git_ref);

        match self.cache.load(&key).await {
            Ok(Some(info)) => return Ok(info),
            Ok(None) => {}
            Err(e) => warn!("{e}, fetching it again"),
        }

        if cancel.is_cancelled() {
            debug!("Resolution of {key} was cancelled before fetching");
            return Err(ResolveError::Cancelled);
        }

        let body = self
            .client
            .fetch_references(ReferenceQuery {
                repo,
                git_ref,
                identity: &request.identity,
            })
            .await?;

        let info = normalize_payload(&body).map_err(|source| {
            error!(
                "Unrecognized response for {key}: {}",
                String::from_utf8_lossy(&body)
            );
            ResolveError::MalformedResponse {
                repo: repo.to_string(),
                git_ref: git_ref.to_string(),
                source,
            }
        })?;
        info!("Resolved release info for {repo} at {git_ref}");

        if let Err(e) = self.cache.save(&key, &info).await {
            warn!("{e}");
        }

        Ok(info)
    }
}
