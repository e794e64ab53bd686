use log::warn;
use repo_details_app_info::Identity;
use repo_details_utils::constants::{ARGOCD_APPLICATION_NAME_HEADER, ARGOCD_PROJECT_NAME_HEADER};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};

/// Headers sent with every references request.
///
/// The Argo CD proxy extension uses the identity headers to
/// authorize the request against the application and project.
#[must_use]
pub fn identity_headers(identity: &Identity) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    insert_header(
        &mut headers,
        HeaderName::from_static(ARGOCD_APPLICATION_NAME_HEADER),
        &identity.application_header(),
    );
    insert_header(
        &mut headers,
        HeaderName::from_static(ARGOCD_PROJECT_NAME_HEADER),
        &identity.project,
    );

    headers
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => warn!("Not sending header {name}, {value:?} is not a valid header value: {e}"),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builds_identity_headers() {
        let identity = Identity::builder()
            .application_name("web")
            .application_namespace("argocd")
            .project("shop")
            .build();

        let headers = identity_headers(&identity);

        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["Argocd-Application-Name"], "argocd:web");
        assert_eq!(headers["Argocd-Project-Name"], "shop");
    }

    #[test]
    fn skips_invalid_values() {
        let identity = Identity::builder()
            .application_name("web")
            .application_namespace("argocd")
            .project("shop\nevil")
            .build();

        let headers = identity_headers(&identity);

        assert!(headers.get("argocd-project-name").is_none());
        assert_eq!(headers.len(), 3);
    }
}
