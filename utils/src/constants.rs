// Application info entries
pub const APPLICATION_REPOSITORY_INFO: &str = "Application Repository";
pub const IMAGE_REPOSITORY_INFO: &str = "Image Repository";
pub const IMAGE_TAG_FIELD: &str = "Image Tag";

// Reference service
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const REFERENCES_API_PATH: &str = "/extensions/repository-details/api/references";
pub const REPO_QUERY_PARAM: &str = "repo";
pub const GIT_REF_QUERY_PARAM: &str = "gitRef";

// Request headers
pub const ARGOCD_APPLICATION_NAME_HEADER: &str = "argocd-application-name";
pub const ARGOCD_PROJECT_NAME_HEADER: &str = "argocd-project-name";

// Timings
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

// Git
pub const SHORT_SHA_LEN: usize = 7;

// repo-details vars
pub const RD_DEBOUNCE_MS: &str = "REPO_DETAILS_DEBOUNCE_MS";
pub const RD_NAMESPACE_SOURCE: &str = "REPO_DETAILS_NAMESPACE_SOURCE";
pub const RD_SERVER: &str = "REPO_DETAILS_SERVER";
pub const RD_SESSION_FILE: &str = "REPO_DETAILS_SESSION_FILE";
pub const RD_TIMEOUT: &str = "REPO_DETAILS_TIMEOUT";

// Logging
pub const LOG_FILENAME: &str = "repo-details.log";
pub const LOG_ARCHIVE_PATTERN: &str = "repo-details.{}.log";
