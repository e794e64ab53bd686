use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use bon::Builder;
use clap::{crate_authors, Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::{debug, error};
use miette::{IntoDiagnostic, Result, WrapErr};
use repo_details_app_info::{Application, NamespaceSource};
use repo_details_resolver::{
    FileStore, HttpReferenceClient, MemoryStore, ReleaseResolver, SessionStore,
};
use repo_details_utils::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_URL, RD_NAMESPACE_SOURCE, RD_SERVER,
    RD_SESSION_FILE, RD_TIMEOUT,
};

use crate::shadow;

pub mod completions;
pub mod extract;
pub mod resolve;
pub mod watch;

pub trait RepoDetailsCommand {
    /// Runs the command and returns a result
    /// of the execution
    ///
    /// # Errors
    /// Can return a `miette` Error
    fn try_run(&mut self) -> Result<()>;

    /// Runs the command and exits if there is an error.
    fn run(&mut self) {
        if let Err(e) = self.try_run() {
            error!("Failed:\n{e:?}");
            std::process::exit(1);
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "repo-details",
    about,
    long_about = None,
    author=crate_authors!(),
    version=shadow::PKG_VERSION,
    long_version=shadow::CLAP_LONG_VERSION,
)]
pub struct RepoDetailsArgs {
    #[command(subcommand)]
    pub command: CommandArgs,

    /// The directory to output a log file.
    #[arg(long, global = true)]
    pub log_out: Option<PathBuf>,

    #[clap(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

#[derive(Debug, Subcommand)]
pub enum CommandArgs {
    /// Show the application repository and image tag
    /// found in an application.
    Extract(extract::ExtractCommand),

    /// Resolve the deployed and latest release
    /// of an application once.
    Resolve(resolve::ResolveCommand),

    /// Keep the release of an application up to date
    /// while its definition changes.
    ///
    /// The application file is polled and a new resolution
    /// is scheduled whenever its repository or image tag change.
    Watch(watch::WatchCommand),

    /// Generate shell completions for your shell to stdout
    Completions(completions::CompletionsCommand),
}

/// Options for reaching the reference service.
#[derive(Debug, Clone, Args, Builder)]
pub struct ServerArgs {
    /// The base URL of the Argo CD server that
    /// hosts the repository-details extension.
    #[arg(short, long, env = RD_SERVER, default_value = DEFAULT_SERVER_URL)]
    #[builder(into, default = DEFAULT_SERVER_URL.to_string())]
    pub server: String,

    /// Request timeout in seconds.
    #[arg(long, env = RD_TIMEOUT, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    #[builder(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Keep resolved releases in this file so separate
    /// runs share a session.
    ///
    /// Without it releases are only cached for the
    /// life of the process.
    #[arg(long, env = RD_SESSION_FILE)]
    #[builder(into)]
    pub session_file: Option<PathBuf>,

    /// Where the application's namespace is read from
    /// when identifying it to Argo CD.
    #[arg(long, env = RD_NAMESPACE_SOURCE, value_enum, default_value_t)]
    #[builder(default)]
    pub namespace_source: NamespaceSource,
}

impl ServerArgs {
    fn session_store(&self) -> Box<dyn SessionStore> {
        match &self.session_file {
            Some(path) => {
                debug!("Using session file {}", path.display());
                Box::new(FileStore::new(path))
            }
            None => Box::new(MemoryStore::new()),
        }
    }

    /// Creates a resolver for the configured server and session.
    ///
    /// # Errors
    /// Will error if the HTTP client can't be created.
    pub fn resolver(&self) -> Result<ReleaseResolver<HttpReferenceClient, Box<dyn SessionStore>>> {
        let client = HttpReferenceClient::builder()
            .server(self.server.as_str())
            .timeout(Duration::from_secs(self.timeout))
            .build()?;

        Ok(ReleaseResolver::new(client, self.session_store()))
    }
}

/// Reads an application document from a file, or stdin for `-`.
///
/// # Errors
/// Will error if the input can't be read or isn't an application.
pub fn read_application(path: &Path) -> Result<Application> {
    if path == Path::new("-") {
        debug!("Reading application from stdin");
        let contents = io::read_to_string(io::stdin())
            .into_diagnostic()
            .wrap_err("Failed to read application from stdin")?;
        return Ok(contents.parse()?);
    }

    Ok(Application::from_path(path)?)
}

#[cfg(test)]
mod test {
    use std::fs;

    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn verify_cli() {
        RepoDetailsArgs::command().debug_assert();
    }

    #[test]
    fn short_commit_hash_prefixes_full_hash() {
        assert!(shadow::RD_COMMIT_HASH.starts_with(shadow::RD_COMMIT_HASH_SHORT));
    }

    #[test]
    fn reads_application_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        fs::write(&path, r#"{"metadata": {"name": "web"}}"#).unwrap();

        assert_eq!(read_application(&path).unwrap().name(), Some("web"));
    }

    #[test]
    fn missing_application_file() {
        let dir = tempfile::tempdir().unwrap();

        assert!(read_application(&dir.path().join("app.json")).is_err());
    }

    #[test]
    fn server_defaults() {
        let args = ServerArgs::builder().build();

        assert_eq!(args.server, DEFAULT_SERVER_URL);
        assert_eq!(args.timeout, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(args.namespace_source, NamespaceSource::Metadata);
        assert!(args.resolver().is_ok());
    }
}
