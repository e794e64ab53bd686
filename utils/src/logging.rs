use std::path::{Path, PathBuf};

use bon::Builder;
use chrono::Local;
use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Record};
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{
                roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
            },
            RollingFileAppender,
        },
    },
    config::{Appender, Root},
    encode::{pattern::PatternEncoder, Encode, Write},
    Config,
};

use crate::constants::{LOG_ARCHIVE_PATTERN, LOG_FILENAME};

#[derive(Debug, Clone)]
pub struct Logger {
    modules: Vec<(String, LevelFilter)>,
    level: LevelFilter,
    log_dir: Option<PathBuf>,
}

impl Logger {
    const TRIGGER_FILE_SIZE: u64 = 10 * 1024;
    const LOG_FILE_COUNT: u32 = 4;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Silence records coming from modules whose path contains
    /// one of the given names at or below the paired level.
    pub fn filter_modules<I, S>(&mut self, filter_modules: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, LevelFilter)>,
        S: AsRef<str>,
    {
        self.modules = filter_modules
            .into_iter()
            .map(|(module, level)| (module.as_ref().to_string(), level))
            .collect::<Vec<_>>();
        self
    }

    pub const fn filter_level(&mut self, filter_level: LevelFilter) -> &mut Self {
        self.level = filter_level;
        self
    }

    pub fn log_out_dir<P>(&mut self, path: Option<P>) -> &mut Self
    where
        P: AsRef<Path>,
    {
        self.log_dir = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Initializes logging for the application.
    ///
    /// Logs always go to stderr. When a log directory was given
    /// a size-rolled log file is written there as well.
    ///
    /// # Panics
    /// Will panic if logging is unable to be initialized.
    pub fn init(&self) {
        let stderr = ConsoleAppender::builder()
            .encoder(Box::new(
                CustomPatternEncoder::builder()
                    .filter_modules(self.modules.clone())
                    .build(),
            ))
            .target(Target::Stderr)
            .build();

        let config =
            Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));
        let mut root = Root::builder().appender("stderr");

        let config = match self.log_dir.as_deref().map(Self::file_appender) {
            None => config,
            Some(Err(e)) => {
                eprintln!("Cannot create logs directory:\n{e}");
                config
            }
            Some(Ok(file_appender)) => {
                root = root.appender("file");
                config.appender(Appender::builder().build("file", Box::new(file_appender)))
            }
        }
        .build(root.build(self.level))
        .expect("Logger config should build");

        log4rs::init_config(config).expect("Logger should initialize");
    }

    fn file_appender(log_dir: &Path) -> anyhow::Result<RollingFileAppender> {
        let log_out_path = log_dir.join(LOG_FILENAME);
        let log_archive_pattern = format!("{}/{LOG_ARCHIVE_PATTERN}", log_dir.display());

        let window_roller =
            FixedWindowRoller::builder().build(&log_archive_pattern, Self::LOG_FILE_COUNT)?;

        Ok(RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} - {l} - {m}{n}")))
            .build(
                log_out_path,
                Box::new(CompoundPolicy::new(
                    Box::new(SizeTrigger::new(Self::TRIGGER_FILE_SIZE)),
                    Box::new(window_roller),
                )),
            )?)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            modules: vec![],
            level: LevelFilter::Info,
            log_dir: None,
        }
    }
}

trait ColoredLevel {
    fn colored(&self) -> ColoredString;
}

impl ColoredLevel for Level {
    fn colored(&self) -> ColoredString {
        match self {
            Self::Error => Self::Error.as_str().red(),
            Self::Warn => Self::Warn.as_str().yellow(),
            Self::Info => Self::Info.as_str().green(),
            Self::Debug => Self::Debug.as_str().blue(),
            Self::Trace => Self::Trace.as_str().cyan(),
        }
    }
}

#[derive(Debug, Builder)]
struct CustomPatternEncoder {
    #[builder(default, into)]
    filter_modules: Vec<(String, LevelFilter)>,
}

impl CustomPatternEncoder {
    fn is_filtered(&self, record: &Record) -> bool {
        record.module_path().is_some_and(|mp| {
            self.filter_modules
                .iter()
                .any(|(module, level)| mp.contains(module.as_str()) && *level <= record.level())
        })
    }
}

impl Encode for CustomPatternEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        if self.is_filtered(record) {
            return Ok(());
        }

        match log::max_level() {
            LevelFilter::Error | LevelFilter::Warn | LevelFilter::Info => Ok(writeln!(
                w,
                "{prefix} {args}",
                prefix = log_header(format!(
                    "{level:width$}",
                    level = record.level().colored(),
                    width = 5,
                )),
                args = record.args(),
            )?),
            LevelFilter::Debug => Ok(writeln!(
                w,
                "{prefix} {args}",
                prefix = log_header(format!(
                    "{level:>width$}",
                    level = record.level().colored(),
                    width = 5,
                )),
                args = record.args(),
            )?),
            LevelFilter::Trace => Ok(writeln!(
                w,
                "{prefix} {args}",
                prefix = log_header(format!(
                    "{level:width$} {module}:{line}",
                    level = record.level().colored(),
                    width = 5,
                    module = record.module_path().unwrap_or_default().bright_yellow(),
                    line = record
                        .line()
                        .map_or_else(String::new, |l| l.to_string())
                        .bright_green(),
                )),
                args = record.args(),
            )?),
            LevelFilter::Off => Ok(()),
        }
    }
}

/// Keeps the log prefix consistent across levels.
fn log_header<T>(text: T) -> String
where
    T: AsRef<str>,
{
    fn inner(text: &str) -> String {
        match log::max_level() {
            LevelFilter::Error | LevelFilter::Warn | LevelFilter::Info => {
                format!("{text} {sep}", sep = "=>".bold())
            }
            LevelFilter::Debug | LevelFilter::Trace => format!(
                "[{time} {text}] {sep}",
                time = Local::now().format("%H:%M:%S"),
                sep = "=>".bold(),
            ),
            LevelFilter::Off => String::new(),
        }
    }
    inner(text.as_ref())
}
