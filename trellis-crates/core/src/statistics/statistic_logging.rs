//! The process-wide sink for statistics: every statistic is written as `{PREFIX} {NAME}={VALUE}`
//! to the configured writer.

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::io::stdout;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::RwLock;

use convert_case::Case;
use convert_case::Casing;

/// Where and how statistics are written.
pub struct StatisticOptions {
    /// Written in front of every statistic.
    prefix: String,
    /// A closing line written by [`log_statistic_postfix`].
    postfix: Option<String>,
    /// The casing applied to statistic names; names are written unchanged if this is [`None`].
    casing: Option<Case>,
    writer: Box<dyn Write + Send + Sync>,
}

impl StatisticOptions {
    fn write_line(&mut self, line: impl Display) {
        let _ = writeln!(self.writer, "{line}");
    }

    fn format_name(&self, name: impl Display) -> String {
        match self.casing {
            Some(casing) => name.to_string().to_case(casing),
            None => name.to_string(),
        }
    }
}

impl Debug for StatisticOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticOptions")
            .field("prefix", &self.prefix)
            .field("postfix", &self.postfix)
            .field("casing", &self.casing)
            .field("writer", &"<Writer>")
            .finish()
    }
}

static STATISTIC_OPTIONS: OnceLock<RwLock<StatisticOptions>> = OnceLock::new();

fn with_options(action: impl FnOnce(&mut StatisticOptions)) {
    let Some(lock) = STATISTIC_OPTIONS.get() else {
        return;
    };

    if let Ok(mut options) = lock.write() {
        action(&mut options);
    }
}

/// Configures the logging of statistics.
///
/// `after` is an optional closing line written by [`log_statistic_postfix`], `casing` is applied
/// to statistic names, and `writer` defaults to stdout. Only the first configuration takes effect;
/// returns whether this call was that first configuration.
pub fn configure_statistic_logging(
    prefix: &str,
    after: Option<&str>,
    casing: Option<Case>,
    writer: Option<Box<dyn Write + Send + Sync>>,
) -> bool {
    let mut configured = false;
    let _ = STATISTIC_OPTIONS.get_or_init(|| {
        configured = true;
        RwLock::new(StatisticOptions {
            prefix: prefix.to_owned(),
            postfix: after.map(str::to_owned),
            casing,
            writer: writer.unwrap_or_else(|| Box::new(stdout())),
        })
    });
    configured
}

/// Logs the statistic `name` with value `value`; does nothing if statistic logging has not been
/// configured.
pub fn log_statistic(name: impl Display, value: impl Display) {
    with_options(|options| {
        let line = format!("{} {}={value}", options.prefix, options.format_name(name));
        options.write_line(line);
    });
}

/// Writes the closing line of a block of statistics, if one was configured.
pub fn log_statistic_postfix() {
    with_options(|options| {
        if let Some(postfix) = options.postfix.clone() {
            options.write_line(postfix);
        }
    });
}

/// Whether [`configure_statistic_logging`] has been called.
pub fn should_log_statistics() -> bool {
    STATISTIC_OPTIONS.get().is_some()
}
