//! Logging setup.
//!
//! Initializes a `log4rs` pipeline scoped to a store file, mirroring the way
//! a database handle gets its own `{name}_logs/{name}.log` rolling file
//! rather than sharing one process-wide log.

use std::path::Path;

/// Initializes logging from `log4rs.yaml` in the working directory, if
/// present. Safe to call more than once; later calls are no-ops.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let _ = log4rs::init_file("log4rs.yaml", log4rs::config::Deserializers::default());
    Ok(())
}

/// Initializes a rolling-file logger under `{base_dir}/{store_name}_logs/`,
/// used when opening a store that has no `log4rs.yaml` of its own.
///
/// # Errors
/// Returns an error if the log directory cannot be created or the
/// underlying appender fails to build.
pub fn init_for_store_in(base_dir: &Path, store_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    use log::LevelFilter;
    use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
    use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
    use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
    use log4rs::append::rolling_file::RollingFileAppender;
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;
    use std::fs;
    use std::path::PathBuf;

    let mut dir = PathBuf::from(base_dir);
    dir.push(format!("{store_name}_logs"));
    fs::create_dir_all(&dir)?;

    let log_path = dir.join(format!("{store_name}.log"));
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{store_name}.{{}}.log")).display()), 5)?;
    let trigger = SizeTrigger::new(10 * 1024 * 1024);
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}")))
        .build(log_path, Box::new(policy))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}
