//! Logging support

use log::{debug, error, info, warn};

/// Enum that describes level associated with a log message
#[derive(Debug, Eq, PartialEq)]
pub enum PeLogLevels {
    /// Common error logging level
    PeError,
    /// Common info logging level
    PeInfo,
    /// Common warn logging level
    PeWarn,
    /// Common debug logging level
    PeDebug,
}

/// `log_message` emits a message at the given level via the `log` facade, i.e., to whatever logger
/// the application has installed (log4rs in the case of `tpvt`).
pub fn log_message(level: &PeLogLevels, message: &str) {
    match level {
        PeLogLevels::PeError => error!("{}", message),
        PeLogLevels::PeWarn => warn!("{}", message),
        PeLogLevels::PeInfo => info!("{}", message),
        PeLogLevels::PeDebug => debug!("{}", message),
    }
}
