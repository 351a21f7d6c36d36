#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

mod args;
mod options;

use clap::Parser;
use log::{debug, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::args::TpvtArgs;
use crate::options::options;

/// Configures logging using the given log4rs file, falling back to stdout at the Info level.
fn configure_logging(logging_config: &Option<String>) {
    if let Some(logging_config) = logging_config {
        match log4rs::init_file(logging_config, Default::default()) {
            Ok(()) => return,
            Err(e) => println!(
                "ERROR: failed to configure logging using {} with {:?}. Continuing with logging to stdout.",
                logging_config, e
            ),
        }
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    match Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
    {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                println!(
                    "ERROR: failed to configure logging for stdout with {:?}. Continuing without logging.",
                    e
                );
            }
        }
        Err(e) => {
            println!(
                "ERROR: failed to prepare default logging configuration with {:?}. Continuing without logging",
                e
            );
        }
    }
}

/// Point of entry for TPVT application.
fn main() {
    let args = TpvtArgs::parse();
    configure_logging(&args.logging_config);

    debug!("TPVT start");
    let outcome = options(&args);
    debug!("TPVT end");

    std::process::exit(outcome.exit_code());
}
