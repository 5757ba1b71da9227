use bi::config::{CliError, CliOptions};
use bi::logging::{self, Logger};
use bi::{app, error};
use log::{Level, LevelFilter};
use std::process::ExitCode;

fn main() -> ExitCode {
    error::setup_panic_handler();

    let options = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(CliError::HelpRequested) => {
            println!("{}", bi::config::usage());
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };

    init_logging(&options);

    match app::run(options) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("bi: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// 画面編集中はファイルにのみ、スクリプトモードでは警告以上を stderr にも出す
fn init_logging(options: &CliOptions) {
    let mut logger = Logger::new(LevelFilter::Warn);
    if let Some(path) = &options.debug_log {
        logger = logger.with_level(LevelFilter::Debug).with_file_output(path);
    }
    if options.script.is_some() {
        logger = logger.with_stderr(Level::Warn);
    }
    logging::init(logger);
}
