//! ロギングシステム
//!
//! `log` ファサードの実装。対話モードでは画面を崩さないようファイル出力のみ、
//! スクリプトモードでは警告以上を stderr にも出力する

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// ロガー
#[derive(Debug, Clone)]
pub struct Logger {
    level: LevelFilter,
    stderr_level: Option<Level>,
    output_file: Option<PathBuf>,
}

impl Logger {
    /// デフォルト構築（出力先なし）
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            stderr_level: None,
            output_file: None,
        }
    }

    /// 開発者向けロガー
    pub fn for_development() -> Self {
        Self::new(LevelFilter::Debug)
    }

    /// ログレベルを取得
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// ログレベルを変更
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// ファイル出力を設定
    pub fn with_file_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// 指定レベル以上を stderr にも出す
    pub fn with_stderr(mut self, level: Level) -> Self {
        self.stderr_level = Some(level);
        self
    }

    fn should_log(&self, level: Level) -> bool {
        level <= self.level
    }

    fn format_record(record: &Record<'_>) -> String {
        format!("{}: {} in {}", record.level(), record.args(), record.target())
    }

    fn write_line(&self, level: Level, message: &str) {
        if let Some(stderr_level) = self.stderr_level {
            if level <= stderr_level {
                eprintln!("{}", message);
            }
        }

        if let Some(path) = &self.output_file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", message);
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.should_log(metadata.level())
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.write_line(record.level(), &Self::format_record(record));
        }
    }

    fn flush(&self) {}
}

/// ロガーをグローバルに登録
///
/// 二重登録（テストなど）は無視する
pub fn init(logger: Logger) {
    let level = logger.level();
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_respects_log_level() {
        let logger = Logger::for_development();
        assert!(logger.should_log(Level::Debug));
        assert!(logger.should_log(Level::Error));

        let info_logger = Logger::for_development().with_level(LevelFilter::Info);
        assert!(!info_logger.should_log(Level::Debug));
        assert!(info_logger.should_log(Level::Warn));
    }

    #[test]
    fn file_output_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        let logger = Logger::for_development().with_file_output(&path);

        logger.write_line(Level::Info, "first");
        logger.write_line(Level::Info, "second");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn init_routes_log_macros_to_the_logger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.log");
        init(Logger::for_development().with_file_output(&path));

        log::info!("installed");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO: installed in bi::logging::tests"));
    }
}
