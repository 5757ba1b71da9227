//! 設定とコマンドライン引数

use crate::buffer::DEFAULT_MAX_LEN;
use crate::search::DEFAULT_REGEX_WINDOW;
use std::path::PathBuf;
use thiserror::Error;

/// 既定の緊急保存ファイル名
pub const DEFAULT_RECOVERY_FILE: &str = "file.save";
/// `--debug-log` でパスを省略したときのログファイル
pub const DEFAULT_DEBUG_LOG: &str = "bi-debug.log";

/// 端末背景に合わせた配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    /// 黒背景
    #[default]
    Dark,
    /// 白背景
    Light,
}

impl ColorScheme {
    /// `-t` の値から決める（`black` 以外は白背景）
    pub fn from_terminal_color(name: &str) -> Self {
        if name.eq_ignore_ascii_case("black") {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        }
    }
}

/// エディタの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// 緊急保存先
    pub recovery_path: PathBuf,
    /// 正規表現照合のウィンドウ幅
    pub regex_window: usize,
    /// バッファ長の上限
    pub max_buffer_len: u64,
    pub color_scheme: ColorScheme,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            recovery_path: PathBuf::from(DEFAULT_RECOVERY_FILE),
            regex_window: DEFAULT_REGEX_WINDOW,
            max_buffer_len: DEFAULT_MAX_LEN,
            color_scheme: ColorScheme::Dark,
        }
    }
}

/// 引数解析エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// `-h` / `--help`
    #[error("{}", usage())]
    HelpRequested,
    #[error("file to edit is required\n{}", usage())]
    MissingFile,
    #[error("{0} requires a value\n{}", usage())]
    MissingValue(String),
    #[error("unknown option: {0}\n{}", usage())]
    UnknownFlag(String),
    #[error("unexpected argument: {0}\n{}", usage())]
    UnexpectedArgument(String),
}

/// コマンドライン引数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub file: String,
    pub script: Option<String>,
    pub verbose: bool,
    /// スクリプト終了時に変更があれば保存する
    pub write_on_exit: bool,
    pub color_scheme: ColorScheme,
    pub debug_log: Option<PathBuf>,
}

impl CliOptions {
    /// プログラム名を除いた引数列を解析
    pub fn parse<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut file = None;
        let mut script = None;
        let mut verbose = false;
        let mut write_on_exit = false;
        let mut color_scheme = ColorScheme::default();
        let mut debug_log = None;

        let mut iter = args.iter().peekable();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => return Err(CliError::HelpRequested),
                "-v" | "--verbose" => verbose = true,
                "-w" | "--write" => write_on_exit = true,
                "-s" | "--script" => {
                    let value = iter.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    script = Some(value.clone());
                }
                "-t" | "--termcolor" => {
                    let value = iter.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    color_scheme = ColorScheme::from_terminal_color(value);
                }
                "--debug-log" => {
                    let path = match iter.peek() {
                        Some(next) if !next.starts_with('-') && file.is_some() => {
                            let path = PathBuf::from(next.as_str());
                            iter.next();
                            path
                        }
                        _ => PathBuf::from(DEFAULT_DEBUG_LOG),
                    };
                    debug_log = Some(path);
                }
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(CliError::UnknownFlag(flag.to_string()))
                }
                positional => {
                    if file.is_some() {
                        return Err(CliError::UnexpectedArgument(positional.to_string()));
                    }
                    file = Some(positional.to_string());
                }
            }
        }

        Ok(Self {
            file: file.ok_or(CliError::MissingFile)?,
            script,
            verbose,
            write_on_exit,
            color_scheme,
            debug_log,
        })
    }

    /// 引数から設定を組み立てる
    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            color_scheme: self.color_scheme,
            ..EditorConfig::default()
        }
    }
}

/// 使い方
pub fn usage() -> String {
    [
        "usage: bi [options] <file>",
        "  -s, --script <file>     run a bi script instead of the screen editor",
        "  -v, --verbose           echo script lines and messages",
        "  -w, --write             write the file when the script finishes",
        "  -t, --termcolor <name>  terminal background: black (default) or white",
        "      --debug-log [path]  write debug logs to a file",
        "  -h, --help              show this help",
    ]
    .join("\n")
}
