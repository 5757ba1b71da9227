//! スクリプト実行
//!
//! 1行1コマンドのスクリプトファイルを順に実行する。`t`/`T` による
//! 入れ子実行と `!` によるシェル実行もここで扱う

use crate::editor::{Effect, Session};
use crate::error::{BiError, FileError, Result};
use crate::file::io;
use std::io::Write;
use std::process::{Command as Process, ExitStatus};

/// 入れ子実行の上限
pub const MAX_SCRIPT_DEPTH: usize = 32;

/// スクリプトの終わり方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    /// 最終行まで実行した
    Finished,
    /// `q` などで終了要求があった
    Quit,
}

/// スクリプト実行器
///
/// 詳細表示は `out`、エラーは常に `err` へ書く
pub struct ScriptRunner<O: Write, E: Write> {
    out: O,
    err: E,
    depth: usize,
}

impl ScriptRunner<std::io::Stdout, std::io::Stderr> {
    /// 標準出力・標準エラーへ書く実行器
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write, E: Write> ScriptRunner<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err, depth: 0 }
    }

    /// スクリプトファイルを実行
    pub fn run_file(
        &mut self,
        session: &mut Session,
        path: &str,
        verbose: bool,
    ) -> Result<ScriptStatus> {
        let expanded = io::expand_path(path);
        let text = std::fs::read_to_string(&expanded)
            .map_err(|e| FileError::from_io(e, &expanded))?;
        log::info!("running script {}", expanded.display());
        self.run_source(session, &text, verbose)
    }

    /// スクリプト本文を実行
    pub fn run_source(
        &mut self,
        session: &mut Session,
        source: &str,
        verbose: bool,
    ) -> Result<ScriptStatus> {
        if self.depth >= MAX_SCRIPT_DEPTH {
            return Err(BiError::InvalidExpression(
                "Script nesting too deep.".to_string(),
            ));
        }
        self.depth += 1;
        let status = self.run_lines(session, source, verbose);
        self.depth -= 1;
        status
    }

    fn run_lines(
        &mut self,
        session: &mut Session,
        source: &str,
        verbose: bool,
    ) -> Result<ScriptStatus> {
        for (number, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if verbose {
                self.echo(line);
            }
            let outcome = match session.execute_line(line) {
                Ok(outcome) => outcome,
                Err(err) if err.is_recoverable() => {
                    log::debug!("script line {}: {}", number + 1, err);
                    self.report(&err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            if verbose {
                if let Some(message) = &outcome.message {
                    self.echo(&message.text);
                }
            }

            match outcome.effect {
                Effect::None => {}
                Effect::Quit => return Ok(ScriptStatus::Quit),
                Effect::RunScript { path, verbose } => {
                    match self.run_file(session, &path, verbose) {
                        Ok(ScriptStatus::Quit) => return Ok(ScriptStatus::Quit),
                        Ok(ScriptStatus::Finished) => {}
                        Err(err) if err.is_recoverable() => self.report(&err),
                        Err(err) => return Err(err),
                    }
                }
                Effect::Shell(command) => {
                    let _ = self.out.flush();
                    if let Err(err) = run_shell(&command) {
                        log::debug!("shell command failed: {}", err);
                        let _ = writeln!(self.err, "{}", err);
                    }
                }
                Effect::ShowMarks(listing) => {
                    if verbose {
                        self.echo(&listing);
                    }
                }
            }
        }
        Ok(ScriptStatus::Finished)
    }

    fn echo(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }

    fn report(&mut self, err: &BiError) {
        let _ = writeln!(self.err, "{}", err);
    }
}

/// `sh -c` でコマンドを実行し、終了を待つ
pub fn run_shell(command: &str) -> std::io::Result<ExitStatus> {
    log::debug!("shell: {}", command);
    Process::new("sh").arg("-c").arg(command.trim_start()).status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use tempfile::TempDir;

    fn run(session: &mut Session, source: &str, verbose: bool) -> (ScriptStatus, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = ScriptRunner::new(&mut out, &mut err)
            .run_source(session, source, verbose)
            .unwrap();
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn runs_lines_and_skips_blank_and_comments() {
        let mut session = Session::from_bytes(b"ABCD".to_vec(), EditorConfig::default());
        let (status, out, err) = run(&mut session, "# header\n\n0,1d   # drop\n\n0i 7a\n", false);
        assert_eq!(status, ScriptStatus::Finished);
        assert_eq!(session.buffer().as_bytes(), b"zD");
        assert!(out.is_empty());
        assert!(err.is_empty());
    }

    #[test]
    fn verbose_echoes_lines_and_messages() {
        let mut session = Session::from_bytes(b"ABCD".to_vec(), EditorConfig::default());
        let (_, out, _) = run(&mut session, "0,1y\n", true);
        assert_eq!(out, "0,1y\n2 bytes yanked.\n");
    }

    #[test]
    fn errors_go_to_stderr_and_script_continues() {
        let mut session = Session::from_bytes(b"AB".to_vec(), EditorConfig::default());
        let (status, _, err) = run(&mut session, "'q\n@\n0i 41 41 41\n", false);
        assert_eq!(status, ScriptStatus::Finished);
        assert_eq!(err, "Unknown mark 'q'.\nUnrecognized command.\n");
        assert_eq!(session.buffer().as_bytes(), b"AAA");
    }

    #[test]
    fn quit_stops_the_script() {
        let mut session = Session::from_bytes(b"AB".to_vec(), EditorConfig::default());
        let (status, _, _) = run(&mut session, "q\n0,1d\n", false);
        assert_eq!(status, ScriptStatus::Quit);
        assert_eq!(session.buffer().as_bytes(), b"AB");
    }

    #[test]
    fn nested_scripts_run_in_place() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("inner.bi");
        std::fs::write(&inner, "0i 31\n").unwrap();
        let mut session = Session::from_bytes(b"AB".to_vec(), EditorConfig::default());
        let source = format!("t {}\n1i 32\n", inner.display());
        let (status, _, err) = run(&mut session, &source, false);
        assert_eq!(status, ScriptStatus::Finished);
        assert!(err.is_empty());
        assert_eq!(session.buffer().as_bytes(), b"12");
    }

    #[test]
    fn self_including_script_is_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loop.bi");
        std::fs::write(&path, format!("t {}\n", path.display())).unwrap();
        let mut session = Session::from_bytes(Vec::new(), EditorConfig::default());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = ScriptRunner::new(&mut out, &mut err)
            .run_file(&mut session, path.to_str().unwrap(), false)
            .unwrap();
        assert_eq!(status, ScriptStatus::Finished);
        assert!(String::from_utf8(err).unwrap().contains("Script nesting too deep."));
    }

    #[test]
    fn missing_script_is_file_error() {
        let mut session = Session::from_bytes(Vec::new(), EditorConfig::default());
        let mut runner = ScriptRunner::new(Vec::new(), Vec::new());
        let err = runner
            .run_file(&mut session, "/nonexistent/dir/x.bi", false)
            .unwrap_err();
        assert!(matches!(err, BiError::File(FileError::NotFound { .. })));
    }

    #[test]
    fn shell_runs_through_sh() {
        assert!(run_shell("exit 0").unwrap().success());
        assert!(!run_shell("exit 3").unwrap().success());
    }
}
