//! アプリケーション本体
//!
//! 画面編集モードのメインループとスクリプトモードの実行、
//! 致命的エラー時の緊急保存を実装

use crate::config::CliOptions;
use crate::editor::{CommandOutcome, Effect, Session};
use crate::error::{Result as BiResult, StatusMessage};
use crate::file::io;
use crate::input::keys::{Action, Key, KeyCode, KeyDecoder};
use crate::minibuffer::{Minibuffer, PromptKey, PromptKind, PromptResult};
use crate::script::{run_shell, ScriptRunner};
use crate::ui::renderer::{DisplayMode, Frame, Renderer, TerminalRenderer};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io::{stdout, Stdout, Write};
use std::process::ExitCode;

/// 実行結果（終了コードに対応）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Completed => ExitCode::SUCCESS,
            RunStatus::Failed => ExitCode::FAILURE,
        }
    }
}

/// ループの継続判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// 引数に従ってファイルを開き、スクリプトまたは画面編集を実行
pub fn run(options: CliOptions) -> Result<RunStatus> {
    let config = options.editor_config();
    let mut session = Session::open(&options.file, config)
        .with_context(|| format!("cannot open {}", options.file))?;
    log::info!(
        "opened {} ({} bytes, new: {})",
        options.file,
        session.buffer().len(),
        session.is_new_file()
    );

    match &options.script {
        Some(script) => run_script(&mut session, script, &options),
        None => run_interactive(&mut session),
    }
}

/// スクリプトモード
fn run_script(session: &mut Session, script: &str, options: &CliOptions) -> Result<RunStatus> {
    let mut runner = ScriptRunner::stdio();
    match runner.run_file(session, script, options.verbose) {
        Ok(_) => {}
        Err(err) if err.is_recoverable() => {
            eprintln!("{}", err);
            return Ok(RunStatus::Failed);
        }
        Err(err) => return Ok(emergency_save(session, &err.to_string())),
    }

    if options.write_on_exit && session.has_unsaved_changes() {
        session
            .write_back()
            .with_context(|| format!("cannot write {}", options.file))?;
        log::info!("wrote {} on exit", options.file);
    }
    Ok(RunStatus::Completed)
}

/// 画面編集モード
fn run_interactive(session: &mut Session) -> Result<RunStatus> {
    enter_terminal()?;
    let scheme = session.config().color_scheme;
    let mut screen = Screen {
        session,
        renderer: TerminalRenderer::new(stdout(), scheme),
        decoder: KeyDecoder::new(),
        minibuffer: Minibuffer::new(),
        mode: DisplayMode::default(),
        status: None,
    };
    if screen.session.is_new_file() {
        screen.status = Some(StatusMessage::info("<new file>"));
    }

    let result = screen.event_loop();
    let cleanup = leave_terminal();

    match result {
        Ok(()) => {
            cleanup?;
            Ok(RunStatus::Completed)
        }
        Err(err) => {
            log::error!("session aborted: {:#}", err);
            Ok(emergency_save(screen.session, &format!("{:#}", err)))
        }
    }
}

/// バッファを緊急保存して失敗終了コードを返す
fn emergency_save(session: &Session, reason: &str) -> RunStatus {
    log::error!("fatal: {}", reason);
    let primary = &session.config().recovery_path;
    match io::save_recovery(session.buffer().as_bytes(), primary) {
        Ok(saved) => eprintln!("Some error occured. memory saved to {}.", saved.display()),
        Err(err) => eprintln!("Some error occured. memory could not be saved: {}", err),
    }
    RunStatus::Failed
}

struct Screen<'a> {
    session: &'a mut Session,
    renderer: TerminalRenderer<Stdout>,
    decoder: KeyDecoder,
    minibuffer: Minibuffer,
    mode: DisplayMode,
    status: Option<StatusMessage>,
}

impl Screen<'_> {
    fn event_loop(&mut self) -> Result<()> {
        loop {
            let frame = Frame::compose(
                self.session,
                self.mode,
                self.status.clone(),
                self.minibuffer.display_string(),
            );
            self.renderer.draw(&frame).context("render")?;

            let key = read_key()?;
            self.status = None;

            if self.minibuffer.is_active() {
                let Some(prompt_key) = prompt_key(key) else {
                    continue;
                };
                if let PromptResult::Completed(line) = self.minibuffer.handle(prompt_key) {
                    let result = self.session.execute_line(&line);
                    if self.handle(result)? == Flow::Quit {
                        return Ok(());
                    }
                }
                continue;
            }

            let Some(action) = self.decoder.feed(key) else {
                continue;
            };
            match action {
                Action::SearchPrompt => self.minibuffer.start(PromptKind::Search),
                Action::CommandPrompt => self.minibuffer.start(PromptKind::Command),
                Action::ToggleUtf8 => self.mode.toggle_utf8(),
                Action::CycleUtf8Phase => self.mode.cycle_phase(),
                other => {
                    let result = self.session.apply_action(other);
                    if self.handle(result)? == Flow::Quit {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// コマンド結果を処理。回復できないエラーだけを返す
    fn handle(&mut self, result: BiResult<CommandOutcome>) -> Result<Flow> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) if err.is_recoverable() => {
                log::debug!("command failed: {}", err);
                self.status = Some(StatusMessage::from_error(&err));
                return Ok(Flow::Continue);
            }
            Err(err) => return Err(err.into()),
        };
        self.status = outcome.message;

        match outcome.effect {
            Effect::None => {}
            Effect::Quit => return Ok(Flow::Quit),
            Effect::RunScript { path, verbose } => return self.run_nested_script(&path, verbose),
            Effect::Shell(command) => {
                suspend_terminal()?;
                if let Err(err) = run_shell(&command) {
                    eprintln!("{}", err);
                }
                print!("[ Hit any key to return ]");
                stdout().flush()?;
                resume_terminal()?;
                read_key()?;
            }
            Effect::ShowMarks(listing) => {
                self.renderer
                    .show_text(&format!("{}\n[ hit any key ]", listing))
                    .context("show marks")?;
                read_key()?;
                execute!(stdout(), Clear(ClearType::All))?;
            }
        }
        Ok(Flow::Continue)
    }

    fn run_nested_script(&mut self, path: &str, verbose: bool) -> Result<Flow> {
        suspend_terminal()?;
        println!();
        let result = ScriptRunner::stdio().run_file(self.session, path, verbose);
        if verbose {
            print!("[ Hit any key ]");
            stdout().flush()?;
        }
        resume_terminal()?;
        if verbose {
            read_key()?;
        }
        match result {
            Ok(status) => {
                log::debug!("script {} ended: {:?}", path, status);
                Ok(Flow::Continue)
            }
            Err(err) if err.is_recoverable() => {
                self.status = Some(StatusMessage::from_error(&err));
                Ok(Flow::Continue)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// プロンプト入力用のキー変換
fn prompt_key(key: Key) -> Option<PromptKey> {
    match key.code {
        KeyCode::Enter => Some(PromptKey::Enter),
        KeyCode::Esc => Some(PromptKey::Escape),
        KeyCode::Backspace => Some(PromptKey::Backspace),
        KeyCode::Up => Some(PromptKey::HistoryPrev),
        KeyCode::Down => Some(PromptKey::HistoryNext),
        KeyCode::Char('h') if key.ctrl => Some(PromptKey::Backspace),
        KeyCode::Char(_) if key.ctrl => None,
        KeyCode::Char(ch) => Some(PromptKey::Char(ch)),
        _ => None,
    }
}

/// 押下イベントを1つ待つ
fn read_key() -> Result<Key> {
    loop {
        if let Event::Key(event) = event::read().context("event read")? {
            if event.kind == KeyEventKind::Press {
                return Ok(Key::from(event));
            }
        }
    }
}

fn enter_terminal() -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    execute!(stdout(), EnterAlternateScreen, Clear(ClearType::All))
        .context("enter alternate screen")?;
    Ok(())
}

fn leave_terminal() -> Result<()> {
    execute!(stdout(), LeaveAlternateScreen).context("leave alternate screen")?;
    disable_raw_mode().context("disable raw mode")?;
    Ok(())
}

/// 外部プロセスのために通常の端末へ戻す
fn suspend_terminal() -> Result<()> {
    leave_terminal()
}

fn resume_terminal() -> Result<()> {
    enter_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use tempfile::TempDir;

    #[test]
    fn prompt_keys() {
        assert_eq!(prompt_key(Key::plain('a')), Some(PromptKey::Char('a')));
        assert_eq!(prompt_key(Key::ctrl('h')), Some(PromptKey::Backspace));
        assert_eq!(prompt_key(Key::ctrl('x')), None);
        let enter = Key {
            ctrl: false,
            code: KeyCode::Enter,
        };
        assert_eq!(prompt_key(enter), Some(PromptKey::Enter));
    }

    #[test]
    fn emergency_save_writes_recovery_file() {
        let dir = TempDir::new().unwrap();
        let config = EditorConfig {
            recovery_path: dir.path().join("file.save"),
            ..EditorConfig::default()
        };
        let session = Session::from_bytes(b"keep".to_vec(), config);
        assert_eq!(emergency_save(&session, "test"), RunStatus::Failed);
        assert_eq!(std::fs::read(dir.path().join("file.save")).unwrap(), b"keep");
    }

    #[test]
    fn script_mode_writes_on_exit() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        let script = dir.path().join("fix.bi");
        std::fs::write(&file, b"ABCD").unwrap();
        std::fs::write(&script, "0,1d\n").unwrap();
        let options = CliOptions::parse([
            file.to_str().unwrap(),
            "-s",
            script.to_str().unwrap(),
            "-w",
        ])
        .unwrap();
        assert_eq!(run(options).unwrap(), RunStatus::Completed);
        assert_eq!(std::fs::read(&file).unwrap(), b"CD");
    }

    #[test]
    fn script_mode_without_write_leaves_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        let script = dir.path().join("fix.bi");
        std::fs::write(&file, b"ABCD").unwrap();
        std::fs::write(&script, "0,1d\n").unwrap();
        let options =
            CliOptions::parse([file.to_str().unwrap(), "-s", script.to_str().unwrap()]).unwrap();
        assert_eq!(run(options).unwrap(), RunStatus::Completed);
        assert_eq!(std::fs::read(&file).unwrap(), b"ABCD");
    }
}
