use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::render::RenderState;
use crate::tea::{update, Command, Message, Model};
use crate::tmux::{sanitize_session_name, Tmux, TmuxHost};
use crate::validator::Validator;
use crate::watcher::ConfigWatcher;
use crate::{clog, clog_debug, clog_error, clog_warn, Result};

const MAX_BG_MESSAGES: usize = 50;
const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct LogicThread;

impl LogicThread {
    pub fn run(
        config: Config,
        config_path: PathBuf,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
        render_paused: Arc<AtomicBool>,
        render_acked: Arc<AtomicBool>,
    ) -> Result<()> {
        clog_debug!(
            "LogicThread::run commands={} session={}",
            config.commands.len(),
            config.effective_session()
        );

        let (reload_tx, reload_rx) = crossbeam_channel::unbounded::<()>();
        // A missing watcher only disables live reload; 'r' still works.
        let _watcher = match ConfigWatcher::spawn(&config_path, reload_tx) {
            Ok(w) => Some(w),
            Err(e) => {
                clog_warn!("Config watcher unavailable: {}", e);
                None
            }
        };

        let mut runtime = Runtime {
            model: Model::new(config, config_path),
            host: None,
            pending: VecDeque::new(),
            render_paused,
            render_acked,
        };

        send_state(&state_tx, &runtime.model);
        let mut esc_filter = EscapeSequenceFilter::new();

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Keyboard input (priority)
            if event::poll(POLL_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) => {
                        if let KeyCode::Char(c) = key.code {
                            if esc_filter.filter(c) {
                                continue;
                            }
                        }
                        if runtime.handle(Message::Key(key)) {
                            shutdown.store(true, Ordering::Relaxed);
                            return Ok(());
                        }
                    }
                    Event::Resize(w, h) => {
                        runtime.handle(Message::Resize(w, h));
                    }
                    _ => {}
                }
            }

            // Coalesce bursts of watcher events into one reload.
            if reload_rx.try_iter().count() > 0 {
                runtime.pending.push_back(Message::ConfigChanged);
            }

            // Background messages (bounded)
            for _ in 0..MAX_BG_MESSAGES {
                let Some(msg) = runtime.pending.pop_front() else {
                    break;
                };
                if runtime.handle(msg) {
                    shutdown.store(true, Ordering::Relaxed);
                    return Ok(());
                }
            }

            if runtime.model.dirty {
                send_state(&state_tx, &runtime.model);
                runtime.model.dirty = false;
            }
        }

        Ok(())
    }
}

/// Owns everything the logic thread mutates between loop iterations.
struct Runtime {
    model: Model,
    /// Created on first dispatch so the TUI opens even when tmux is missing.
    host: Option<TmuxHost>,
    pending: VecDeque<Message>,
    render_paused: Arc<AtomicBool>,
    render_acked: Arc<AtomicBool>,
}

impl Runtime {
    /// Feed one message through `update` and run the resulting commands.
    /// Returns true when the app should quit.
    fn handle(&mut self, msg: Message) -> bool {
        for cmd in update(&mut self.model, msg) {
            if self.execute_command(cmd) {
                return true;
            }
        }
        false
    }

    fn execute_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Dispatch(def) => {
                clog_debug!("Command::Dispatch label={} mode={}", def.label, def.mode());
                let session = self.model.config.effective_session().to_string();
                let validator = Validator::new(self.model.config.restricted_patterns.clone());

                let host = match self.host_for(&session) {
                    Ok(host) => host,
                    Err(e) => {
                        clog_error!("Cannot open terminal host: {}", e);
                        self.pending
                            .push_back(Message::DispatchFailed(def.label, e.to_string()));
                        return false;
                    }
                };

                let report = Dispatcher::new(host, &validator).dispatch(&def);
                clog!("Dispatch finished: {}", report.summary());
                self.pending.push_back(Message::Dispatched(report));
            }

            Command::ReloadConfig => {
                let path = self.model.config_path.clone();
                clog_debug!("Command::ReloadConfig path={}", path.display());
                match Config::load_from(&path) {
                    Ok(config) => self.pending.push_back(Message::ConfigReloaded(config)),
                    Err(e) => {
                        clog_warn!("Config reload failed: {}", e);
                        self.pending
                            .push_back(Message::ConfigReloadFailed(e.to_string()));
                    }
                }
            }

            Command::AttachTmux { session } => {
                let name = sanitize_session_name(&session);
                clog_debug!("Command::AttachTmux session={}", name);

                if !Tmux::session_exists(&name) {
                    self.pending.push_back(Message::AttachFailed(format!(
                        "tmux session '{}' does not exist yet; run a command first",
                        name
                    )));
                    return false;
                }

                let result = if Tmux::inside_tmux() {
                    Tmux::attach(&name)
                } else {
                    self.render_paused.store(true, Ordering::Release);
                    while !self.render_acked.load(Ordering::Acquire) {
                        std::hint::spin_loop();
                    }

                    let _ = disable_raw_mode();
                    let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
                    let result = Tmux::attach(&name);
                    let _ = enable_raw_mode();
                    let _ = execute!(std::io::stdout(), EnterAlternateScreen);

                    self.render_paused.store(false, Ordering::Release);
                    result
                };

                if let Err(e) = result {
                    self.pending.push_back(Message::AttachFailed(e.to_string()));
                }

                // When attach returns, user has already detached from tmux
                self.model.dirty = true;
            }

            Command::Quit => {
                clog_debug!("Command::Quit");
                return true;
            }
        }

        false
    }

    /// The tmux host for `session`, rebuilt when a reload renamed the session.
    fn host_for(&mut self, session: &str) -> Result<&mut TmuxHost> {
        let host = match self.host.take() {
            Some(host) if host.session() == sanitize_session_name(session) => host,
            stale => {
                if stale.is_some() {
                    clog_debug!("tmux session renamed, dropping host");
                }
                TmuxHost::new(session)?
            }
        };
        Ok(self.host.insert(host))
    }
}

fn send_state(state_tx: &Sender<RenderState>, model: &Model) {
    let _ = state_tx.try_send(model.snapshot());
}

struct EscapeSequenceFilter {
    len: u8,
    active: bool,
}

impl EscapeSequenceFilter {
    fn new() -> Self {
        Self {
            len: 0,
            active: false,
        }
    }

    fn filter(&mut self, c: char) -> bool {
        if c == '\x1b' || c == '[' || c == 'O' {
            self.active = true;
            self.len = 1;
            return true;
        }
        if self.active {
            self.len += 1;
            if c.is_ascii_alphabetic() || c == '~' || self.len > 10 {
                self.active = false;
            }
            return true;
        }
        false
    }
}
