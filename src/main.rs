use std::io::{self, stdout, Stdout};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};

use commander::app::LogicThread;
use commander::command::{CommandDefinition, CommandLine};
use commander::config::Config;
use commander::dispatcher::{ActionOutcome, Dispatcher};
use commander::render::RenderState;
use commander::tmux::TmuxHost;
use commander::validator::{ValidationOutcome, Validator};
use commander::{clog, ui, Result};

const FRAME_DURATION: Duration = Duration::from_micros(16_666); // 60fps

/// Commander - run predefined shell commands in tmux, guarded by restricted patterns
#[derive(Parser, Debug)]
#[command(name = "commander")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    COMMANDER_DEBUG=1     Enable debug logging (alternative to --debug)\n    COMMANDER_LOG=<level> Set the log level (error, warn, info, debug, trace)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.commander/commander.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Config file to use instead of ~/.commander/commander.toml
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the configured commands
    List {
        /// Print the definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the first command with the given label
    Run {
        /// Label of the command to run
        label: String,
    },

    /// Check a command string against the restricted patterns
    Check {
        /// The command string to validate
        command: String,
    },

    /// Append a command definition to the config file
    Add {
        /// Label shown in the command list
        #[arg(long, short = 'l')]
        label: String,

        /// Run each line in its own pane, split from the first
        #[arg(long)]
        split: bool,

        /// Prefer the last used terminal for single commands
        #[arg(long)]
        reuse_terminal: bool,

        /// Skip restricted pattern checks for this command
        #[arg(long)]
        override_security: bool,

        /// One or more command lines; several lines form a sequence
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Print the restricted patterns in the order they are checked
    Patterns,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    commander::log::init_with_debug(cli.debug);

    let config_path = Config::resolve_path(cli.config.as_deref())?;

    match cli.command {
        Some(Command::List { json }) => return run_list(&config_path, json),
        Some(Command::Run { label }) => return run_command(&config_path, &label),
        Some(Command::Check { command }) => return run_check(&config_path, &command),
        Some(Command::Add {
            label,
            split,
            reuse_terminal,
            override_security,
            command,
        }) => {
            let mut def = CommandDefinition::new(label, CommandLine::from(command));
            def.split = split;
            def.reuse_terminal = reuse_terminal;
            def.override_security = override_security;
            return run_add(&config_path, def);
        }
        Some(Command::Patterns) => return run_patterns(&config_path),
        None => {
            // No subcommand: launch TUI
        }
    }

    if cli.debug {
        clog!("Commander starting (debug mode enabled)");
    } else {
        clog!("Commander starting");
    }

    let config = Config::load_from(&config_path)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let render_paused = Arc::new(AtomicBool::new(false));
    let render_acked = Arc::new(AtomicBool::new(false));
    let (state_tx, state_rx) = crossbeam_channel::bounded::<RenderState>(1);

    let shutdown_clone = shutdown.clone();
    let render_paused_clone = render_paused.clone();
    let render_acked_clone = render_acked.clone();
    let logic_handle = thread::spawn(move || {
        LogicThread::run(
            config,
            config_path,
            state_tx,
            shutdown_clone,
            render_paused_clone,
            render_acked_clone,
        )
    });

    let mut terminal = setup_terminal()?;
    let result = render_loop(
        &mut terminal,
        state_rx,
        &shutdown,
        &render_paused,
        &render_acked,
    );

    shutdown.store(true, Ordering::SeqCst);
    let logic_result = logic_handle.join();
    restore_terminal(&mut terminal)?;

    if let Ok(Err(e)) = logic_result {
        return Err(e);
    }
    result
}

fn run_list(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::load_from(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config.commands)?);
        return Ok(());
    }

    if config.commands.is_empty() {
        println!("No commands configured in {}", config_path.display());
        return Ok(());
    }

    println!("{:<24}  {:<9}  COMMAND", "LABEL", "MODE");
    for def in &config.commands {
        let mode = if def.override_security {
            format!("{}!", def.mode())
        } else {
            def.mode().to_string()
        };
        println!(
            "{:<24}  {:<9}  {}",
            truncate_string(&def.label, 24),
            mode,
            def.command.summary()
        );
    }
    Ok(())
}

fn run_command(config_path: &Path, label: &str) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let catalog = config.catalog();
    let def = catalog.find(label)?;

    clog!("Run command: label={:?} mode={}", label, def.mode());

    let mut host = TmuxHost::new(config.effective_session())?;
    let validator = Validator::new(config.restricted_patterns.clone());
    let report = Dispatcher::new(&mut host, &validator).dispatch(def);

    for outcome in &report.outcomes {
        match outcome {
            ActionOutcome::Sent { session, command } => {
                println!("  sent     {}  {}", session, command);
            }
            ActionOutcome::Denied { command, denial, .. } => {
                println!("  denied   {}", command);
                println!("           {}", denial);
            }
            ActionOutcome::Failed { command, error, .. } => {
                println!("  failed   {}", command);
                println!("           {}", error);
            }
        }
    }
    println!("{}", report.summary());

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(config_path: &Path, command: &str) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let validator = Validator::new(config.restricted_patterns);

    match validator.check(command) {
        ValidationOutcome::Allowed => {
            println!("allowed");
            Ok(())
        }
        ValidationOutcome::Denied(denial) => {
            println!("{}", denial);
            std::process::exit(1);
        }
    }
}

fn run_add(config_path: &Path, def: CommandDefinition) -> Result<()> {
    let mut config = Config::load_from(config_path)?;
    let label = def.label.clone();
    let mode = def.mode();
    config.add_command(def)?;
    config.save_to(config_path)?;

    clog!("Added command '{}' ({}) to {}", label, mode, config_path.display());
    println!("Added '{}' ({}) to {}", label, mode, config_path.display());
    Ok(())
}

fn run_patterns(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let user_count = config.restricted_patterns.len();
    let validator = Validator::new(config.restricted_patterns);

    for (idx, pattern) in validator.patterns().iter().enumerate() {
        let source = if idx < user_count { "user" } else { "default" };
        println!("{:>3}  {:<8} {}", idx + 1, source, pattern);
    }
    Ok(())
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}~", truncated)
    }
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: Receiver<RenderState>,
    shutdown: &AtomicBool,
    render_paused: &AtomicBool,
    render_acked: &AtomicBool,
) -> Result<()> {
    let mut state = RenderState::default();
    let mut last_version: u64 = 0;
    let mut last_frame = Instant::now();
    let mut dirty = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        if render_paused.load(Ordering::Acquire) {
            render_acked.store(true, Ordering::Release);
            while render_paused.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
            render_acked.store(false, Ordering::Release);
            terminal.clear()?;
            dirty = true;
            continue;
        }

        match state_rx.try_recv() {
            Ok(s) => {
                dirty = dirty || s.version != last_version;
                state = s;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if last_frame.elapsed() < FRAME_DURATION {
            thread::sleep(Duration::from_micros(500));
            continue;
        }
        last_frame = Instant::now();

        if dirty {
            terminal.draw(|f| ui::draw(f, &state))?;
            last_version = state.version;
            dirty = false;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(disable_raw_mode()?)
}
