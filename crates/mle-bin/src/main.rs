//! mle entrypoint: RC + CLI parsing, logging, signal flags, terminal
//! setup, the main loop, and the crash-backup exit path.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use core_editor::{Editor, LoopExit, Macro};
use core_input::TerminalSource;
use core_keymap::Keymap;
use core_keys::parse_macro_line;
use core_render::CrosstermRenderer;
use core_terminal::{CrosstermBackend, TerminalBackend};
use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod cli;

use cli::Startup;

fn main() -> ExitCode {
    let _log_guard = configure_logging();

    let home = std::env::var_os("HOME").map(std::path::PathBuf::from);
    let rc = cli::rc_args(home.as_deref(), Path::new("/etc/mlerc"));
    let argv = cli::effective_argv(rc, std::env::args());
    let matches = match cli::command().try_get_matches_from(argv) {
        Ok(m) => m,
        // Help/version print and exit 0; real parse errors exit non-zero.
        Err(e) => e.exit(),
    };
    let startup = Startup::from_matches(&matches);

    match run(startup) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mle: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(startup: Startup) -> Result<ExitCode> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for sig in [SIGTERM, SIGINT, SIGQUIT, SIGHUP] {
        signal_hook::flag::register(sig, shutdown.clone())?;
    }

    let mut backend = CrosstermBackend::new();
    let (w, h) = backend.size().unwrap_or((80, 24));
    let guard = backend.enter_guard()?;

    let mut editor = Editor::new(
        startup.config.clone(),
        Box::new(TerminalSource::spawn()),
        Box::new(CrosstermRenderer::new()),
        shutdown,
    );
    editor.resize(w, h);
    let mut config_error = startup.config_error;
    config_error |= !apply_startup(&mut editor, &startup);
    info!(target: "runtime", views = editor.views.len(), "startup_complete");

    let exit = editor.run();
    drop(guard);

    match exit {
        Ok(LoopExit::Shutdown) => {
            // Fatal signal: back up unsaved buffers and report code 1.
            let written = editor.write_crash_backups(Path::new("."));
            info!(target: "runtime", backups = written.len(), "signal_exit");
            Ok(ExitCode::from(1))
        }
        Ok(_) => Ok(ExitCode::from(u8::from(config_error))),
        Err(e) => Err(e.into()),
    }
}

/// Install CLI keymaps/macros and open positional files. Returns false when
/// any definition was rejected (startup continues regardless).
fn apply_startup(editor: &mut Editor, startup: &Startup) -> bool {
    let mut ok = true;

    for spec in &startup.keymaps {
        if !editor.keymaps.contains(&spec.name) {
            editor.keymaps.insert(Keymap::new(
                &spec.name,
                spec.default_command.as_deref(),
                spec.allow_fallthru,
            ));
        }
        for bind in &spec.bindings {
            // Commands may be registered later; accept the name now.
            editor.commands.register_late(&bind.command);
            let result = editor
                .keymaps
                .require_mut(&spec.name)
                .and_then(|m| m.bind(&bind.command, &bind.pattern, bind.param.as_deref()));
            if let Err(e) = result {
                warn!(target: "runtime.config", keymap = %spec.name, error = %e, "bad binding");
                ok = false;
            }
        }
    }
    if !editor.keymaps.contains(&editor.config.initial_kmap) {
        warn!(
            target: "runtime.config",
            keymap = %editor.config.initial_kmap,
            "initial keymap is not defined"
        );
        ok = false;
    }

    for line in &startup.macro_lines {
        let result = parse_macro_line(line)
            .map_err(core_editor::CoreError::from)
            .and_then(|(name, keys)| editor.register_macro(Macro::with_keys(name, keys)));
        if let Err(e) = result {
            warn!(target: "runtime.config", error = %e, "bad macro definition");
            ok = false;
        }
    }

    for script in &startup.config.scripts {
        // Scripting is handled by an external engine; record and move on.
        warn!(target: "runtime.config", script = %script.display(), "script engine not present, ignoring");
    }

    for (path, line) in &startup.files {
        if path.is_dir() {
            if let Err(e) = editor.browse_dir(path) {
                warn!(target: "runtime", path = %path.display(), error = %e, "browse failed");
                ok = false;
            }
        } else {
            editor.open_file(path, *line);
        }
    }
    ok
}

fn configure_logging() -> Option<WorkerGuard> {
    let appender = tracing_appender::rolling::never(".", "mle.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}
