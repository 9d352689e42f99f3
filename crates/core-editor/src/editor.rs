//! The editor: owner of every registry, the view collections, macro state,
//! async processes, and the input/render endpoints. All mutation happens on
//! the main loop; worker threads only move bytes into channels.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use core_input::InputSource;
use core_keymap::{Keymap, KeymapRegistry};
use core_keys::{Keystroke, SpecialKey};
use core_model::{OpenOpts, View, ViewId, ViewKind, Views};
use core_proc::{AsyncProc, ProcId};
use core_render::{NoopRenderer, Renderer};
use core_text::{Buffer, Position};
use tracing::{debug, info, warn};

use crate::CoreError;
use crate::command::{CommandObserver, CommandRegistry};
use crate::config::EditorConfig;
use crate::macros::{Macro, MacroReplay};
use crate::mux::{ProcCallback, ProcEntry, ProcTable};
use crate::prompt::IsearchState;

pub const KMAP_PROMPT_INPUT: &str = "mle_prompt_input";
pub const KMAP_PROMPT_YN: &str = "mle_prompt_yn";
pub const KMAP_PROMPT_YNA: &str = "mle_prompt_yna";
pub const KMAP_PROMPT_OK: &str = "mle_prompt_ok";
pub const KMAP_PROMPT_MENU: &str = "mle_prompt_menu";
pub const KMAP_PROMPT_PMENU: &str = "mle_prompt_pmenu";
pub const KMAP_PROMPT_ISEARCH: &str = "mle_prompt_isearch";

pub struct Editor {
    pub views: Views,
    pub keymaps: KeymapRegistry,
    pub commands: CommandRegistry,
    pub macros: HashMap<String, Macro>,
    pub recording: Option<Macro>,
    pub replay: Option<MacroReplay>,
    pub procs: ProcTable,
    pub config: EditorConfig,
    /// Target of `copy-by`.
    pub paste_register: String,
    /// User-visible failure surface; drawn on the status bar.
    pub status_msg: Option<String>,
    pub isearch: Option<IsearchState>,
    pub(crate) input: Box<dyn InputSource>,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) observers: Vec<Box<dyn CommandObserver>>,
    shutdown: Arc<AtomicBool>,
    pub(crate) loop_depth: u32,
    next_proc_id: u64,
}

impl Editor {
    pub fn new(
        config: EditorConfig,
        input: Box<dyn InputSource>,
        renderer: Box<dyn Renderer>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let mut keymaps = KeymapRegistry::new();
        install_default_keymaps(&mut keymaps);

        let mut views = Views::new(config.initial_kmap.clone());
        views.open(ViewKind::Status, Buffer::new("status"), OpenOpts::default());
        views.open(
            ViewKind::Edit,
            Buffer::new("untitled"),
            OpenOpts {
                set_active: true,
                ..OpenOpts::default()
            },
        );

        Self {
            views,
            keymaps,
            commands: CommandRegistry::new(),
            macros: HashMap::new(),
            recording: None,
            replay: None,
            procs: ProcTable::default(),
            config,
            paste_register: String::new(),
            status_msg: None,
            isearch: None,
            input,
            renderer,
            observers: Vec::new(),
            shutdown,
            loop_depth: 0,
            next_proc_id: 0,
        }
    }

    /// Editor without a terminal: scripted input, no drawing. Tests and
    /// tooling use this to drive the loop deterministically.
    pub fn headless(config: EditorConfig, input: Box<dyn InputSource>) -> Self {
        Self::new(
            config,
            input,
            Box::new(NoopRenderer),
            Arc::new(AtomicBool::new(false)),
        )
    }

    pub fn add_observer(&mut self, observer: Box<dyn CommandObserver>) {
        self.observers.push(observer);
    }

    /// Nesting depth of the event loop; 0 outside any loop.
    pub fn loop_depth(&self) -> u32 {
        self.loop_depth
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn active_view(&self) -> Option<&View> {
        self.views.active().and_then(|id| self.views.get(id))
    }

    pub fn active_view_mut(&mut self) -> Option<&mut View> {
        self.views.active().and_then(|id| self.views.get_mut(id))
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_msg = Some(msg.into());
    }

    pub fn resize(&mut self, w: u16, h: u16) {
        self.views.resize(w, h);
    }

    /// Open `path` into a new active EDIT view. A missing file opens an
    /// empty buffer bound to the path; read failures surface on the status
    /// bar and still produce a view.
    pub fn open_file(&mut self, path: &Path, line: Option<usize>) -> ViewId {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();
        let mut buffer = match std::fs::read_to_string(path) {
            Ok(text) => {
                let mut b = Buffer::from_str(name, text.trim_end_matches('\n'));
                b.mark_clean();
                b
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Buffer::new(name),
            Err(e) => {
                warn!(target: "runtime", path = %path.display(), error = %e, "file_open_error");
                self.set_status(format!("cannot open {}: {e}", path.display()));
                Buffer::new(name)
            }
        };
        buffer.path = Some(path.to_path_buf());
        let id = self.views.open(
            ViewKind::Edit,
            buffer,
            OpenOpts {
                set_active: true,
                line,
                ..OpenOpts::default()
            },
        );
        info!(target: "runtime", path = %path.display(), view = id.0, "file_opened");
        id
    }

    /// Open a MENU view, optionally fed by an async process whose output
    /// populates the buffer. `callback` is the command fired on submission.
    pub fn open_menu(
        &mut self,
        title: &str,
        callback: &str,
        proc_cmdline: Option<&str>,
    ) -> Result<ViewId, CoreError> {
        let id = self.views.open(
            ViewKind::Menu,
            Buffer::new(title),
            OpenOpts {
                set_active: true,
                ..OpenOpts::default()
            },
        );
        if let Some(view) = self.views.get_mut(id) {
            view.kmap_stack = vec![
                self.config.initial_kmap.clone(),
                KMAP_PROMPT_MENU.to_string(),
            ];
            view.menu_callback = Some(callback.to_string());
        }
        if let Some(cmdline) = proc_cmdline {
            self.spawn_view_proc(id, cmdline, None)?;
        }
        Ok(id)
    }

    /// Spawn an async process whose stdout is appended to `view`'s buffer.
    pub fn spawn_view_proc(
        &mut self,
        view: ViewId,
        cmdline: &str,
        timeout: Option<Duration>,
    ) -> Result<ProcId, CoreError> {
        let id = ProcId(self.next_proc_id);
        self.next_proc_id += 1;
        let proc = AsyncProc::spawn(id, &self.config.shell, cmdline, timeout)?;
        let target = view;
        let callback: ProcCallback = Box::new(move |ed, update| {
            if update.bytes.is_empty() {
                return Ok(());
            }
            let text = String::from_utf8_lossy(&update.bytes).into_owned();
            if let Some(v) = ed.views.get_mut(target) {
                v.buffer.append(&text);
                v.buffer.mark_clean();
            }
            Ok(())
        });
        if let Some(v) = self.views.get_mut(view) {
            v.proc = Some(id.0);
        }
        self.procs.add(ProcEntry {
            proc,
            view: Some(view),
            callback,
        });
        Ok(id)
    }

    /// Run a command line under the configured shell and capture stdout.
    /// Blocking by contract; only the tab-completion collaborator uses it.
    pub fn shell_capture(&self, cmdline: &str) -> Result<String, CoreError> {
        let out = Command::new(&self.config.shell)
            .arg("-c")
            .arg(cmdline)
            .output()
            .map_err(|e| CoreError::Resource(format!("shell `{cmdline}`: {e}")))?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    /// Crash path: write `mle.bak.<pid>.<n>` into `dir` for every unsaved
    /// EDIT buffer. Prompt/menu/status views carry no file and are skipped.
    pub fn write_crash_backups(&self, dir: &Path) -> Vec<PathBuf> {
        let pid = std::process::id();
        let mut written = Vec::new();
        for view in self.views.iter() {
            if view.kind != ViewKind::Edit || !view.buffer.is_dirty() {
                continue;
            }
            let path = dir.join(format!("mle.bak.{pid}.{}", written.len()));
            match std::fs::write(&path, view.buffer.text()) {
                Ok(()) => {
                    info!(target: "runtime", path = %path.display(), "crash_backup_written");
                    written.push(path);
                }
                Err(e) => {
                    warn!(target: "runtime", path = %path.display(), error = %e, "crash_backup_failed");
                }
            }
        }
        written
    }

    /// Register a macro parsed from `name,key1,...` line syntax. Empty
    /// macros are rejected.
    pub fn register_macro(&mut self, m: Macro) -> Result<(), CoreError> {
        if m.keys.is_empty() {
            return Err(CoreError::Config(format!("macro `{}` has no keys", m.name)));
        }
        debug!(target: "loop.macro", name = %m.name, keys = m.keys.len(), "macro_registered");
        self.macros.insert(m.name.clone(), m);
        Ok(())
    }

    /// Begin replaying a registered macro on the next input acquisition.
    pub fn start_replay(&mut self, name: &str) -> Result<(), CoreError> {
        let Some(m) = self.macros.get(name) else {
            return Err(CoreError::Config(format!("unknown macro `{name}`")));
        };
        self.replay = Some(MacroReplay::new(m.keys.clone()));
        debug!(target: "loop.macro", name, "replay_started");
        Ok(())
    }

    pub(crate) fn status_line(&self) -> (String, String) {
        let left = match self.active_view() {
            Some(v) => {
                let dirty = if v.buffer.is_dirty() { "*" } else { "" };
                format!("{}{dirty}", v.buffer.name)
            }
            None => String::new(),
        };
        let mut right = String::new();
        if let Some(v) = self.active_view() {
            let c = v.cursor().pos;
            right.push_str(&format!("{}:{}", c.line + 1, c.col + 1));
        }
        if self.recording.is_some() {
            right.push_str("  [rec]");
        }
        let left = match &self.status_msg {
            Some(msg) => format!("{left}  {msg}"),
            None => left,
        };
        (left, right)
    }

    pub(crate) fn move_active_cursor(&mut self, view: ViewId, pos: Position) {
        if let Some(v) = self.views.get_mut(view) {
            v.move_cursor_to(pos);
        }
    }
}

/// Install the stock keymaps: the normal map plus the fixed prompt/menu
/// contracts. Built with key constants so installation cannot fail.
fn install_default_keymaps(reg: &mut KeymapRegistry) {
    use Keystroke as K;
    use crate::commands::*;

    let mut normal = Keymap::new(crate::config::DEFAULT_KMAP, Some(CMD_INSERT_DATA), false);
    normal.bind_keys(CMD_INSERT_NEWLINE, &[K::special(SpecialKey::Enter)], None);
    normal.bind_keys(CMD_DELETE_BEFORE, &[K::special(SpecialKey::Backspace)], None);
    normal.bind_keys(CMD_DELETE_AFTER, &[K::special(SpecialKey::Delete)], None);
    normal.bind_keys(CMD_MOVE_RELATIVE, &[K::special(SpecialKey::Up)], Some("up"));
    normal.bind_keys(
        CMD_MOVE_RELATIVE,
        &[K::special(SpecialKey::Down)],
        Some("down"),
    );
    normal.bind_keys(
        CMD_MOVE_RELATIVE,
        &[K::special(SpecialKey::Left)],
        Some("left"),
    );
    normal.bind_keys(
        CMD_MOVE_RELATIVE,
        &[K::special(SpecialKey::Right)],
        Some("right"),
    );
    normal.bind_keys(CMD_MOVE_BOL, &[K::special(SpecialKey::Home)], None);
    normal.bind_keys(CMD_MOVE_EOL, &[K::special(SpecialKey::End)], None);
    normal.bind_keys(CMD_MOVE_PAGE_UP, &[K::special(SpecialKey::PageUp)], None);
    normal.bind_keys(CMD_MOVE_PAGE_DOWN, &[K::special(SpecialKey::PageDown)], None);
    normal.bind_keys(CMD_COPY_BY, &[K::ctrl('c'), K::ch('d')], Some("bracket"));
    normal.bind_keys(CMD_COPY_BY, &[K::ctrl('c'), K::ch('w')], Some("word"));
    normal.bind_keys(CMD_COPY_BY, &[K::ctrl('c'), K::ch('l')], Some("line"));
    normal.bind_keys(
        CMD_MOVE_TO_LINE,
        &[K::alt('g'), K::NUMERIC, K::ch('g')],
        None,
    );
    normal.bind_keys(CMD_QUIT, &[K::ctrl('x')], None);
    normal.bind_keys(CMD_SEARCH, &[K::ctrl('s')], None);
    normal.bind_keys(CMD_BROWSE, &[K::ctrl('b')], None);
    normal.bind_keys(CMD_SHELL, &[K::alt('e')], None);
    normal.bind_keys(CMD_VIEW_SPLIT_VERTICAL, &[K::alt('v')], None);
    normal.bind_keys(CMD_VIEW_SPLIT_HORIZONTAL, &[K::alt('h')], None);
    normal.bind_keys(CMD_VIEW_CLOSE, &[K::alt('w')], None);
    normal.bind_keys(CMD_VIEW_NEXT, &[K::ctrl('n')], None);
    normal.bind_keys(CMD_VIEW_PREV, &[K::ctrl('p')], None);
    normal.bind_keys(CMD_MACRO_REPLAY, &[K::alt('p')], None);
    reg.insert(normal);

    let mut input = Keymap::new(KMAP_PROMPT_INPUT, None, true);
    input.bind_keys(CMD_PROMPT_SUBMIT, &[K::special(SpecialKey::Enter)], None);
    input.bind_keys(CMD_PROMPT_TAB_COMPLETE, &[K::special(SpecialKey::Tab)], None);
    input.bind_keys(CMD_PROMPT_CANCEL, &[K::ctrl('c')], None);
    input.bind_keys(CMD_PROMPT_CANCEL, &[K::ctrl('x')], None);
    input.bind_keys(CMD_PROMPT_CANCEL, &[K::alt('c')], None);
    reg.insert(input);

    let mut yn = Keymap::new(KMAP_PROMPT_YN, None, false);
    yn.bind_keys(CMD_PROMPT_YES, &[K::ch('y')], None);
    yn.bind_keys(CMD_PROMPT_NO, &[K::ch('n')], None);
    yn.bind_keys(CMD_PROMPT_CANCEL, &[K::ctrl('c')], None);
    yn.bind_keys(CMD_PROMPT_CANCEL, &[K::ctrl('x')], None);
    yn.bind_keys(CMD_PROMPT_CANCEL, &[K::alt('c')], None);
    let mut yna = yn.clone();
    yna.name = KMAP_PROMPT_YNA.to_string();
    yna.bind_keys(CMD_PROMPT_ALL, &[K::ch('a')], None);
    reg.insert(yn);
    reg.insert(yna);

    let ok = Keymap::new(KMAP_PROMPT_OK, Some(CMD_PROMPT_OK), false);
    reg.insert(ok);

    let mut menu = Keymap::new(KMAP_PROMPT_MENU, None, false);
    menu.bind_keys(CMD_MENU_SUBMIT, &[K::special(SpecialKey::Enter)], None);
    menu.bind_keys(CMD_MENU_CANCEL, &[K::ctrl('c')], None);
    bind_menu_motion(&mut menu);
    reg.insert(menu);

    let mut pmenu = Keymap::new(KMAP_PROMPT_PMENU, None, false);
    pmenu.bind_keys(CMD_PMENU_SUBMIT, &[K::special(SpecialKey::Enter)], None);
    pmenu.bind_keys(CMD_PROMPT_CANCEL, &[K::ctrl('c')], None);
    bind_menu_motion(&mut pmenu);
    reg.insert(pmenu);

    let mut isearch = Keymap::new(KMAP_PROMPT_ISEARCH, None, true);
    isearch.bind_keys(CMD_PROMPT_SUBMIT, &[K::special(SpecialKey::Enter)], None);
    isearch.bind_keys(CMD_PROMPT_CANCEL, &[K::ctrl('c')], None);
    isearch.bind_keys(CMD_ISEARCH_PREV, &[K::special(SpecialKey::Up)], None);
    isearch.bind_keys(CMD_ISEARCH_NEXT, &[K::special(SpecialKey::Down)], None);
    isearch.bind_keys(CMD_ISEARCH_DROP_CURSORS, &[K::alt('a')], None);
    reg.insert(isearch);
}

fn bind_menu_motion(map: &mut Keymap) {
    use Keystroke as K;
    use crate::commands::*;
    map.bind_keys(CMD_MOVE_RELATIVE, &[K::special(SpecialKey::Up)], Some("up"));
    map.bind_keys(
        CMD_MOVE_RELATIVE,
        &[K::special(SpecialKey::Down)],
        Some("down"),
    );
    map.bind_keys(CMD_MOVE_PAGE_UP, &[K::special(SpecialKey::PageUp)], None);
    map.bind_keys(CMD_MOVE_PAGE_DOWN, &[K::special(SpecialKey::PageDown)], None);
}
