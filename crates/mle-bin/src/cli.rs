//! Argument parsing: short options, left-to-right semantics for keymap and
//! syntax definitions, RC-file assembly, and `path:line` positionals.
//!
//! `-K` opens a keymap definition and subsequent `-k` bindings attach to
//! it; bindings seen before any `-K` attach to the initial keymap. The
//! same ordering applies to `-S`/`-s` syntax definitions. Clap reports
//! argument indices, which recovers the interleaving after parsing.

use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use core_editor::{EditorConfig, LinenumType, SyntaxDef, SyntaxRule};
use core_keys::parse_key;

pub fn command() -> Command {
    Command::new("mle")
        .about("small, modal, terminal-based text editor")
        .version(env!("CARGO_PKG_VERSION"))
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .action(ArgAction::Version)
                .help("print version and exit"),
        )
        .arg(
            Arg::new("tab_to_space")
                .overrides_with("tab_to_space")
                .short('a')
                .value_name("0|1")
                .value_parser(["0", "1"])
                .help("convert tabs to spaces"),
        )
        .arg(
            Arg::new("brackets")
                .overrides_with("brackets")
                .short('b')
                .action(ArgAction::SetTrue)
                .help("highlight bracket pairs"),
        )
        .arg(
            Arg::new("color_column")
                .overrides_with("color_column")
                .short('c')
                .value_name("column")
                .value_parser(value_parser!(u16))
                .help("color column"),
        )
        .arg(
            Arg::new("kdef")
                .short('K')
                .value_name("kdef")
                .action(ArgAction::Append)
                .help("start a keymap definition (name,default_cmd,allow_fallthru)"),
        )
        .arg(
            Arg::new("kbind")
                .short('k')
                .value_name("kbind")
                .action(ArgAction::Append)
                .help("add a binding to the current keymap (cmd,key[,param])"),
        )
        .arg(
            Arg::new("linenum")
                .overrides_with("linenum")
                .short('l')
                .value_name("0|1|2")
                .value_parser(["0", "1", "2"])
                .help("linenum type (absolute/relative/both)"),
        )
        .arg(
            Arg::new("macro")
                .short('M')
                .value_name("macro")
                .action(ArgAction::Append)
                .help("register a macro (name,key1,...,keyN)"),
        )
        .arg(
            Arg::new("toggle_key")
                .overrides_with("toggle_key")
                .short('m')
                .value_name("key")
                .help("macro toggle key"),
        )
        .arg(
            Arg::new("kmap")
                .overrides_with("kmap")
                .short('n')
                .value_name("kmap")
                .help("initial keymap"),
        )
        .arg(
            Arg::new("syndef")
                .short('S')
                .value_name("syndef")
                .action(ArgAction::Append)
                .help("start a syntax definition (name,path_pattern)"),
        )
        .arg(
            Arg::new("synrule")
                .short('s')
                .value_name("synrule")
                .action(ArgAction::Append)
                .help("add a syntax rule (start,end,fg,bg or regex,fg,bg)"),
        )
        .arg(
            Arg::new("tab_width")
                .overrides_with("tab_width")
                .short('t')
                .value_name("width")
                .value_parser(value_parser!(u8).range(1..=32))
                .help("tab width"),
        )
        .arg(
            Arg::new("script")
                .short('x')
                .value_name("script")
                .action(ArgAction::Append)
                .help("run user script"),
        )
        .arg(
            Arg::new("syntax")
                .overrides_with("syntax")
                .short('y')
                .value_name("syntax")
                .help("syntax override"),
        )
        .arg(
            Arg::new("trim_paste")
                .overrides_with("trim_paste")
                .short('z')
                .value_name("0|1")
                .value_parser(["0", "1"])
                .help("trim trailing whitespace from pastes"),
        )
        .arg(
            Arg::new("files")
                .value_name("path[:line]")
                .action(ArgAction::Append)
                .help("files to open (directories open the browser)"),
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmapSpec {
    pub name: String,
    pub default_command: Option<String>,
    pub allow_fallthru: bool,
    pub bindings: Vec<KbindSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KbindSpec {
    pub command: String,
    pub pattern: String,
    pub param: Option<String>,
}

/// Everything startup needs, decoded from an `ArgMatches`.
#[derive(Debug, Default)]
pub struct Startup {
    pub config: EditorConfig,
    /// Keymap definitions in argv order; the synthetic entry for the
    /// initial keymap (bindings before any `-K`) comes first when present.
    pub keymaps: Vec<KmapSpec>,
    pub macro_lines: Vec<String>,
    pub files: Vec<(PathBuf, Option<usize>)>,
    /// A malformed definition was skipped; the process exit code reports
    /// failure after a normal run.
    pub config_error: bool,
}

pub fn parse_kdef(s: &str) -> Result<KmapSpec, String> {
    let fields: Vec<&str> = s.split(',').collect();
    let [name, default_command, allow_fallthru] = fields.as_slice() else {
        return Err(format!("kdef `{s}`: expected name,default_cmd,allow_fallthru"));
    };
    if name.is_empty() {
        return Err(format!("kdef `{s}`: empty keymap name"));
    }
    let allow_fallthru = match *allow_fallthru {
        "0" => false,
        "1" => true,
        other => return Err(format!("kdef `{s}`: bad fallthru flag `{other}`")),
    };
    Ok(KmapSpec {
        name: name.to_string(),
        default_command: (!default_command.is_empty()).then(|| default_command.to_string()),
        allow_fallthru,
        bindings: Vec::new(),
    })
}

pub fn parse_kbind(s: &str) -> Result<KbindSpec, String> {
    let mut fields = s.splitn(3, ',');
    let command = fields.next().unwrap_or("");
    let Some(pattern) = fields.next() else {
        return Err(format!("kbind `{s}`: expected cmd,key[,param]"));
    };
    if command.is_empty() || pattern.is_empty() {
        return Err(format!("kbind `{s}`: empty command or key"));
    }
    Ok(KbindSpec {
        command: command.to_string(),
        pattern: pattern.to_string(),
        param: fields.next().map(str::to_string),
    })
}

pub fn parse_syndef(s: &str) -> Result<SyntaxDef, String> {
    let Some((name, path_pattern)) = s.split_once(',') else {
        return Err(format!("syndef `{s}`: expected name,path_pattern"));
    };
    if name.is_empty() {
        return Err(format!("syndef `{s}`: empty name"));
    }
    Ok(SyntaxDef {
        name: name.to_string(),
        path_pattern: path_pattern.to_string(),
        rules: Vec::new(),
    })
}

pub fn parse_synrule(s: &str) -> Result<SyntaxRule, String> {
    let fields: Vec<&str> = s.split(',').collect();
    match fields.as_slice() {
        [start, end, fg, bg] => Ok(SyntaxRule::Range {
            start: start.to_string(),
            end: end.to_string(),
            fg: fg.to_string(),
            bg: bg.to_string(),
        }),
        [regex, fg, bg] => Ok(SyntaxRule::Single {
            regex: regex.to_string(),
            fg: fg.to_string(),
            bg: bg.to_string(),
        }),
        _ => Err(format!(
            "synrule `{s}`: expected start,end,fg,bg or regex,fg,bg"
        )),
    }
}

/// `path` or `path:line` (1-based line).
pub fn parse_file_arg(s: &str) -> (PathBuf, Option<usize>) {
    if let Some((path, line)) = s.rsplit_once(':')
        && !path.is_empty()
        && let Ok(line) = line.parse::<usize>()
    {
        return (PathBuf::from(path), Some(line.saturating_sub(1)));
    }
    (PathBuf::from(s), None)
}

/// Interleave two appended options by their argv indices.
fn ordered<'a>(
    matches: &'a ArgMatches,
    first: &str,
    second: &str,
) -> Vec<(bool, &'a String)> {
    let mut out: Vec<(usize, bool, &String)> = Vec::new();
    if let (Some(vals), Some(idx)) = (
        matches.get_many::<String>(first),
        matches.indices_of(first),
    ) {
        out.extend(idx.zip(vals).map(|(i, v)| (i, true, v)));
    }
    if let (Some(vals), Some(idx)) = (
        matches.get_many::<String>(second),
        matches.indices_of(second),
    ) {
        out.extend(idx.zip(vals).map(|(i, v)| (i, false, v)));
    }
    out.sort_by_key(|(i, ..)| *i);
    out.into_iter().map(|(_, is_first, v)| (is_first, v)).collect()
}

impl Startup {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let mut startup = Startup::default();
        let config = &mut startup.config;

        if let Some(v) = matches.get_one::<String>("tab_to_space") {
            config.tab_to_space = v == "1";
        }
        config.highlight_brackets = matches.get_flag("brackets");
        config.color_column = matches.get_one::<u16>("color_column").copied();
        if let Some(v) = matches.get_one::<String>("linenum") {
            config.linenum_type = match v.as_str() {
                "1" => LinenumType::Relative,
                "2" => LinenumType::Both,
                _ => LinenumType::Absolute,
            };
        }
        if let Some(v) = matches.get_one::<u8>("tab_width") {
            config.tab_width = *v;
        }
        if let Some(v) = matches.get_one::<String>("trim_paste") {
            config.trim_paste = v == "1";
        }
        if let Some(v) = matches.get_one::<String>("kmap") {
            config.initial_kmap = v.clone();
        }
        if let Some(v) = matches.get_one::<String>("syntax") {
            config.syntax_override = Some(v.clone());
        }
        if let Some(v) = matches.get_one::<String>("toggle_key") {
            match parse_key(v) {
                Ok(key) => config.macro_toggle_key = key,
                Err(e) => {
                    tracing::warn!(target: "runtime.config", error = %e, "bad macro toggle key");
                    startup.config_error = true;
                }
            }
        }
        if let Some(scripts) = matches.get_many::<String>("script") {
            config.scripts = scripts.map(PathBuf::from).collect();
        }

        // Keymap definitions: -k before any -K lands on the initial keymap.
        let initial = config.initial_kmap.clone();
        for (is_kdef, value) in ordered(matches, "kdef", "kbind") {
            if is_kdef {
                match parse_kdef(value) {
                    Ok(spec) => startup.keymaps.push(spec),
                    Err(e) => {
                        tracing::warn!(target: "runtime.config", error = %e, "bad kdef");
                        startup.config_error = true;
                    }
                }
            } else {
                match parse_kbind(value) {
                    Ok(bind) => {
                        if startup.keymaps.is_empty() {
                            startup.keymaps.push(KmapSpec {
                                name: initial.clone(),
                                default_command: None,
                                allow_fallthru: false,
                                bindings: Vec::new(),
                            });
                        }
                        if let Some(last) = startup.keymaps.last_mut() {
                            last.bindings.push(bind);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(target: "runtime.config", error = %e, "bad kbind");
                        startup.config_error = true;
                    }
                }
            }
        }

        // Syntax definitions follow the same left-to-right pairing.
        for (is_def, value) in ordered(matches, "syndef", "synrule") {
            if is_def {
                match parse_syndef(value) {
                    Ok(def) => config.syntaxes.push(def),
                    Err(e) => {
                        tracing::warn!(target: "runtime.config", error = %e, "bad syndef");
                        startup.config_error = true;
                    }
                }
            } else {
                match parse_synrule(value) {
                    Ok(rule) => match config.syntaxes.last_mut() {
                        Some(def) => def.rules.push(rule),
                        None => {
                            tracing::warn!(target: "runtime.config", "synrule before any syndef");
                            startup.config_error = true;
                        }
                    },
                    Err(e) => {
                        tracing::warn!(target: "runtime.config", error = %e, "bad synrule");
                        startup.config_error = true;
                    }
                }
            }
        }

        if let Some(macros) = matches.get_many::<String>("macro") {
            startup.macro_lines = macros.cloned().collect();
        }
        if let Some(files) = matches.get_many::<String>("files") {
            startup.files = files.map(|f| parse_file_arg(f)).collect();
        }
        startup
    }
}

/// Read RC lines: `$HOME/.mlerc` then `/etc/mlerc`, one argv entry per
/// non-empty line. Missing files are ignored.
pub fn rc_args(home: Option<&Path>, etc: &Path) -> Vec<String> {
    let mut out = Vec::new();
    let mut paths = Vec::new();
    if let Some(home) = home {
        paths.push(home.join(".mlerc"));
    }
    paths.push(etc.to_path_buf());
    for path in paths {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        tracing::info!(target: "runtime.config", path = %path.display(), "rc_file_read");
        out.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with(';'))
                .map(str::to_string),
        );
    }
    out
}

/// Assemble the effective argv: program name, RC lines, then real CLI
/// arguments (so the command line overrides RC settings).
pub fn effective_argv(rc: Vec<String>, cli: impl Iterator<Item = String>) -> Vec<String> {
    let mut argv = vec!["mle".to_string()];
    argv.extend(rc);
    argv.extend(cli.skip(1));
    argv
}
