//! Registration file editing.
//!
//! The shared registration file (`data/sys_def.lua`) lists, per hook, which
//! systems the scheduler calls:
//!
//! ```lua
//! return {
//!     init = {
//!         { 'SInput',            'awake' },
//!         { 'SPhysics',          'awake' },
//!
//!         { 'SInput',            'start' },
//!     },
//!
//!     update = {
//!         { 'SInput', 'update' },
//!         { sys='SPhysics',      func='update', comp='Body' },
//!     },
//! }
//! ```
//!
//! One automaton per hook walks the file on a single shared cursor. Nothing
//! is matched before the `init = {` line, so look-alike lists earlier in the
//! file are never touched. The awake and start automata append to the first
//! run of their entries; the update automaton appends right after the
//! `update = {` line when it reaches the block's closing brace. Insertions
//! happen on the lines being scanned, so every edit is broadcast and each
//! automaton moves only the positions it recorded itself.
//!
//! Lines the update block does not recognise abort the whole edit: guessing
//! at an unknown shape risks corrupting the file.

use crate::error::RegistrationError;
use crate::scanner::{HookFlag, HookFlags};
use crate::source::{SourceLines, body, indent_of};
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static INIT_GATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\w+\.)?init\s*=\s*\{").unwrap());
static LIST_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\{\s*'(\w+)'\s*,\s*'(\w+)'\s*\}\s*,?\s*(?:--.*)?$").unwrap()
});
static UPDATE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)((?:\w+\.)?update\s*=\s*\{)\s*(?:(\})\s*(,?)\s*)?(--.*)?$").unwrap()
});
static POSITIONAL_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\{\s*'(\w+)'\s*,\s*'(\w+)'\s*(?:,\s*'(\w+)'\s*)?\}\s*,?\s*(?:--.*)?$")
        .unwrap()
});
static KEYED_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\{\s*sys\s*=\s*'(\w+)'\s*,\s*func\s*=\s*'(\w+)'\s*(?:,\s*comp\s*=\s*'(\w+)'\s*)?\}\s*,?\s*(?:--.*)?$",
    )
    .unwrap()
});
static BLOCK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\}\s*[,;]?\s*(?:--.*)?$").unwrap());

/// Width of the name cell; the column after it lines up across entries.
pub const NAME_COLUMN_WIDTH: usize = 20;
const BLOCK_INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    Inserted,
    AlreadyRegistered,
    /// No list for this hook exists after `init = {`. Nothing is created.
    SectionMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookResult {
    pub hook: HookFlag,
    pub status: HookStatus,
    /// 0-based line of the inserted entry in the edited file.
    pub line: Option<usize>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub hooks: Vec<HookResult>,
    pub changed: bool,
}

impl RegistrationOutcome {
    pub fn status(&self, hook: HookFlag) -> Option<HookStatus> {
        self.hooks.iter().find(|h| h.hook == hook).map(|h| h.status)
    }
}

fn list_line(indent: &str, module: &str, hook: HookFlag) -> String {
    format!(
        "{indent}{{ {:<width$} '{}' }},\n",
        format!("'{module}',"),
        hook.label(),
        width = NAME_COLUMN_WIDTH
    )
}

fn update_line(indent: &str, module: &str) -> String {
    format!(
        "{indent}{{ {:<width$} func='{}' }},\n",
        format!("sys='{module}',"),
        HookFlag::Update.label(),
        width = NAME_COLUMN_WIDTH
    )
}

fn is_blank_or_comment(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.starts_with("--")
}

fn update_entry_name(text: &str) -> Option<&str> {
    POSITIONAL_ENTRY
        .captures(text)
        .or_else(|| KEYED_ENTRY.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The line under the shared cursor.
struct Line<'a> {
    /// Index in the lines being edited.
    index: usize,
    /// 1-based line number in the original file.
    number: usize,
    text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Insert { at: usize, line: String },
    /// Replaces one line with an opening line, the new entry and a closing line.
    Replace { at: usize, lines: Vec<String> },
}

#[derive(Debug, Clone, Copy)]
struct Applied {
    at: usize,
    added: usize,
    replaced: bool,
    entry_line: usize,
}

impl Applied {
    /// Where a line previously at `pos` ended up.
    fn moved(&self, pos: usize) -> usize {
        if pos > self.at || (pos == self.at && !self.replaced) {
            pos + self.added
        } else {
            pos
        }
    }
}

fn apply_edit(lines: &mut SourceLines, edit: Edit) -> Applied {
    match edit {
        Edit::Insert { at, line } => {
            lines.insert(at, line);
            Applied {
                at,
                added: 1,
                replaced: false,
                entry_line: at,
            }
        }
        Edit::Replace { at, lines: replacement } => {
            let added = lines.splice(at, replacement);
            Applied {
                at,
                added,
                replaced: true,
                entry_line: at + 1,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ListState {
    Init,
    Matching { indent: String },
    Done(HookStatus),
}

/// Awake and start: a contiguous run of `{ '<name>', '<label>' },` lines.
#[derive(Debug)]
struct ListAutomaton {
    hook: HookFlag,
    state: ListState,
}

impl ListAutomaton {
    fn new(hook: HookFlag) -> Self {
        Self {
            hook,
            state: ListState::Init,
        }
    }

    fn entry_name<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = LIST_ENTRY.captures(text)?;
        let name = caps.get(1)?.as_str();
        (&caps[2] == self.hook.label()).then_some(name)
    }

    fn step(&mut self, line: &Line<'_>, module: &str) -> Option<Edit> {
        let entry = self.entry_name(line.text);
        let (next, edit) = match (&self.state, entry) {
            (ListState::Done(_), _) => return None,
            (_, Some(name)) if name == module => (ListState::Done(HookStatus::AlreadyRegistered), None),
            (ListState::Init, Some(_)) => (
                ListState::Matching {
                    indent: indent_of(line.text).to_string(),
                },
                None,
            ),
            (ListState::Init, None) | (ListState::Matching { .. }, Some(_)) => return None,
            (ListState::Matching { indent }, None) => (
                ListState::Done(HookStatus::Inserted),
                Some(Edit::Insert {
                    at: line.index,
                    line: list_line(indent, module, self.hook),
                }),
            ),
        };
        debug!("{} list at line {}: {:?}", self.hook, line.number, next);
        self.state = next;
        edit
    }

    fn mark_registered(&mut self) {
        self.state = ListState::Done(HookStatus::AlreadyRegistered);
    }

    fn finish(&mut self, len: usize, module: &str) -> Option<Edit> {
        let (next, edit) = match &self.state {
            ListState::Done(_) => return None,
            ListState::Init => (ListState::Done(HookStatus::SectionMissing), None),
            ListState::Matching { indent } => (
                ListState::Done(HookStatus::Inserted),
                Some(Edit::Insert {
                    at: len,
                    line: list_line(indent, module, self.hook),
                }),
            ),
        };
        self.state = next;
        edit
    }

    fn status(&self) -> Option<HookStatus> {
        match self.state {
            ListState::Done(status) => Some(status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BlockState {
    Init,
    Matching {
        opened_line: usize,
        insert_at: usize,
        block_indent: String,
        entry_indent: Option<String>,
        seen: bool,
    },
    Done {
        inserted: bool,
        seen: bool,
    },
}

/// The `update = { ... }` block.
///
/// Always runs so malformed blocks are caught, but only inserts when
/// `register` is set.
#[derive(Debug)]
struct UpdateAutomaton {
    register: bool,
    state: BlockState,
}

impl UpdateAutomaton {
    fn new(register: bool) -> Self {
        Self {
            register,
            state: BlockState::Init,
        }
    }

    fn step(&mut self, line: &Line<'_>, module: &str) -> Result<Option<Edit>, RegistrationError> {
        match &mut self.state {
            BlockState::Done { .. } => Ok(None),
            BlockState::Init => {
                let Some(caps) = UPDATE_OPEN.captures(line.text) else {
                    return Ok(None);
                };
                let block_indent = caps[1].to_string();
                if caps.get(3).is_none() {
                    debug!("update block opens at line {}", line.number);
                    self.state = BlockState::Matching {
                        opened_line: line.number,
                        insert_at: line.index + 1,
                        block_indent,
                        entry_indent: None,
                        seen: false,
                    };
                    return Ok(None);
                }

                // `update = { },` on one line
                if !self.register {
                    self.state = BlockState::Done {
                        inserted: false,
                        seen: false,
                    };
                    return Ok(None);
                }
                let opening = match caps.get(5) {
                    Some(comment) => format!("{block_indent}{} {}\n", &caps[2], comment.as_str()),
                    None => format!("{block_indent}{}\n", &caps[2]),
                };
                let comma = caps.get(4).map_or("", |m| m.as_str());
                let lines = vec![
                    opening,
                    update_line(&format!("{block_indent}{BLOCK_INDENT}"), module),
                    format!("{block_indent}}}{comma}\n"),
                ];
                self.state = BlockState::Done {
                    inserted: true,
                    seen: false,
                };
                Ok(Some(Edit::Replace {
                    at: line.index,
                    lines,
                }))
            }
            BlockState::Matching {
                insert_at,
                block_indent,
                entry_indent,
                seen,
                ..
            } => {
                if BLOCK_CLOSE.is_match(line.text) {
                    let edit = (self.register && !*seen).then(|| {
                        let indent = entry_indent
                            .clone()
                            .unwrap_or_else(|| format!("{block_indent}{BLOCK_INDENT}"));
                        Edit::Insert {
                            at: *insert_at,
                            line: update_line(&indent, module),
                        }
                    });
                    let seen = *seen;
                    debug!("update block closes at line {} (seen: {})", line.number, seen);
                    self.state = BlockState::Done {
                        inserted: edit.is_some(),
                        seen,
                    };
                    return Ok(edit);
                }
                if is_blank_or_comment(line.text) {
                    return Ok(None);
                }
                let Some(name) = update_entry_name(line.text) else {
                    return Err(RegistrationError::MalformedEntry {
                        line: line.number,
                        text: line.text.trim().to_string(),
                    });
                };
                if name == module {
                    *seen = true;
                }
                entry_indent.get_or_insert_with(|| indent_of(line.text).to_string());
                Ok(None)
            }
        }
    }

    fn shift(&mut self, applied: &Applied) {
        if let BlockState::Matching { insert_at, .. } = &mut self.state
            && *insert_at > applied.at
        {
            *insert_at += applied.added;
        }
    }

    fn finish(&mut self) -> Result<(), RegistrationError> {
        match &self.state {
            BlockState::Matching { opened_line, .. } => Err(RegistrationError::UnterminatedBlock {
                line: *opened_line,
            }),
            BlockState::Init => {
                self.state = BlockState::Done {
                    inserted: false,
                    seen: false,
                };
                Ok(())
            }
            BlockState::Done { .. } => Ok(()),
        }
    }

    fn status(&self) -> Option<HookStatus> {
        if !self.register {
            return None;
        }
        match self.state {
            BlockState::Done { inserted: true, .. } => Some(HookStatus::Inserted),
            BlockState::Done { seen: true, .. } => Some(HookStatus::AlreadyRegistered),
            BlockState::Done { .. } => Some(HookStatus::SectionMissing),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Automaton {
    List(ListAutomaton),
    Update(UpdateAutomaton),
}

impl Automaton {
    fn hook(&self) -> HookFlag {
        match self {
            Automaton::List(list) => list.hook,
            Automaton::Update(_) => HookFlag::Update,
        }
    }

    fn step(&mut self, line: &Line<'_>, module: &str) -> Result<Option<Edit>, RegistrationError> {
        match self {
            Automaton::List(list) => Ok(list.step(line, module)),
            Automaton::Update(update) => update.step(line, module),
        }
    }

    fn shift(&mut self, applied: &Applied) {
        if let Automaton::Update(update) = self {
            update.shift(applied);
        }
    }

    fn finish(&mut self, len: usize, module: &str) -> Result<Option<Edit>, RegistrationError> {
        match self {
            Automaton::List(list) => Ok(list.finish(len, module)),
            Automaton::Update(update) => update.finish().map(|()| None),
        }
    }

    fn status(&self) -> Option<HookStatus> {
        match self {
            Automaton::List(list) => list.status(),
            Automaton::Update(update) => update.status(),
        }
    }
}

/// Every `(name, label)` list entry after the `init = {` line, wherever it
/// sits in its list.
fn registered_list_entries(lines: &SourceLines) -> BTreeSet<(String, String)> {
    lines
        .iter()
        .map(body)
        .skip_while(|text| !INIT_GATE.is_match(text))
        .skip(1)
        .filter_map(|text| LIST_ENTRY.captures(text))
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Records an applied edit: broadcasts it to every automaton and moves the
/// entry lines inserted so far.
fn broadcast(automata: &mut [Automaton], entries: &mut [(HookFlag, usize)], applied: &Applied) {
    for automaton in automata.iter_mut() {
        automaton.shift(applied);
    }
    for (_, line) in entries.iter_mut() {
        *line = applied.moved(*line);
    }
}

/// Registers `module` for each hook in `flags`.
///
/// On error `lines` is left untouched. `changed` is set only when at least
/// one entry was inserted.
pub fn apply(
    lines: &mut SourceLines,
    module: &str,
    flags: &HookFlags,
) -> Result<RegistrationOutcome, RegistrationError> {
    let mut work = lines.clone();
    let registered = registered_list_entries(&work);
    let mut automata: Vec<Automaton> = [HookFlag::Awake, HookFlag::Start]
        .into_iter()
        .filter(|hook| flags.contains(hook))
        .map(|hook| {
            let mut list = ListAutomaton::new(hook);
            if registered.contains(&(module.to_string(), hook.label().to_string())) {
                debug!("{} already lists {}", hook, module);
                list.mark_registered();
            }
            Automaton::List(list)
        })
        .collect();
    automata.push(Automaton::Update(UpdateAutomaton::new(
        flags.contains(&HookFlag::Update),
    )));

    let mut entries: Vec<(HookFlag, usize)> = Vec::new();
    let mut gate_open = false;
    let mut cursor = 0;
    let mut number = 0;

    while let Some(raw) = work.get(cursor) {
        number += 1;
        let text = body(raw).to_string();
        if !gate_open {
            gate_open = INIT_GATE.is_match(&text);
            cursor += 1;
            continue;
        }

        // `current` is where the scanned line sits now; `last` is the final
        // line it expanded into.
        let mut current = cursor;
        let mut last = cursor;
        for i in 0..automata.len() {
            let line = Line {
                index: current,
                number,
                text: &text,
            };
            let Some(edit) = automata[i].step(&line, module)? else {
                continue;
            };
            let hook = automata[i].hook();
            let applied = apply_edit(&mut work, edit);
            broadcast(&mut automata, &mut entries, &applied);
            entries.push((hook, applied.entry_line));
            current = applied.moved(current);
            last = applied.moved(last);
            if applied.replaced && applied.at == last {
                last += applied.added;
            }
        }
        cursor = last + 1;
    }

    for i in 0..automata.len() {
        if let Some(edit) = automata[i].finish(work.len(), module)? {
            let hook = automata[i].hook();
            let applied = apply_edit(&mut work, edit);
            broadcast(&mut automata, &mut entries, &applied);
            entries.push((hook, applied.entry_line));
        }
    }

    let hooks: Vec<HookResult> = automata
        .iter()
        .filter_map(|automaton| {
            let hook = automaton.hook();
            automaton.status().map(|status| HookResult {
                hook,
                status,
                line: entries.iter().find(|(h, _)| *h == hook).map(|(_, l)| *l),
            })
        })
        .collect();
    let changed = !entries.is_empty();
    if changed {
        *lines = work;
    }
    Ok(RegistrationOutcome { hooks, changed })
}
