//! Shell command execution
//!
//! The [`ShellEngine`] owns the virtual filesystem. It consumes one complete
//! line at a time, writes the response and a fresh prompt, and persists the
//! tree after every mutation.

use crate::ansi::{self, Color, CLEAR_SCREEN, CRLF, RESET};
use crate::command::{split_operand, ShellCommand};
use crate::platform::{Platform, Target};
use core::fmt::{self, Write};
use fs_tree::{ImageError, NodeKind, TreeError, VirtualFileTree, IMAGE_SIZE};
use services_logger::{LogEntry, LogLevel, Logger};
use std::sync::Arc;

/// Where the shell is in its line cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    AwaitingLine,
    Executing,
    Prompting,
}

/// What the caller should do after a line has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// The screen was cleared and redrawn, prompt included
    Redrawn,
    /// The process should end once pending output has been flushed
    Exit,
}

pub struct ShellEngine {
    tree: VirtualFileTree,
    state: ShellState,
    platform: Arc<dyn Platform>,
    logger: Logger,
}

impl ShellEngine {
    pub fn new(platform: Arc<dyn Platform>, logger: Logger) -> Self {
        Self {
            tree: VirtualFileTree::new(),
            state: ShellState::AwaitingLine,
            platform,
            logger,
        }
    }

    pub fn tree(&self) -> &VirtualFileTree {
        &self.tree
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Replaces the filesystem with a persisted image
    ///
    /// On error the current tree is left untouched.
    pub fn restore(&mut self, image: &[u8]) -> Result<(), ImageError> {
        let tree = VirtualFileTree::deserialize(image)?;
        self.logger.emit(
            LogEntry::new(LogLevel::Info, "filesystem restored")
                .with_field("nodes", tree.live_count())
                .with_field("cwd", tree.path_of(tree.current_dir())),
        );
        self.tree = tree;
        Ok(())
    }

    /// Writes the banner and the first prompt
    pub fn greet<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        ansi::greeting(out, self.platform.target())?;
        self.prompt(out)
    }

    /// Runs one line and re-prompts
    ///
    /// `clear` redraws the greeting and prompt itself. Returns
    /// [`Outcome::Exit`] without prompting when a native `exit` was requested.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Outcome {
        self.state = ShellState::Executing;
        let outcome = match self.execute(line, out) {
            Ok(outcome) => outcome,
            Err(fmt::Error) => {
                self.logger.warn("failed to format command output");
                Outcome::Continue
            }
        };

        if outcome == Outcome::Continue {
            self.state = ShellState::Prompting;
            if self.prompt(out).is_err() {
                self.logger.warn("failed to format prompt");
            }
        }
        self.state = ShellState::AwaitingLine;
        outcome
    }

    fn prompt<W: Write>(&self, out: &mut W) -> fmt::Result {
        ansi::prompt(out, &self.tree.path_of(self.tree.current_dir()))
    }

    fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Outcome, fmt::Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Outcome::Continue);
        }

        let command = ShellCommand::parse(line);
        let (_, operand) = split_operand(line);
        self.logger.emit(
            LogEntry::new(LogLevel::Debug, "executing command").with_field("line", line),
        );

        match command {
            ShellCommand::Ls => self.ls(operand, out)?,
            ShellCommand::Pwd => {
                write!(out, "{}{CRLF}", self.tree.path_of(self.tree.current_dir()))?
            }
            ShellCommand::Cd => self.cd(operand.unwrap_or("/"), out)?,
            ShellCommand::Mkdir | ShellCommand::Touch | ShellCommand::Rm => match operand {
                Some(path) => self.mutate(command, path, out)?,
                None => write!(out, "{}: missing operand{CRLF}", command.name())?,
            },
            ShellCommand::Clear => {
                out.write_str(CLEAR_SCREEN)?;
                self.greet(out)?;
                return Ok(Outcome::Redrawn);
            }
            ShellCommand::Help => ansi::help(out)?,
            ShellCommand::Exit => return self.exit(out),
            ShellCommand::Unknown => {
                self.logger.emit(
                    LogEntry::new(LogLevel::Debug, "unknown command").with_field("line", line),
                );
                write!(out, "Unknown command: {line}{CRLF}")?;
            }
        }
        Ok(Outcome::Continue)
    }

    fn ls<W: Write>(&self, path: Option<&str>, out: &mut W) -> fmt::Result {
        let target = match path {
            Some(path) => match self.tree.resolve(path) {
                Ok(index) => index,
                Err(err) => return report(out, ShellCommand::Ls, err),
            },
            None => self.tree.current_dir(),
        };

        let Some(node) = self.tree.node(target) else {
            return report(out, ShellCommand::Ls, TreeError::NotFound);
        };
        if node.is_file() {
            return write!(out, "{}{CRLF}", self.tree.name(target));
        }

        let mut any = false;
        for child in self.tree.children(target) {
            if any {
                out.write_str("  ")?;
            }
            any = true;
            let name = self.tree.name(child);
            match self.tree.node(child) {
                Some(entry) if entry.is_dir() => {
                    ansi::color(out, Color::Blue)?;
                    write!(out, "{name}/{RESET}")?;
                }
                _ => out.write_str(name)?,
            }
        }
        if any {
            out.write_str(CRLF)?;
        }
        Ok(())
    }

    fn cd<W: Write>(&mut self, path: &str, out: &mut W) -> fmt::Result {
        match self.tree.change_dir(path) {
            Ok(_) => {
                self.persist();
                Ok(())
            }
            Err(err) => report(out, ShellCommand::Cd, err),
        }
    }

    fn mutate<W: Write>(&mut self, command: ShellCommand, path: &str, out: &mut W) -> fmt::Result {
        let result = match command {
            ShellCommand::Mkdir => self.tree.create_at(NodeKind::Dir, path).map(Some),
            ShellCommand::Touch => match self.tree.create_at(NodeKind::File, path) {
                Err(TreeError::AlreadyExists) => Ok(None),
                other => other.map(Some),
            },
            _ => self.tree.remove_at(path).map(Some),
        };

        match result {
            Ok(Some(index)) => {
                self.logger.emit(
                    LogEntry::new(LogLevel::Info, "filesystem changed")
                        .with_field("command", command.name())
                        .with_field("path", path)
                        .with_field("node", index),
                );
                self.persist();
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => report(out, command, err),
        }
    }

    fn exit<W: Write>(&mut self, out: &mut W) -> Result<Outcome, fmt::Error> {
        match self.platform.target() {
            Target::Native => {
                self.logger.info("exit requested");
                write!(out, "Goodbye.{CRLF}")?;
                Ok(Outcome::Exit)
            }
            Target::Hosted => {
                write!(out, "exit: close the page to leave the terminal{CRLF}")?;
                Ok(Outcome::Continue)
            }
        }
    }

    fn persist(&self) {
        let mut image = [0u8; IMAGE_SIZE];
        let len = self.tree.serialize_into(&mut image);
        self.platform.persist(&image[..len]);
    }
}

/// Writes `<command>: <reason>` for a failed filesystem operation
fn report<W: Write>(out: &mut W, command: ShellCommand, err: TreeError) -> fmt::Result {
    let name = command.name();
    match (command, err) {
        (ShellCommand::Rm, TreeError::NotFound) => write!(out, "{name}: file not found{CRLF}"),
        (_, TreeError::NotFound) => write!(out, "{name}: no such directory{CRLF}"),
        (_, TreeError::CannotDeleteRoot) => write!(out, "{name}: cannot remove /{CRLF}"),
        (_, err) => write!(out, "{name}: {err}{CRLF}"),
    }
}
