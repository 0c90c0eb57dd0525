//! Shell command vocabulary
//!
//! Parsing looks only at the leading whitespace-delimited token of a line.
//! Validity additionally checks the operand count, which is what drives the
//! live highlighting in the terminal.

use serde::{Deserialize, Serialize};

/// How many operands a command takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Optional,
    Required,
}

impl Arity {
    fn accepts(self, operands: usize) -> bool {
        match self {
            Arity::None => operands == 0,
            Arity::Optional => operands <= 1,
            Arity::Required => operands == 1,
        }
    }
}

/// A recognized shell command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellCommand {
    Ls,
    Pwd,
    Cd,
    Mkdir,
    Touch,
    Rm,
    Clear,
    Help,
    Exit,
    Unknown,
}

impl ShellCommand {
    /// Every command except [`ShellCommand::Unknown`], in help order
    pub const ALL: [ShellCommand; 9] = [
        ShellCommand::Ls,
        ShellCommand::Pwd,
        ShellCommand::Cd,
        ShellCommand::Mkdir,
        ShellCommand::Touch,
        ShellCommand::Rm,
        ShellCommand::Clear,
        ShellCommand::Help,
        ShellCommand::Exit,
    ];

    /// Classifies a line by its leading token
    ///
    /// ```
    /// use shell_console::ShellCommand;
    ///
    /// assert_eq!(ShellCommand::parse("  mkdir docs"), ShellCommand::Mkdir);
    /// assert_eq!(ShellCommand::parse("l"), ShellCommand::Unknown);
    /// ```
    pub fn parse(line: &str) -> Self {
        let token = line.split_whitespace().next().unwrap_or("");
        Self::ALL
            .into_iter()
            .find(|command| command.name() == token)
            .unwrap_or(ShellCommand::Unknown)
    }

    /// True if the line names a known command with an acceptable operand count
    pub fn is_valid(line: &str) -> bool {
        let command = Self::parse(line);
        if command == ShellCommand::Unknown {
            return false;
        }
        let operands = line.split_whitespace().skip(1).count();
        command.arity().accepts(operands)
    }

    /// The unique command starting with `prefix`, if there is exactly one
    pub fn complete(prefix: &str) -> Option<Self> {
        if prefix.is_empty() {
            return None;
        }
        let mut matches = Self::ALL
            .into_iter()
            .filter(|command| command.name().starts_with(prefix));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShellCommand::Ls => "ls",
            ShellCommand::Pwd => "pwd",
            ShellCommand::Cd => "cd",
            ShellCommand::Mkdir => "mkdir",
            ShellCommand::Touch => "touch",
            ShellCommand::Rm => "rm",
            ShellCommand::Clear => "clear",
            ShellCommand::Help => "help",
            ShellCommand::Exit => "exit",
            ShellCommand::Unknown => "",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            ShellCommand::Ls | ShellCommand::Cd => Arity::Optional,
            ShellCommand::Mkdir | ShellCommand::Touch | ShellCommand::Rm => Arity::Required,
            _ => Arity::None,
        }
    }

    /// Usage column of the help listing
    pub fn usage(self) -> &'static str {
        match self {
            ShellCommand::Ls => "ls [path]",
            ShellCommand::Cd => "cd [path]",
            ShellCommand::Mkdir => "mkdir <name>",
            ShellCommand::Touch => "touch <name>",
            ShellCommand::Rm => "rm <name>",
            other => other.name(),
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            ShellCommand::Ls => "list directory contents",
            ShellCommand::Pwd => "print the working directory",
            ShellCommand::Cd => "change directory (/ for root, .. for parent)",
            ShellCommand::Mkdir => "create a directory",
            ShellCommand::Touch => "create an empty file",
            ShellCommand::Rm => "remove a file or an empty directory",
            ShellCommand::Clear => "clear the screen",
            ShellCommand::Help => "show this help",
            ShellCommand::Exit => "leave the shell",
            ShellCommand::Unknown => "",
        }
    }
}

/// Splits a line into its command token and first operand
pub fn split_operand(line: &str) -> (&str, Option<&str>) {
    let mut tokens = line.split_whitespace();
    let command = tokens.next().unwrap_or("");
    (command, tokens.next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        for command in ShellCommand::ALL {
            assert_eq!(ShellCommand::parse(command.name()), command);
        }
    }

    #[test]
    fn test_parse_uses_leading_token() {
        assert_eq!(ShellCommand::parse("ls /docs"), ShellCommand::Ls);
        assert_eq!(ShellCommand::parse("   cd   .."), ShellCommand::Cd);
        assert_eq!(ShellCommand::parse("lsx"), ShellCommand::Unknown);
        assert_eq!(ShellCommand::parse(""), ShellCommand::Unknown);
        assert_eq!(ShellCommand::parse("LS"), ShellCommand::Unknown);
    }

    #[test]
    fn test_is_valid_while_typing() {
        assert!(!ShellCommand::is_valid("l"));
        assert!(ShellCommand::is_valid("ls"));
        assert!(!ShellCommand::is_valid("m"));
        assert!(!ShellCommand::is_valid(""));
    }

    #[test]
    fn test_is_valid_checks_operands() {
        assert!(!ShellCommand::is_valid("mkdir"));
        assert!(ShellCommand::is_valid("mkdir docs"));
        assert!(!ShellCommand::is_valid("mkdir a b"));
        assert!(ShellCommand::is_valid("cd"));
        assert!(ShellCommand::is_valid("cd .."));
        assert!(!ShellCommand::is_valid("pwd extra"));
        assert!(ShellCommand::is_valid("  ls   /  "));
    }

    #[test]
    fn test_complete_unique_prefix() {
        assert_eq!(ShellCommand::complete("mk"), Some(ShellCommand::Mkdir));
        assert_eq!(ShellCommand::complete("p"), Some(ShellCommand::Pwd));
        assert_eq!(ShellCommand::complete("c"), None);
        assert_eq!(ShellCommand::complete("cl"), Some(ShellCommand::Clear));
        assert_eq!(ShellCommand::complete(""), None);
        assert_eq!(ShellCommand::complete("zz"), None);
    }

    #[test]
    fn test_split_operand() {
        assert_eq!(split_operand("cd docs"), ("cd", Some("docs")));
        assert_eq!(split_operand("  pwd "), ("pwd", None));
        assert_eq!(split_operand(""), ("", None));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ShellCommand::Mkdir).unwrap();
        assert_eq!(json, "\"mkdir\"");
    }
}
