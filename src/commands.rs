/// Available bot commands and command-line parsing

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Projects,
  Project,
  Create,
  Query,
  Help,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub kind: CommandKind,
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  /// Invocation shown in help and usage errors, without the prefix
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    kind: CommandKind::Projects,
    name: "projects",
    aliases: &["keys"],
    usage: "projects",
    description: "Get a list of all projects keys.",
  },
  Command {
    kind: CommandKind::Project,
    name: "project",
    aliases: &[],
    usage: "project [KEY]",
    description: "Get information about a specific project.",
  },
  Command {
    kind: CommandKind::Create,
    name: "create",
    aliases: &["new"],
    usage: "create [KEY] [TITLE] => [DESCRIPTION]",
    description: "Create a new ticket in the selected project. The description is optional.",
  },
  Command {
    kind: CommandKind::Query,
    name: "query",
    aliases: &["jql", "search"],
    usage: "query [JQL]",
    description: "Search tickets with JQL and show the first 5 matches.",
  },
  Command {
    kind: CommandKind::Help,
    name: "help",
    aliases: &[],
    usage: "help",
    description: "Show this message.",
  },
];

/// Find a command by exact name or alias (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static Command> {
  let name = name.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == name || cmd.aliases.contains(&name.as_str()))
}

/// Split a chat message into a known command and its argument tokens.
///
/// Returns `None` unless the text starts with `prefix` immediately followed
/// by a known command name.
pub fn parse<'a>(text: &'a str, prefix: &str) -> Option<(&'static Command, Vec<&'a str>)> {
  let rest = text.trim_start().strip_prefix(prefix)?;
  // ". projects" is not a command
  if rest.starts_with(char::is_whitespace) {
    return None;
  }
  let mut tokens = rest.split_whitespace();
  let command = lookup(tokens.next()?)?;
  Some((command, tokens.collect()))
}

/// Usage text listing every command
pub fn help_text(prefix: &str) -> String {
  let mut text = String::from("Use the following commands:\n");
  for cmd in COMMANDS {
    text.push_str(&format!(
      "> `{}{}` - {}\n",
      prefix, cmd.usage, cmd.description
    ));
  }
  text.push_str("I will also listen for ticket keys in the JIRA format (KEY-ID) and look them up for you.");
  text
}
