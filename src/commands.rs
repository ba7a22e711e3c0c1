//! Console commands and prefix/alias matching

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "snapshot",
    aliases: &["s", "rows", "data"],
    description: "Print cached rows as JSON",
  },
  Command {
    name: "refresh",
    aliases: &["r", "force"],
    description: "Start a refresh now",
  },
  Command {
    name: "sync",
    aliases: &["stale"],
    description: "Start a refresh if the cache is older than the TTL",
  },
  Command {
    name: "health",
    aliases: &["h", "status"],
    description: "Print last update time",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit",
  },
];

/// Get candidate commands for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve typed input to a single command. Empty input resolves to nothing.
pub fn resolve(input: &str) -> Option<&'static Command> {
  if input.trim().is_empty() {
    return None;
  }
  get_suggestions(input).into_iter().next()
}

/// One line per command, for the help text
pub fn usage() -> String {
  COMMANDS
    .iter()
    .map(|c| format!("  {:<10} {}", c.name, c.description))
    .collect::<Vec<_>>()
    .join("\n")
}
