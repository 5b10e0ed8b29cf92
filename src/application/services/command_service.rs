use crate::domain::entities::{Command, CommandRegistry};
use crate::application::errors::CommandError;

/// Service for managing and executing console commands
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            prefix: prefix.into(),
        }
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    pub fn register_defaults(&mut self) {
        self.register(Command::new("help")
            .with_description("Show help message")
            .with_usage("help [command]"));

        self.register(Command::new("version")
            .with_description("Show version")
            .with_handler(|_| {
                Ok(format!("chat-relay v{}", env!("CARGO_PKG_VERSION")))
            }));
    }

    pub fn handle(&self, name: &str, args: &[String]) -> Result<String, CommandError> {
        if name == "help" {
            return Ok(self.get_help(args.first().map(String::as_str)));
        }

        let cmd = self.registry.find(name)
            .ok_or_else(|| CommandError::NotFound(name.to_string()))?;

        match &cmd.handler {
            Some(handler) => handler(args),
            None => Ok(format!("Command {} not implemented", cmd.name)),
        }
    }

    pub fn get_help(&self, command: Option<&str>) -> String {
        if let Some(name) = command {
            if let Some(cmd) = self.registry.find(name) {
                let mut help = format!("{}{} - {}", self.prefix, cmd.name, cmd.description.as_deref().unwrap_or("No description"));
                if let Some(usage) = &cmd.usage {
                    help.push_str(&format!("\nUsage: {}{}", self.prefix, usage));
                }
                return help;
            }
            return format!("Command {}{} not found", self.prefix, name);
        }

        let mut help = "Available commands:\n".to_string();
        for cmd in self.registry.all() {
            help.push_str(&format!("  {}{} - {}\n", self.prefix, cmd.name, cmd.description.as_deref().unwrap_or("")));
        }
        help.push_str("Type a line to talk to everyone, or @name text to whisper.");
        help
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_help() {
        let mut commands = CommandService::new("/");
        commands.register_defaults();

        let version = commands.handle("version", &[]).unwrap();
        assert!(version.starts_with("chat-relay v"));

        let help = commands.handle("help", &[]).unwrap();
        assert!(help.contains("/version - Show version"));

        let help = commands.handle("help", &["help".to_string()]).unwrap();
        assert!(help.contains("Usage: /help [command]"));
    }

    #[test]
    fn test_unknown_command() {
        let commands = CommandService::new("/");
        assert!(matches!(commands.handle("nope", &[]), Err(CommandError::NotFound(_))));
    }

    #[test]
    fn test_alias_lookup() {
        let mut commands = CommandService::new("/");
        commands.register(Command::new("who")
            .with_aliases(vec!["online".to_string()])
            .with_handler(|_| Ok("alice".to_string())));

        assert_eq!(commands.handle("ONLINE", &[]).unwrap(), "alice");
    }
}
