//! Input parser - Turns a typed chat line into structured input

/// What a chat line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Plain text to everyone
    Broadcast { body: String },
    /// `@name text`
    Private { recipient: String, body: String },
    /// Prefixed command with whitespace-separated arguments
    Command { name: String, args: Vec<String> },
    Empty,
}

/// Parses chat lines typed into a session
pub struct InputParser {
    command_prefix: String,
}

impl InputParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    pub fn parse(&self, line: &str) -> Input {
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            return Input::Empty;
        }

        if let Some(rest) = line.strip_prefix(self.command_prefix.as_str()) {
            return Self::parse_command(rest);
        }

        if let Some(rest) = line.strip_prefix('@') {
            // `@name` alone carries no body; it is sent as an empty private
            // message and rejected at submission
            let (recipient, body) = rest.split_once(' ').unwrap_or((rest, ""));
            return Input::Private {
                recipient: recipient.to_string(),
                body: body.to_string(),
            };
        }

        Input::Broadcast {
            body: line.to_string(),
        }
    }

    fn parse_command(text: &str) -> Input {
        let mut parts = text.split_whitespace();
        let name = parts.next().unwrap_or("").to_lowercase();
        let args = parts.map(|s| s.to_string()).collect();

        Input::Command { name, args }
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_broadcast() {
        let parser = InputParser::default();
        assert_eq!(
            parser.parse("hello there\n"),
            Input::Broadcast { body: "hello there".into() }
        );
    }

    #[test]
    fn test_at_prefix_is_private() {
        let parser = InputParser::default();
        assert_eq!(
            parser.parse("@carol see you: at 5"),
            Input::Private { recipient: "carol".into(), body: "see you: at 5".into() }
        );
        assert_eq!(
            parser.parse("@carol"),
            Input::Private { recipient: "carol".into(), body: String::new() }
        );
    }

    #[test]
    fn test_command_with_args() {
        let parser = InputParser::new("!");
        assert_eq!(
            parser.parse("!Login alice pw"),
            Input::Command { name: "login".into(), args: vec!["alice".into(), "pw".into()] }
        );
        assert_eq!(
            parser.parse("/who"),
            Input::Broadcast { body: "/who".into() }
        );
    }

    #[test]
    fn test_blank_line() {
        let parser = InputParser::default();
        assert_eq!(parser.parse("   "), Input::Empty);
        assert_eq!(parser.parse(""), Input::Empty);
    }
}
