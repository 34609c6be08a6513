//! Slash-command parsing for the input loop

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send to the assistant
    Say(String),
    /// Create a chat, optionally titled
    New(Option<String>),
    List,
    Select(usize),
    Rename(usize, String),
    Delete(usize),
    History,
    Help,
    Quit,
}

impl Command {
    /// Parse an input line; blank lines yield `None`, unknown slash
    /// commands fall back to `Help`.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Command::Say(line.to_string()));
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match head {
            "/new" => Some(Command::New(
                (!rest.is_empty()).then(|| rest.to_string()),
            )),
            "/list" => Some(Command::List),
            "/history" => Some(Command::History),
            "/quit" | "/exit" => Some(Command::Quit),
            "/select" => rest.parse().ok().map(Command::Select),
            "/delete" => rest.parse().ok().map(Command::Delete),
            "/rename" => {
                let (index, title) = rest.split_once(char::is_whitespace)?;
                let index = index.parse().ok()?;
                let title = title.trim();
                (!title.is_empty()).then(|| Command::Rename(index, title.to_string()))
            }
            _ => Some(Command::Help),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_say() {
        assert_eq!(
            Command::parse("hello there"),
            Some(Command::Say("hello there".to_string()))
        );
    }

    #[test]
    fn test_blank_line_is_none() {
        assert_eq!(Command::parse("   \n"), None);
    }

    #[test]
    fn test_new_with_and_without_title() {
        assert_eq!(Command::parse("/new"), Some(Command::New(None)));
        assert_eq!(
            Command::parse("/new weekend plans"),
            Some(Command::New(Some("weekend plans".to_string())))
        );
    }

    #[test]
    fn test_select_requires_number() {
        assert_eq!(Command::parse("/select 3"), Some(Command::Select(3)));
        assert_eq!(Command::parse("/select three"), None);
        assert_eq!(Command::parse("/select"), None);
    }

    #[test]
    fn test_rename_takes_index_and_title() {
        assert_eq!(
            Command::parse("/rename 2 new title here"),
            Some(Command::Rename(2, "new title here".to_string()))
        );
        assert_eq!(Command::parse("/rename 2"), None);
    }

    #[test]
    fn test_quit_aliases() {
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
    }

    #[test]
    fn test_unknown_slash_command_shows_help() {
        assert_eq!(Command::parse("/bogus"), Some(Command::Help));
    }
}
