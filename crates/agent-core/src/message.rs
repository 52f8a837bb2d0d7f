//! Prompt Messages

/// Who a message is attributed to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Split messages into joined system content and one prompt, for backends
/// that accept a single text input
pub fn flatten_prompt(messages: &[Message]) -> (Option<String>, String) {
    let (system, rest): (Vec<&Message>, Vec<&Message>) =
        messages.iter().partition(|m| m.role == Role::System);

    let join = |parts: &[&Message], sep: &str| {
        parts.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join(sep)
    };

    let prompt = join(&rest, "\n\n");
    let system = (!system.is_empty()).then(|| join(&system, "\n"));
    (system, prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.role.to_string(), "user");
    }

    #[test]
    fn test_flatten_prompt() {
        let messages = vec![
            Message::system("Be brief."),
            Message::user("BTC?"),
            Message::new(Role::Assistant, "Up."),
        ];
        let (system, prompt) = flatten_prompt(&messages);
        assert_eq!(system.as_deref(), Some("Be brief."));
        assert_eq!(prompt, "BTC?\n\nUp.");

        let (system, _) = flatten_prompt(&[Message::user("only user")]);
        assert!(system.is_none());
    }
}
