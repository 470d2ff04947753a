use serde::{Deserialize, Serialize};

/// Greeting seeded into every fresh transcript and restored by [`Transcript::reset`].
pub const SEED_GREETING: &str = "Hello! How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used when rendering a turn into the prompt dialogue.
    pub fn prompt_label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// One message in the conversation. Immutable once appended; ordering is
/// transcript-append order and is chronological.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Append-only conversation history for one session.
///
/// Always non-empty: construction and [`reset`](Self::reset) both seed it with
/// a single assistant greeting turn. Roles alternate in steady state, but the
/// store does not enforce that; a violation degrades prompt quality without
/// being rejected.
#[derive(Debug, Clone)]
pub struct Transcript {
    greeting: String,
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::with_greeting(SEED_GREETING)
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let turns = vec![Turn::assistant(greeting.clone())];
        Self { greeting, turns }
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn::new(role, content));
    }

    /// Full ordered history, most recent turn last.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Destructively replaces the history with the single seed greeting turn.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::assistant(self.greeting.clone()));
    }

    /// Role of the final turn. The transcript is never empty, so this always
    /// yields a value.
    pub fn last_role(&self) -> Role {
        self.turns
            .last()
            .map(|turn| turn.role)
            .unwrap_or(Role::Assistant)
    }

    /// Generation is needed iff the assistant has not yet replied to the
    /// latest user turn.
    pub fn needs_response(&self) -> bool {
        self.last_role().is_user()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
