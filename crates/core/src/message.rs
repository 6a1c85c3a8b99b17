//! Turn and Transcript domain types.
//!
//! These are the value objects that flow through a session:
//! console reads a line → session composes a grounded turn → provider replies → reply is appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, rules)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who authored this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Optional participant name; billed separately by some model families
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Turn {
    /// Create a new system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            name: None,
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            name: None,
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            name: None,
        }
    }
}

/// An ordered sequence of turns with a fixed system turn at index 0.
///
/// Insertion order is chronological order. The only mutations are
/// [`append`](Self::append), [`evict_oldest`](Self::evict_oldest), and
/// [`replace_last_user`](Self::replace_last_user); none of them can
/// remove or move the system turn.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Session this transcript belongs to
    pub id: SessionId,

    turns: Vec<Turn>,

    /// When this transcript was created
    pub created_at: DateTime<Utc>,

    /// When the last mutation happened
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a transcript seeded with its system turn.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            turns: vec![Turn::system(system_prompt)],
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a turn at the end. Existing turns are never touched.
    ///
    /// Only user and assistant turns may be appended; the system turn is
    /// fixed at construction.
    pub fn append(&mut self, turn: Turn) {
        debug_assert_ne!(turn.role, Role::System, "transcript already has its system turn");
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// All turns, system turn first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The system turn at index 0.
    pub fn system(&self) -> &Turn {
        &self.turns[0]
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns including the system turn.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when only the system turn remains.
    pub fn is_empty(&self) -> bool {
        self.turns.len() <= 1
    }

    /// Remove the oldest turn after the system turn (index 1), if any.
    pub fn evict_oldest(&mut self) -> Option<Turn> {
        if self.turns.len() < 2 {
            return None;
        }
        self.updated_at = Utc::now();
        Some(self.turns.remove(1))
    }

    /// Replace the content of the most recent user turn.
    ///
    /// Returns `false` if the transcript holds no user turn.
    pub fn replace_last_user(&mut self, content: impl Into<String>) -> bool {
        match self.turns.iter_mut().rev().find(|t| t.role == Role::User) {
            Some(turn) => {
                turn.content = content.into();
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transcript_holds_only_system_turn() {
        let t = Transcript::new("You are an art advisor.");
        assert_eq!(t.len(), 1);
        assert!(t.is_empty());
        assert_eq!(t.system().role, Role::System);
        assert_eq!(t.system().content, "You are an art advisor.");
    }

    #[test]
    fn append_preserves_order() {
        let mut t = Transcript::new("sys");
        t.append(Turn::user("first"));
        t.append(Turn::assistant("second"));
        let contents: Vec<_> = t.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "first", "second"]);
        assert!(t.updated_at >= t.created_at);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "system turn")]
    fn append_rejects_second_system_turn() {
        let mut t = Transcript::new("sys");
        t.append(Turn::system("another persona"));
    }

    #[test]
    fn evict_oldest_skips_system_turn() {
        let mut t = Transcript::new("sys");
        t.append(Turn::user("a"));
        t.append(Turn::assistant("b"));

        assert_eq!(t.evict_oldest().map(|t| t.content), Some("a".to_string()));
        assert_eq!(t.evict_oldest().map(|t| t.content), Some("b".to_string()));
        assert_eq!(t.evict_oldest(), None);
        assert_eq!(t.len(), 1);
        assert_eq!(t.system().content, "sys");
    }

    #[test]
    fn replace_last_user_targets_latest_user_turn() {
        let mut t = Transcript::new("sys");
        t.append(Turn::user("old question"));
        t.append(Turn::assistant("old answer"));
        t.append(Turn::user("QUERY: new question\n\nCONTEXT: ..."));
        t.append(Turn::assistant("new answer"));

        assert!(t.replace_last_user("new question"));
        assert_eq!(t.turns()[1].content, "old question");
        assert_eq!(t.turns()[3].content, "new question");
    }

    #[test]
    fn replace_last_user_without_user_turn() {
        let mut t = Transcript::new("sys");
        assert!(!t.replace_last_user("anything"));
        assert_eq!(t.system().content, "sys");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("hi")).unwrap();
        assert!(json.contains("\"assistant\""));
        assert!(!json.contains("name"));
    }
}
