//! Conversation roles.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
///
/// # Examples
///
/// ```
/// use tessera_core::Role;
///
/// let role = Role::User;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"user\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions framing the conversation
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
}
