use uuid::Uuid;

/// Primary key of a `user_sessions` row.
pub type SessionId = Uuid;

/// Primary key of a `user_accounts` row.
pub type UserId = Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Primary key of a `chats` row.
pub type ChatId = Uuid;

/// Primary key of a `messages` row.
pub type MessageId = Uuid;
