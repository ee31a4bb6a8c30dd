use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(reason: UserErrorReason, message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError(reason),
            message: message.into(),
            details,
        }
    }

    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    /// The run finished but recorded per-file failures.
    Failure,
    UserError(UserErrorReason),
}

impl CommandStatus {
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Ok => 0,
            CommandStatus::Failure => 1,
            CommandStatus::UserError(reason) => reason.exit_code(),
        }
    }
}

/// Setup problems the user has to fix before a command can run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserErrorReason {
    NoPaths,
    InvalidPath,
    NoRepository,
    NoCredentials,
    NoFiles,
    NoRemote,
}

impl UserErrorReason {
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            UserErrorReason::NoPaths | UserErrorReason::InvalidPath => 2,
            UserErrorReason::NoRepository => 3,
            UserErrorReason::NoCredentials => 4,
            UserErrorReason::NoFiles => 5,
            UserErrorReason::NoRemote => 6,
        }
    }
}
