//! # Rotation Types
//!
//! Policy, state, and directive types shared by the engine and its callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Password length used when a policy leaves it unset (0)
pub const DEFAULT_PASSWORD_LENGTH: u32 = 16;

/// Rotation policy for one managed secret. Read-only during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotation interval as written by the operator (e.g. "24h")
    pub interval: String,
    /// Requested password length; 0 selects [`DEFAULT_PASSWORD_LENGTH`]
    pub password_length: u32,
    pub include_symbols: bool,
    /// Where the secret is written in the store
    pub store_path: String,
}

impl RotationPolicy {
    /// Password length after applying the default
    #[must_use]
    pub fn effective_password_length(&self) -> u32 {
        if self.password_length == 0 {
            DEFAULT_PASSWORD_LENGTH
        } else {
            self.password_length
        }
    }
}

/// Outcome of the most recent rotation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationStatus {
    /// Last cycle rotated the secret successfully
    Ready,
    /// Credential generation failed (bad input or entropy source)
    GenerationError,
    /// Writing to the secret store failed
    StoreError,
    /// The policy is malformed and needs operator correction
    ConfigError,
}

impl RotationStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStatus::Ready => "Ready",
            RotationStatus::GenerationError => "GenerationError",
            RotationStatus::StoreError => "StoreError",
            RotationStatus::ConfigError => "ConfigError",
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        !matches!(self, RotationStatus::Ready)
    }
}

impl FromStr for RotationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ready" => Ok(RotationStatus::Ready),
            "GenerationError" => Ok(RotationStatus::GenerationError),
            "StoreError" => Ok(RotationStatus::StoreError),
            "ConfigError" => Ok(RotationStatus::ConfigError),
            other => Err(format!("unknown rotation status '{other}'")),
        }
    }
}

impl fmt::Display for RotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted rotation state for one policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationState {
    /// Time of the last successful store write; `None` means never rotated
    pub last_rotated_time: Option<DateTime<Utc>>,
    /// `None` until the first cycle completes
    pub status: Option<RotationStatus>,
    /// Description of the last outcome. Never contains secret material.
    pub message: Option<String>,
}

impl RotationState {
    /// Copy of this state with a new status and message, keeping the timestamp
    #[must_use]
    pub fn with_status(&self, status: RotationStatus, message: impl Into<String>) -> Self {
        Self {
            last_rotated_time: self.last_rotated_time,
            status: Some(status),
            message: Some(message.into()),
        }
    }
}

/// When the caller should invoke the engine again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueDirective {
    /// Only an external change (policy edit) should trigger another cycle
    NoRequeue,
    /// Invoke again after the duration; zero means immediately
    RequeueAfter(Duration),
}

impl RequeueDirective {
    #[must_use]
    pub fn immediate() -> Self {
        RequeueDirective::RequeueAfter(Duration::ZERO)
    }

    #[must_use]
    pub fn is_immediate(&self) -> bool {
        matches!(self, RequeueDirective::RequeueAfter(d) if d.is_zero())
    }
}
