//! # Rotation
//!
//! The rotation control loop: interval parsing, scheduling, credential
//! generation, and the engine tying them to a secret store.
//!
//! Nothing in this module knows about Kubernetes. Callers supply the policy,
//! the current state, the current time, and the collaborators; the engine
//! returns the new state and when it wants to run again.

pub mod duration;
pub mod engine;
pub mod generator;
pub mod persist;
pub mod scheduler;
pub mod state;

pub use duration::{parse_interval, DurationParseError};
pub use engine::{EngineError, RotationEngine, RotationOutcome};
pub use generator::{
    CharacterSet, CredentialGenerator, EntropyError, EntropySource, GeneratedSecret,
    GenerationError, OsEntropy,
};
pub use persist::{InMemoryStatePersister, StatePersister};
pub use scheduler::{decide, Decision};
pub use state::{
    RequeueDirective, RotationPolicy, RotationState, RotationStatus, DEFAULT_PASSWORD_LENGTH,
};
