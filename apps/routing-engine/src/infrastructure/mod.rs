//! Infrastructure Layer
//!
//! Adapters behind the application ports, plus the dependency injection
//! container that wires everything together.

pub mod container;
pub mod execution;
pub mod persistence;

pub use container::{Container, InMemoryContainer};
