//! Application Layer
//!
//! Use cases orchestrate domain logic through driven ports. This layer
//! depends only on the domain; infrastructure plugs in behind the ports.

pub mod ports;
pub mod use_cases;
