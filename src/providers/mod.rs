//! Capability providers.
//!
//! Each provider turns one normalized input string into a typed
//! [`ProviderPayload`](crate::types::ProviderPayload) at the boundary. The
//! core only depends on the [`CapabilityProvider`](registry::CapabilityProvider)
//! contract, never on a provider's internals.

pub mod academic;
pub mod github;
pub mod linkedin;
pub mod registry;
pub mod search;

pub use registry::{CapabilityProvider, ProviderDescriptor, ProviderRegistry};
