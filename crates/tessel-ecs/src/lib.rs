//! Tessel ECS -- entity registry, component masks and the frame scheduler.
//!
//! Entities are generational handles owning a caller-defined component bag.
//! Systems declare the component kinds they need as a [`ComponentMask`]; the
//! [`Scheduler`] keeps every system's member list in step with the registry
//! once per frame and then runs the systems in registration order.
//!
//! # Quick Start
//!
//! ```
//! use tessel_ecs::prelude::*;
//!
//! const POSITION: ComponentKind = ComponentKind::new(0);
//!
//! #[derive(Default)]
//! struct Components { position: Option<(f32, f32)> }
//!
//! impl ComponentSet for Components {
//!     fn component_mask(&self) -> ComponentMask {
//!         let mut mask = ComponentMask::EMPTY;
//!         if self.position.is_some() { mask = mask.with(POSITION); }
//!         mask
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! let e = registry.insert(Components { position: Some((1.0, 2.0)) });
//! assert!(registry.get(e).unwrap().component_mask().contains(POSITION));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod registry;
pub mod scheduler;
pub mod system;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry and scheduler lookups.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never registered).
    #[error("entity {entity:?} does not exist (stale or never registered)")]
    StaleEntity { entity: entity::EntityId },

    /// No system with this name is registered.
    #[error("system '{name}' not registered. Registered systems: [{registered}]")]
    UnknownSystem { name: String, registered: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{ComponentKind, ComponentMask, ComponentSet};
    pub use crate::entity::EntityId;
    pub use crate::registry::{Entity, Registry};
    pub use crate::scheduler::{Scheduler, SchedulerDiagnostics};
    pub use crate::system::{Membership, System};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
