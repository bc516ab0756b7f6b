//! whaling-policy
//!
//! Reward policies for a limited-time ship promotion.
//!
//! - A [`RewardPolicy`] decides whether a ship takes part in the promotion and
//!   what crediting it yields.
//! - Every promotion run ships its own policy; the active one is picked by name
//!   through the [`PolicyRegistry`] at startup.
//! - The [`ShipCatalogue`] carries the static ship attributes the policies
//!   look at. Unknown ship ids never reach a policy.
//!
//! Deterministic, pure logic. No IO.

mod policy;
mod promotions;
mod registry;
mod resource;
mod warship;

pub use policy::{Reward, RewardPolicy};
pub use promotions::{Birthday2020, Birthday2021, Republic2019, Snowflake2020, Snowflake2021};
pub use registry::{PolicyFactory, PolicyMeta, PolicyRegistry, PolicyRegistryError};
pub use resource::ResourceKind;
pub use warship::{CatalogueError, ShipCatalogue, Warship};
