use crate::{ResourceKind, Warship};

/// What crediting one ship yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reward {
    pub kind: ResourceKind,
    pub quantity: u32,
}

impl Reward {
    pub const fn new(kind: ResourceKind, quantity: u32) -> Self {
        Self { kind, quantity }
    }
}

/// Per-promotion eligibility rules and reward table.
///
/// Implementations must be object-safe and `Send + Sync`: the active policy is
/// chosen once from configuration and shared as `Arc<dyn RewardPolicy>` across
/// async tasks.
///
/// There are no error conditions. A ship either matches or it does not, and
/// callers filter unknown ship ids before asking.
pub trait RewardPolicy: Send + Sync {
    /// Registry key (e.g. `"snowflake_2021"`).
    fn name(&self) -> &'static str;

    fn is_eligible(&self, ship: &Warship) -> bool;

    /// Reward for an eligible ship. The result for an ineligible ship is
    /// unspecified and must not be credited.
    fn reward(&self, ship: &Warship) -> Reward;

    /// Every kind this policy can award, in display order. Seeds the resource
    /// totals of a fresh account snapshot.
    fn resource_kinds(&self) -> &'static [ResourceKind];
}
