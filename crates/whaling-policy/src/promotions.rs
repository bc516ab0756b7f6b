//! Reward tables of the promotion runs.

use crate::{Reward, RewardPolicy, ResourceKind, Warship};

/// Shared rule of the seasonal promotions: no test ships, no rentals, T5-T10.
fn seasonal_eligible(ship: &Warship) -> bool {
    if ship.is_test_ship() || ship.is_rental_ship() {
        return false;
    }
    (5..=10).contains(&ship.tier)
}

// ---------------------------------------------------------------------------
// Snowflake
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
pub struct Snowflake2020;

impl RewardPolicy for Snowflake2020 {
    fn name(&self) -> &'static str {
        "snowflake_2020"
    }

    fn is_eligible(&self, ship: &Warship) -> bool {
        seasonal_eligible(ship)
    }

    fn reward(&self, ship: &Warship) -> Reward {
        match ship.tier {
            5 => Reward::new(ResourceKind::Coal, 400),
            6 => Reward::new(ResourceKind::Coal, 500),
            7 => Reward::new(ResourceKind::Coal, 750),
            8 | 9 => Reward::new(ResourceKind::Steel, 75),
            10 => Reward::new(ResourceKind::SantaGiftContainer, 1),
            _ => Reward::new(ResourceKind::Coal, 0),
        }
    }

    fn resource_kinds(&self) -> &'static [ResourceKind] {
        &[
            ResourceKind::Coal,
            ResourceKind::Steel,
            ResourceKind::SantaGiftContainer,
        ]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Snowflake2021;

impl RewardPolicy for Snowflake2021 {
    fn name(&self) -> &'static str {
        "snowflake_2021"
    }

    fn is_eligible(&self, ship: &Warship) -> bool {
        seasonal_eligible(ship)
    }

    fn reward(&self, ship: &Warship) -> Reward {
        match ship.tier {
            5..=7 => Reward::new(ResourceKind::Coal, 750),
            8 | 9 => Reward::new(ResourceKind::Steel, 75),
            10 => Reward::new(ResourceKind::NewYearCertificate, 1),
            _ => Reward::new(ResourceKind::Coal, 0),
        }
    }

    fn resource_kinds(&self) -> &'static [ResourceKind] {
        &[
            ResourceKind::Coal,
            ResourceKind::Steel,
            ResourceKind::NewYearCertificate,
        ]
    }
}

// ---------------------------------------------------------------------------
// Birthday
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
pub struct Birthday2020;

impl RewardPolicy for Birthday2020 {
    fn name(&self) -> &'static str {
        "birthday_2020"
    }

    fn is_eligible(&self, ship: &Warship) -> bool {
        seasonal_eligible(ship)
    }

    fn reward(&self, ship: &Warship) -> Reward {
        match ship.tier {
            5..=7 => Reward::new(ResourceKind::AnniversaryCamouflages, 2),
            8 => Reward::new(ResourceKind::AnniversaryContainers, 1),
            9 => Reward::new(ResourceKind::AnniversaryContainers, 2),
            10 => Reward::new(ResourceKind::SuperContainer, 1),
            _ => Reward::new(ResourceKind::AnniversaryCamouflages, 0),
        }
    }

    fn resource_kinds(&self) -> &'static [ResourceKind] {
        &[
            ResourceKind::SuperContainer,
            ResourceKind::AnniversaryCamouflages,
            ResourceKind::AnniversaryContainers,
        ]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Birthday2021;

impl RewardPolicy for Birthday2021 {
    fn name(&self) -> &'static str {
        "birthday_2021"
    }

    fn is_eligible(&self, ship: &Warship) -> bool {
        seasonal_eligible(ship)
    }

    fn reward(&self, ship: &Warship) -> Reward {
        match ship.tier {
            5..=7 => Reward::new(ResourceKind::FestiveToken, 1),
            8 | 9 => Reward::new(ResourceKind::FestiveTokenAndAnniversaryContainer, 1),
            10 => Reward::new(ResourceKind::SuperContainer, 1),
            _ => Reward::new(ResourceKind::FestiveToken, 0),
        }
    }

    fn resource_kinds(&self) -> &'static [ResourceKind] {
        &[
            ResourceKind::SuperContainer,
            ResourceKind::FestiveToken,
            ResourceKind::FestiveTokenAndAnniversaryContainer,
        ]
    }
}

// ---------------------------------------------------------------------------
// Republic (0.8.6)
// ---------------------------------------------------------------------------

/// The first promotion. Premium ships yield more, low tiers pay out coal.
#[derive(Clone, Copy, Debug, Default)]
pub struct Republic2019;

impl RewardPolicy for Republic2019 {
    fn name(&self) -> &'static str {
        "republic_2019"
    }

    fn is_eligible(&self, ship: &Warship) -> bool {
        if ship.name.contains('[') {
            return false;
        }
        ship.tier >= 5 || ship.is_premium
    }

    fn reward(&self, ship: &Warship) -> Reward {
        let kind = if ship.tier < 7 {
            ResourceKind::Coal
        } else {
            ResourceKind::RepublicTokens
        };

        let quantity = if ship.gets_premium_treatment() {
            match ship.tier {
                9.. => 20,
                8 => 15,
                7 => 10,
                6 => 400,
                5 => 300,
                _ => 200,
            }
        } else {
            match ship.tier {
                9.. => 15,
                8 => 10,
                7 => 5,
                6 => 300,
                _ => 200,
            }
        };

        Reward::new(kind, quantity)
    }

    fn resource_kinds(&self) -> &'static [ResourceKind] {
        &[ResourceKind::RepublicTokens, ResourceKind::Coal]
    }
}
