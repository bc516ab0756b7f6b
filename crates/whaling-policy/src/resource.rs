use serde::{Deserialize, Serialize};

/// Resource that a promotion can award for a ship.
///
/// Declaration order is the display order of resource totals, so new kinds
/// are appended at the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Tokens of the 0.8.6 update.
    RepublicTokens,
    /// Universal Armory resource.
    Coal,
    /// Rare Armory resource.
    Steel,
    SantaGiftContainer,
    SuperContainer,
    AnniversaryCamouflages,
    AnniversaryContainers,
    FestiveToken,
    /// One festive token plus one anniversary container, credited as a unit.
    FestiveTokenAndAnniversaryContainer,
    NewYearCertificate,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::RepublicTokens,
        ResourceKind::Coal,
        ResourceKind::Steel,
        ResourceKind::SantaGiftContainer,
        ResourceKind::SuperContainer,
        ResourceKind::AnniversaryCamouflages,
        ResourceKind::AnniversaryContainers,
        ResourceKind::FestiveToken,
        ResourceKind::FestiveTokenAndAnniversaryContainer,
        ResourceKind::NewYearCertificate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::RepublicTokens => "republic_tokens",
            ResourceKind::Coal => "coal",
            ResourceKind::Steel => "steel",
            ResourceKind::SantaGiftContainer => "santa_gift_container",
            ResourceKind::SuperContainer => "super_container",
            ResourceKind::AnniversaryCamouflages => "anniversary_camouflages",
            ResourceKind::AnniversaryContainers => "anniversary_containers",
            ResourceKind::FestiveToken => "festive_token",
            ResourceKind::FestiveTokenAndAnniversaryContainer => {
                "festive_token_and_anniversary_container"
            }
            ResourceKind::NewYearCertificate => "new_year_certificate",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
