use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use whaling_policy::{PolicyRegistry, ShipCatalogue};
use whaling_reconcile::PromotionContext;

use crate::WhalingConfig;

pub fn load_catalogue(path: &str) -> Result<ShipCatalogue> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read ship catalogue: {path}"))?;
    ShipCatalogue::from_json_str(&raw).with_context(|| format!("invalid ship catalogue: {path}"))
}

/// Resolve the active policy and realm start times into the value the engine
/// and worker receive. Validates the configuration first.
pub fn build_promotion_context(
    cfg: &WhalingConfig,
    registry: &PolicyRegistry,
    catalogue: ShipCatalogue,
) -> Result<PromotionContext> {
    cfg.validate(registry)?;
    let policy = registry
        .instantiate(&cfg.promotion.policy)
        .context("promotion policy lookup failed")?;
    Ok(PromotionContext::new(
        policy,
        Arc::new(catalogue),
        cfg.promotion.realms.clone(),
    ))
}
