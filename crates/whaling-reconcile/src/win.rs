use whaling_schemas::{GameMode, ShipStatistics};

/// First mode, in [`GameMode::PRIORITY`] order, whose win counter grew.
///
/// `None` means the battles since `stored` were all losses (or draws).
pub fn detect_win(stored: &ShipStatistics, live: &ShipStatistics) -> Option<GameMode> {
    GameMode::PRIORITY
        .into_iter()
        .find(|mode| live.mode(*mode).wins > stored.mode(*mode).wins)
}

/// Win detection against an all-zero baseline, for ships first observed
/// after they were already played.
pub fn detect_win_from_zero(live: &ShipStatistics) -> Option<GameMode> {
    let baseline = ShipStatistics::placeholder(live.ship_id);
    detect_win(&baseline, live)
}
