use serde::{Deserialize, Serialize};

/// `last_battle_time` of a ship that was bought but never taken into battle.
pub const NEVER_PLAYED: i64 = -1;

/// Game mode a battle counter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Pvp,
    Pve,
    OperDiv,
    OperSolo,
    RankSolo,
}

impl GameMode {
    /// Win-detection priority. Only the first mode with a new win is reported.
    pub const PRIORITY: [GameMode; 5] = [
        GameMode::Pvp,
        GameMode::Pve,
        GameMode::OperDiv,
        GameMode::OperSolo,
        GameMode::RankSolo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Pvp => "pvp",
            GameMode::Pve => "pve",
            GameMode::OperDiv => "oper_div",
            GameMode::OperSolo => "oper_solo",
            GameMode::RankSolo => "rank_solo",
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCounters {
    pub wins: u32,
    pub battles: u32,
}

impl ModeCounters {
    pub const fn new(wins: u32, battles: u32) -> Self {
        Self { wins, battles }
    }
}

/// Live per-ship battle statistics of one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipStatistics {
    pub ship_id: i64,
    /// Unix seconds, or [`NEVER_PLAYED`].
    pub last_battle_time: i64,
    pub battles: u32,
    pub in_garage: bool,
    #[serde(default)]
    pub pvp: ModeCounters,
    #[serde(default)]
    pub pve: ModeCounters,
    #[serde(default)]
    pub rank_solo: ModeCounters,
    #[serde(default)]
    pub oper_div: ModeCounters,
    #[serde(default)]
    pub oper_solo: ModeCounters,
}

impl ShipStatistics {
    /// Zeroed record for a ship sitting in port that was never played.
    pub fn placeholder(ship_id: i64) -> Self {
        Self {
            ship_id,
            last_battle_time: NEVER_PLAYED,
            battles: 0,
            in_garage: true,
            pvp: ModeCounters::default(),
            pve: ModeCounters::default(),
            rank_solo: ModeCounters::default(),
            oper_div: ModeCounters::default(),
            oper_solo: ModeCounters::default(),
        }
    }

    pub fn mode(&self, mode: GameMode) -> ModeCounters {
        match mode {
            GameMode::Pvp => self.pvp,
            GameMode::Pve => self.pve,
            GameMode::OperDiv => self.oper_div,
            GameMode::OperSolo => self.oper_solo,
            GameMode::RankSolo => self.rank_solo,
        }
    }

    pub fn mode_mut(&mut self, mode: GameMode) -> &mut ModeCounters {
        match mode {
            GameMode::Pvp => &mut self.pvp,
            GameMode::Pve => &mut self.pve,
            GameMode::OperDiv => &mut self.oper_div,
            GameMode::OperSolo => &mut self.oper_solo,
            GameMode::RankSolo => &mut self.rank_solo,
        }
    }

    pub fn never_played(&self) -> bool {
        self.last_battle_time == NEVER_PLAYED
    }
}
