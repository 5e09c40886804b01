//! Wire types of the game statistics API and their domain conversions.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BoardSnapshot, Mercenary, Observation, Unit};
use crate::domain::ports::CatalogRecord;
use crate::services::scorer::{bounty, WAVE_BOUNTIES};

/// A recorded game with per-wave details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGame {
    #[serde(default)]
    pub players_data: Vec<RawPlayer>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub queue_type: String,
    #[serde(default)]
    pub ending_wave: u32,
}

/// One player of a recorded game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayer {
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub game_result: String,
    #[serde(default)]
    pub overall_elo: u32,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub workers_per_wave: Vec<u32>,
    #[serde(default)]
    pub mercenaries_received_per_wave: Vec<Vec<String>>,
    #[serde(default)]
    pub leaks_per_wave: Vec<Vec<String>>,
    #[serde(default)]
    pub build_per_wave: Vec<Vec<String>>,
}

/// A unit as published for a game version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUnit {
    pub unit_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon_path: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub total_value: Option<Numeric>,
    #[serde(default)]
    pub mythium_cost: Option<Numeric>,
    #[serde(default)]
    pub income_bonus: Option<Numeric>,
    #[serde(default)]
    pub unit_class: String,
    #[serde(default)]
    pub category_class: String,
    #[serde(default)]
    pub upgrades_to: Vec<String>,
}

/// The API serializes some numbers as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(u64),
    Text(String),
}

impl Numeric {
    fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => u32::try_from(*n).ok(),
            Self::Text(s) if s.trim().is_empty() => None,
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Minimal unit shape used to discover the latest version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionProbe {
    #[serde(default)]
    pub version: String,
}

impl RawGame {
    /// One observation per player per rankable wave.
    ///
    /// Waves past the bounty table are dropped, as are player-waves whose
    /// build cannot be parsed.
    pub fn observations(&self, creatures_per_wave: u32) -> Vec<Observation> {
        let mut out = Vec::new();
        for player in &self.players_data {
            for (index, build) in player.build_per_wave.iter().enumerate().take(WAVE_BOUNTIES.len()) {
                let Ok(wave) = u8::try_from(index + 1) else {
                    break;
                };
                match self.observation(player, index, wave, build, creatures_per_wave) {
                    Ok(obs) => out.push(obs),
                    Err(e) => warn!(
                        player = %player.player_name,
                        wave,
                        error = %e,
                        "Dropping unparseable player wave"
                    ),
                }
            }
        }
        out
    }

    fn observation(
        &self,
        player: &RawPlayer,
        index: usize,
        wave: u8,
        build: &[String],
        creatures_per_wave: u32,
    ) -> DomainResult<Observation> {
        let board = BoardSnapshot::parse(build)?;
        let next_board = player
            .build_per_wave
            .get(index + 1)
            .and_then(|next| BoardSnapshot::parse(next).ok());
        let leaks = player.leaks_per_wave.get(index).cloned().unwrap_or_default();
        let bounty = bounty(wave)?;

        Ok(Observation {
            player: player.player_name.clone(),
            wave,
            board,
            next_board,
            sends: player
                .mercenaries_received_per_wave
                .get(index)
                .cloned()
                .unwrap_or_default(),
            leaked_amount: leak_value(leaks.len(), bounty, creatures_per_wave),
            leaks,
            won: player.game_result.eq_ignore_ascii_case("won"),
            workers: player.workers_per_wave.get(index).copied().unwrap_or_default(),
            rating: player.overall_elo,
            version: player.version.clone(),
            queue_type: self.queue_type.clone(),
        })
    }
}

/// Gold value of `leaks` leaked creatures, capped at the wave bounty.
pub fn leak_value(leaks: usize, bounty: u32, creatures_per_wave: u32) -> u32 {
    if leaks == 0 || creatures_per_wave == 0 {
        return 0;
    }
    let leaks = u32::try_from(leaks).unwrap_or(u32::MAX);
    (leaks.saturating_mul(bounty) / creatures_per_wave).min(bounty)
}

/// Strip the `units:` namespace the API puts on upgrade references.
fn upgrade_reference(raw: &str) -> &str {
    raw.strip_prefix("units:").unwrap_or(raw)
}

impl RawUnit {
    /// Convert into a catalog record; non-standard units yield `None`.
    pub fn into_record(self) -> DomainResult<Option<CatalogRecord>> {
        if self.category_class != "Standard" {
            return Ok(None);
        }
        match self.unit_class.as_str() {
            "Fighter" => {
                let total_value = self
                    .total_value
                    .as_ref()
                    .and_then(Numeric::as_u32)
                    .ok_or_else(|| {
                        DomainError::IngestionFailed(format!(
                            "Fighter {} has no usable total value",
                            self.unit_id
                        ))
                    })?;
                let upgrades_to = self
                    .upgrades_to
                    .iter()
                    .map(|u| upgrade_reference(u).to_string())
                    .filter(|u| !u.is_empty())
                    .collect();
                let mut unit = Unit::new(self.unit_id, self.name, total_value).with_version(self.version);
                unit.icon_path = self.icon_path;
                Ok(Some(CatalogRecord::Fighter { unit, upgrades_to }))
            }
            "Mercenary" => {
                let cost = self.mythium_cost.as_ref().and_then(Numeric::as_u32).unwrap_or_default();
                let income = self.income_bonus.as_ref().and_then(Numeric::as_u32).unwrap_or_default();
                let mut merc = Mercenary::new(self.unit_id, self.name, cost, income);
                merc.version = self.version;
                merc.icon_path = self.icon_path;
                Ok(Some(CatalogRecord::Mercenary(merc)))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> RawPlayer {
        RawPlayer {
            player_name: "alpha".to_string(),
            game_result: "won".to_string(),
            overall_elo: 2600,
            version: "v11.01".to_string(),
            workers_per_wave: vec![0, 1],
            mercenaries_received_per_wave: vec![vec![], vec!["Snail".to_string()]],
            leaks_per_wave: vec![vec![], vec!["crab_unit_id".to_string(); 3]],
            build_per_wave: vec![
                vec!["proton_unit_id:1|1:0".to_string()],
                vec!["proton_unit_id:1|1:0".to_string(), "chick_unit_id:2|3:0".to_string()],
            ],
        }
    }

    #[test]
    fn test_game_deserializes_camel_case() {
        let json = r#"{
            "date": "2024-01-01T00:00:00.000Z",
            "queueType": "Normal",
            "endingWave": 12,
            "playersData": [{
                "playerName": "alpha",
                "gameResult": "lost",
                "overallElo": 2100,
                "buildPerWave": [["proton_unit_id:1|1:0"]],
                "mercenariesReceivedPerWave": [["Snail"]],
                "leaksPerWave": [[]],
                "workersPerWave": [0]
            }]
        }"#;
        let game: RawGame = serde_json::from_str(json).unwrap();
        assert_eq!(game.queue_type, "Normal");
        assert_eq!(game.players_data[0].overall_elo, 2100);
        let obs = game.observations(12);
        assert_eq!(obs.len(), 1);
        assert!(!obs[0].won);
        assert_eq!(obs[0].sends, vec!["Snail"]);
    }

    #[test]
    fn test_observations_per_wave() {
        let game = RawGame {
            players_data: vec![player()],
            queue_type: "Normal".to_string(),
            ..Default::default()
        };
        let obs = game.observations(12);
        assert_eq!(obs.len(), 2);

        assert_eq!(obs[0].wave, 1);
        assert!(obs[0].next_board.is_some());
        assert_eq!(obs[0].leaked_amount, 0);

        assert_eq!(obs[1].wave, 2);
        assert!(obs[1].next_board.is_none());
        assert_eq!(obs[1].workers, 1);
        // Three of twelve creatures at an 84 gold bounty.
        assert_eq!(obs[1].leaked_amount, 21);
        assert!(obs[1].won);
    }

    #[test]
    fn test_bad_build_is_dropped() {
        let mut p = player();
        p.build_per_wave[0] = vec!["garbage".to_string()];
        let game = RawGame {
            players_data: vec![p],
            ..Default::default()
        };
        let obs = game.observations(12);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].wave, 2);
    }

    #[test]
    fn test_leak_value_is_capped() {
        assert_eq!(leak_value(0, 72, 12), 0);
        assert_eq!(leak_value(6, 72, 12), 36);
        assert_eq!(leak_value(30, 72, 12), 72);
        assert_eq!(leak_value(3, 72, 0), 0);
    }

    #[test]
    fn test_unit_records() {
        let fighter: RawUnit = serde_json::from_str(
            r#"{"unitId":"chick_unit_id","name":"Chick","totalValue":"40","unitClass":"Fighter",
                "categoryClass":"Standard","upgradesTo":["units:hell_raiser_unit_id"],"version":"v11.01"}"#,
        )
        .unwrap();
        match fighter.into_record().unwrap() {
            Some(CatalogRecord::Fighter { unit, upgrades_to }) => {
                assert_eq!(unit.total_value, 40);
                assert_eq!(upgrades_to, vec!["hell_raiser_unit_id"]);
            }
            other => panic!("unexpected record {other:?}"),
        }

        let merc: RawUnit = serde_json::from_str(
            r#"{"unitId":"snail_unit_id","name":"Snail","mythiumCost":"20","incomeBonus":6,
                "unitClass":"Mercenary","categoryClass":"Standard"}"#,
        )
        .unwrap();
        match merc.into_record().unwrap() {
            Some(CatalogRecord::Mercenary(m)) => {
                assert_eq!(m.mythium_cost, 20);
                assert_eq!(m.income_bonus, 6);
            }
            other => panic!("unexpected record {other:?}"),
        }

        let creature: RawUnit = serde_json::from_str(
            r#"{"unitId":"crab_unit_id","unitClass":"Creature","categoryClass":"Standard"}"#,
        )
        .unwrap();
        assert!(creature.into_record().unwrap().is_none());
    }

    #[test]
    fn test_fighter_without_value_fails() {
        let fighter: RawUnit = serde_json::from_str(
            r#"{"unitId":"odd_unit_id","totalValue":"","unitClass":"Fighter","categoryClass":"Standard"}"#,
        )
        .unwrap();
        assert!(matches!(
            fighter.into_record(),
            Err(DomainError::IngestionFailed(_))
        ));
    }
}
