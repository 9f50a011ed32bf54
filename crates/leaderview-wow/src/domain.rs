//! Blizzard and RaiderIO payloads and the cached WoW snapshots.

use serde::{Deserialize, Serialize};

/// A named reference inside a Blizzard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

/// A realm reference inside a Blizzard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmRef {
    pub slug: String,
}

/// Blizzard character profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Blizzard character id.
    pub id: i64,
    pub name: String,
    pub level: i32,
    pub realm: RealmRef,
    pub character_class: Named,
    pub race: Named,
    #[serde(default)]
    pub guild: Option<Named>,
    #[serde(default)]
    pub equipped_item_level: Option<i32>,
    /// Set on Hardcore characters that died.
    #[serde(default)]
    pub is_ghost: bool,
}

/// A character listed on a guild roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterCharacter {
    pub id: i64,
    pub name: String,
    pub level: i32,
    pub realm: RealmRef,
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    pub character: RosterCharacter,
}

/// The guild a roster belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRef {
    pub id: i64,
    pub name: String,
    pub realm: RealmRef,
}

/// Blizzard guild roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRoster {
    pub guild: GuildRef,
    pub members: Vec<RosterMember>,
}

/// Mythic+ score of one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonScores {
    pub season: String,
    pub scores: Scores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub all: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub item_level_equipped: f64,
}

/// RaiderIO character profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaiderIoProfile {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub active_spec_name: Option<String>,
    #[serde(default)]
    pub mythic_plus_scores_by_season: Vec<SeasonScores>,
    #[serde(default)]
    pub gear: Option<Gear>,
}

impl RaiderIoProfile {
    /// Mythic+ score of the current season, zero if unranked.
    #[must_use]
    pub fn current_score(&self) -> f64 {
        self.mythic_plus_scores_by_season
            .first()
            .map_or(0.0, |s| s.scores.all)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffValue {
    pub quantile_min_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cutoff {
    pub all: CutoffValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoffTable {
    pub p999: Cutoff,
    pub p990: Cutoff,
    pub p900: Cutoff,
    pub p750: Cutoff,
    pub p600: Cutoff,
}

/// Minimum Mythic+ scores of the season's top percentiles in a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonCutoffs {
    pub cutoffs: CutoffTable,
}

impl SeasonCutoffs {
    /// The smallest "top N%" bracket `score` reaches, if any.
    #[must_use]
    pub fn top_percent(&self, score: f64) -> Option<f64> {
        let table = &self.cutoffs;
        [
            (0.1, table.p999),
            (1.0, table.p990),
            (10.0, table.p900),
            (25.0, table.p750),
            (40.0, table.p600),
        ]
        .into_iter()
        .find(|(_, cutoff)| score > 0.0 && score >= cutoff.all.quantile_min_value)
        .map(|(percent, _)| percent)
    }
}

/// Payload of a WoW retail data cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WowData {
    pub score: f64,
    pub class: String,
    pub spec: Option<String>,
    pub item_level: Option<f64>,
    /// Season bracket, e.g. `1.0` for the top 1%.
    pub top_percent: Option<f64>,
}

/// Payload of a WoW Hardcore data cache record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WowHardcoreData {
    pub name: String,
    pub level: i32,
    pub class: String,
    pub race: String,
    pub guild: Option<String>,
    pub item_level: Option<i32>,
    pub is_dead: bool,
}

impl WowHardcoreData {
    #[must_use]
    pub fn from_profile(profile: &CharacterProfile) -> Self {
        Self {
            name: profile.name.clone(),
            level: profile.level,
            class: profile.character_class.name.clone(),
            race: profile.race.name.clone(),
            guild: profile.guild.as_ref().map(|g| g.name.clone()),
            item_level: profile.equipped_item_level,
            is_dead: profile.is_ghost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cutoffs() -> SeasonCutoffs {
        let at = |v| Cutoff {
            all: CutoffValue {
                quantile_min_value: v,
            },
        };
        SeasonCutoffs {
            cutoffs: CutoffTable {
                p999: at(3500.0),
                p990: at(3200.0),
                p900: at(2800.0),
                p750: at(2500.0),
                p600: at(2200.0),
            },
        }
    }

    #[test]
    fn test_top_percent_picks_the_best_bracket_reached() {
        let cutoffs = cutoffs();

        assert_eq!(cutoffs.top_percent(3600.0), Some(0.1));
        assert_eq!(cutoffs.top_percent(3200.0), Some(1.0));
        assert_eq!(cutoffs.top_percent(2600.0), Some(25.0));
        assert_eq!(cutoffs.top_percent(1000.0), None);
    }

    #[test]
    fn test_cutoffs_decode_from_raider_io_json() {
        let json = r#"{"cutoffs":{
            "p999":{"all":{"quantile":99.9,"quantileMinValue":3500.5}},
            "p990":{"all":{"quantileMinValue":3200.0}},
            "p900":{"all":{"quantileMinValue":2800.0}},
            "p750":{"all":{"quantileMinValue":2500.0}},
            "p600":{"all":{"quantileMinValue":2200.0}}}}"#;

        let decoded: SeasonCutoffs = serde_json::from_str(json).unwrap();

        assert!((decoded.cutoffs.p999.all.quantile_min_value - 3500.5).abs() < f64::EPSILON);
    }
}
