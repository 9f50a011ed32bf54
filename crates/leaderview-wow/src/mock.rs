use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use leaderview_core::entity::wow_key;
use leaderview_core::error::ClientError;

use crate::client::{BlizzardClient, BlizzardNamespace, RaiderIoClient};
use crate::domain::{
    CharacterProfile, Cutoff, CutoffTable, CutoffValue, GuildRef, GuildRoster, Named, RaiderIoProfile,
    RealmRef, RosterCharacter, RosterMember, Scores, SeasonCutoffs, SeasonScores,
};

fn not_found(what: &str) -> ClientError {
    ClientError::Http {
        status: 404,
        body: format!("{what} not found"),
    }
}

pub fn profile(id: i64, name: &str, realm: &str, level: i32) -> CharacterProfile {
    CharacterProfile {
        id,
        name: name.to_owned(),
        level,
        realm: RealmRef {
            slug: realm.to_owned(),
        },
        character_class: Named {
            name: "Warrior".to_owned(),
        },
        race: Named {
            name: "Orc".to_owned(),
        },
        guild: None,
        equipped_item_level: Some(55),
        is_ghost: false,
    }
}

/// Scripted Blizzard API keyed by `region/realm/name`.
#[derive(Default)]
pub struct MockBlizzardClient {
    pub characters: HashMap<String, CharacterProfile>,
    pub rosters: HashMap<String, Result<GuildRoster, ClientError>>,
    pub failing: HashMap<String, ClientError>,
    pub requests: Mutex<Vec<(BlizzardNamespace, String)>>,
}

impl MockBlizzardClient {
    pub fn with_character(mut self, region: &str, profile: CharacterProfile) -> Self {
        self.characters.insert(
            wow_key(region, &profile.realm.slug, &profile.name),
            profile,
        );
        self
    }

    pub fn with_failure(mut self, region: &str, realm: &str, name: &str, err: ClientError) -> Self {
        self.failing.insert(wow_key(region, realm, name), err);
        self
    }

    pub fn with_roster(
        mut self,
        region: &str,
        realm: &str,
        guild: &str,
        members: &[(&str, i32)],
    ) -> Self {
        let roster = GuildRoster {
            guild: GuildRef {
                id: 77,
                name: guild.to_owned(),
                realm: RealmRef {
                    slug: realm.to_owned(),
                },
            },
            members: members
                .iter()
                .enumerate()
                .map(|(i, (name, level))| RosterMember {
                    character: RosterCharacter {
                        id: 1000 + i64::try_from(i).unwrap(),
                        name: (*name).to_owned(),
                        level: *level,
                        realm: RealmRef {
                            slug: realm.to_owned(),
                        },
                    },
                })
                .collect(),
        };
        self.rosters.insert(wow_key(region, realm, guild), Ok(roster));
        self
    }

    pub fn with_failing_roster(mut self, region: &str, realm: &str, guild: &str, err: ClientError) -> Self {
        self.rosters.insert(wow_key(region, realm, guild), Err(err));
        self
    }

    pub fn requests(&self) -> Vec<(BlizzardNamespace, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlizzardClient for MockBlizzardClient {
    async fn get_character(
        &self,
        namespace: BlizzardNamespace,
        region: &str,
        realm: &str,
        name: &str,
    ) -> Result<CharacterProfile, ClientError> {
        let key = wow_key(region, realm, name);
        self.requests.lock().unwrap().push((namespace, key.clone()));
        if let Some(err) = self.failing.get(&key) {
            return Err(err.clone());
        }
        self.characters.get(&key).cloned().ok_or_else(|| not_found(&key))
    }

    async fn get_guild_roster(
        &self,
        _namespace: BlizzardNamespace,
        region: &str,
        realm: &str,
        guild: &str,
    ) -> Result<GuildRoster, ClientError> {
        let key = wow_key(region, realm, guild);
        self.rosters
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(not_found(&key)))
    }
}

/// Scripted RaiderIO API. Counts cutoff requests per region.
#[derive(Default)]
pub struct MockRaiderIoClient {
    pub scores: HashMap<String, f64>,
    pub cutoffs: HashMap<String, SeasonCutoffs>,
    pub cutoff_requests: Mutex<Vec<String>>,
}

impl MockRaiderIoClient {
    pub fn with_score(mut self, region: &str, realm: &str, name: &str, score: f64) -> Self {
        self.scores.insert(wow_key(region, realm, name), score);
        self
    }

    pub fn with_cutoffs(mut self, region: &str, p999: f64, p990: f64, p900: f64) -> Self {
        let at = |v| Cutoff {
            all: CutoffValue {
                quantile_min_value: v,
            },
        };
        self.cutoffs.insert(
            region.to_owned(),
            SeasonCutoffs {
                cutoffs: CutoffTable {
                    p999: at(p999),
                    p990: at(p990),
                    p900: at(p900),
                    p750: at(p900 - 300.0),
                    p600: at(p900 - 600.0),
                },
            },
        );
        self
    }

    pub fn cutoff_requests(&self) -> Vec<String> {
        self.cutoff_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RaiderIoClient for MockRaiderIoClient {
    async fn get_profile(
        &self,
        region: &str,
        realm: &str,
        name: &str,
    ) -> Result<RaiderIoProfile, ClientError> {
        let key = wow_key(region, realm, name);
        let score = *self.scores.get(&key).ok_or_else(|| not_found(&key))?;
        Ok(RaiderIoProfile {
            name: name.to_owned(),
            class: "Mage".to_owned(),
            active_spec_name: Some("Frost".to_owned()),
            mythic_plus_scores_by_season: vec![SeasonScores {
                season: "season-tww-3".to_owned(),
                scores: Scores { all: score },
            }],
            gear: None,
        })
    }

    async fn get_season_cutoffs(&self, region: &str) -> Result<SeasonCutoffs, ClientError> {
        self.cutoff_requests.lock().unwrap().push(region.to_owned());
        self.cutoffs
            .get(region)
            .copied()
            .ok_or_else(|| not_found(region))
    }
}
