use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{Diagnostic, Side};
use crate::identity::{TeamKey, pitcher_key};
use crate::schedule::{Game, is_known_pitcher};
use crate::stats::{PitcherStatRow, PitcherStatTable, StatField, TeamStatRow, TeamStatTable};

#[derive(Debug, Clone, PartialEq)]
pub struct SideStats {
    pub team: TeamKey,
    pub pitcher: String,
    values: BTreeMap<StatField, Option<f64>>,
}

impl SideStats {
    fn new(team: TeamKey, pitcher: String) -> Self {
        Self {
            team,
            pitcher,
            values: StatField::ALL.iter().map(|f| (*f, None)).collect(),
        }
    }

    pub fn get(&self, field: StatField) -> Option<f64> {
        self.values.get(&field).copied().flatten()
    }

    fn fill(&mut self, field: StatField, value: Option<f64>) {
        let slot = self.values.entry(field).or_insert(None);
        if slot.is_none() {
            *slot = value;
        }
    }

    pub fn values(&self) -> impl Iterator<Item = (StatField, Option<f64>)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    pub fn missing(&self) -> Vec<StatField> {
        self.values()
            .filter(|(_, v)| v.is_none())
            .map(|(f, _)| f)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledGameRow {
    pub game: Game,
    pub away: SideStats,
    pub home: SideStats,
}

impl ReconciledGameRow {
    pub fn side(&self, side: Side) -> &SideStats {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn columns(&self) -> Vec<(String, Option<f64>)> {
        [Side::Away, Side::Home]
            .into_iter()
            .flat_map(|side| {
                self.side(side)
                    .values()
                    .map(move |(f, v)| (format!("{}_{}", side.prefix(), f.column()), v))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingFields {
    pub game: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub rows: Vec<ReconciledGameRow>,
    pub missing: Vec<MissingFields>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn reconcile(
    schedule: &[Game],
    team_tables: &[TeamStatTable],
    pitcher_tables: &[PitcherStatTable],
) -> Reconciliation {
    let team_indexes: Vec<(&TeamStatTable, HashMap<&TeamKey, &TeamStatRow>)> =
        team_tables.iter().map(|t| (t, t.index())).collect();
    let pitcher_indexes: Vec<HashMap<String, Vec<&PitcherStatRow>>> =
        pitcher_tables.iter().map(PitcherStatTable::index).collect();
    let have_pitchers = pitcher_tables.iter().any(|t| !t.rows.is_empty());

    let mut out = Reconciliation::default();
    for game in schedule {
        let label = game.label();
        let mut away = SideStats::new(game.away.clone(), game.away_pitcher.clone());
        let mut home = SideStats::new(game.home.clone(), game.home_pitcher.clone());

        for (side, stats) in [(Side::Away, &mut away), (Side::Home, &mut home)] {
            if !stats.team.is_canonical() {
                out.diagnostics.push(Diagnostic::IdentityMismatch {
                    game: label.clone(),
                    side,
                    what: "team".to_string(),
                    value: stats.team.to_string(),
                });
            }

            for (table, index) in &team_indexes {
                let row = index.get(&stats.team);
                for (i, field) in table.family.fields().iter().enumerate() {
                    stats.fill(*field, row.and_then(|r| r.values.get(i).copied().flatten()));
                }
            }

            if is_known_pitcher(&stats.pitcher) {
                let found = pitcher_indexes
                    .iter()
                    .find_map(|idx| lookup_pitcher(idx, &stats.pitcher, &stats.team));
                match found {
                    Some(p) => {
                        stats.fill(StatField::StarterEra, p.era);
                        stats.fill(StatField::StarterFip, p.fip);
                        stats.fill(StatField::StarterWhip, p.whip);
                    }
                    None if have_pitchers => out.diagnostics.push(Diagnostic::IdentityMismatch {
                        game: label.clone(),
                        side,
                        what: "pitcher".to_string(),
                        value: stats.pitcher.clone(),
                    }),
                    None => {}
                }
            }
        }

        let fields: Vec<String> = [(Side::Away, &away), (Side::Home, &home)]
            .into_iter()
            .flat_map(|(side, stats)| {
                stats
                    .missing()
                    .into_iter()
                    .map(move |f| format!("{}_{}", side.prefix(), f.column()))
            })
            .collect();
        if !fields.is_empty() {
            debug!(game = %label, missing = fields.len(), "reconciled row has gaps");
            out.missing.push(MissingFields {
                game: label.clone(),
                fields,
            });
        }

        out.rows.push(ReconciledGameRow {
            game: game.clone(),
            away,
            home,
        });
    }
    out
}

/// Name first; the team only breaks ties between same-named pitchers.
fn lookup_pitcher<'a>(
    index: &HashMap<String, Vec<&'a PitcherStatRow>>,
    name: &str,
    team: &TeamKey,
) -> Option<&'a PitcherStatRow> {
    let candidates = index.get(&pitcher_key(name))?;
    match candidates.as_slice() {
        [only] => Some(*only),
        many => {
            let mut same_team = many.iter().filter(|p| &p.team == team);
            match (same_team.next(), same_team.next()) {
                (Some(p), None) => Some(*p),
                _ => None,
            }
        }
    }
}
