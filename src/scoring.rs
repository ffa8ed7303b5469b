use crate::betting::{self, Recommendation};
use crate::config::{LeagueAverages, PipelineConfig};
use crate::error::Diagnostic;
use crate::reconcile::{ReconciledGameRow, SideStats};
use crate::stats::StatField;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredGameRow {
    pub reconciled: ReconciledGameRow,
    pub away_expected_runs: Option<f64>,
    pub home_expected_runs: Option<f64>,
    pub model_total: Option<f64>,
    pub home_win_probability: Option<f64>,
    pub away_win_probability: Option<f64>,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinProbability {
    pub home: f64,
    pub away: f64,
}

impl ScoredGameRow {
    fn sentinel(row: ReconciledGameRow) -> Self {
        Self {
            reconciled: row,
            away_expected_runs: None,
            home_expected_runs: None,
            model_total: None,
            home_win_probability: None,
            away_win_probability: None,
            recommendation: Recommendation::Tbd,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.model_total.is_some()
    }

    /// Favored side and its probability, e.g. `BOS 57.3%`; blank when unscored.
    pub fn win_prob_display(&self) -> String {
        let (Some(home), Some(away)) = (self.home_win_probability, self.away_win_probability)
        else {
            return String::new();
        };
        let game = &self.reconciled.game;
        let (team, p) = if home >= away {
            (&game.home, home)
        } else {
            (&game.away, away)
        };
        format!("{team} {:.1}%", round1(p * 100.0))
    }
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn score_slate(
    rows: Vec<ReconciledGameRow>,
    cfg: &PipelineConfig,
) -> (Vec<ScoredGameRow>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let scored = rows
        .into_iter()
        .map(|row| {
            if !row.game.pitchers_known() {
                diagnostics.push(Diagnostic::IncompleteGame {
                    game: row.game.label(),
                    reason: format!(
                        "probable pitchers {} / {}",
                        row.game.away_pitcher, row.game.home_pitcher
                    ),
                });
            }
            score(row, cfg)
        })
        .collect();
    (scored, diagnostics)
}

pub fn score(row: ReconciledGameRow, cfg: &PipelineConfig) -> ScoredGameRow {
    if !row.game.pitchers_known() {
        return ScoredGameRow::sentinel(row);
    }

    let park = park_scale(&row.home, cfg);
    let away_runs = expected_runs(&row.away, &row.home, cfg) * park;
    let home_runs = expected_runs(&row.home, &row.away, cfg) * park + cfg.home_field_runs;
    let model_total = round1(away_runs + home_runs);
    let win = win_probability(home_runs - away_runs, cfg.win_prob_scale);
    let recommendation = betting::decide(
        Some(model_total),
        row.game.book_total,
        cfg.betting.threshold,
    );

    ScoredGameRow {
        reconciled: row,
        away_expected_runs: Some(away_runs),
        home_expected_runs: Some(home_runs),
        model_total: Some(model_total),
        home_win_probability: Some(win.home),
        away_win_probability: Some(win.away),
        recommendation,
    }
}

/// Batting side's runs against the pitching side, before the park adjustment.
/// Every input is first expressed on a runs-per-nine scale; ratio stats are
/// scaled by their league average.
pub fn expected_runs(batting: &SideStats, pitching: &SideStats, cfg: &PipelineConfig) -> f64 {
    let w = &cfg.weights;
    let lg = &cfg.league;
    let stat = |side: &SideStats, field: StatField| side.get(field).unwrap_or(league_value(lg, field));

    let o = &w.offense_members;
    let offense = o.runs_per_game * stat(batting, StatField::RunsPerGame)
        + o.on_base_pct
            * ratio_to_runs(stat(batting, StatField::OnBasePct), lg.on_base_pct, lg.runs_per_game)
        + o.power_rating * (lg.runs_per_game + stat(batting, StatField::PowerRating));

    let s = &w.starter_members;
    let starter = s.era * stat(pitching, StatField::StarterEra)
        + s.fip * stat(pitching, StatField::StarterFip)
        + s.whip
            * ratio_to_runs(stat(pitching, StatField::StarterWhip), lg.starter_whip, lg.starter_era);

    let b = &w.bullpen_members;
    let bullpen = b.era * stat(pitching, StatField::BullpenEra)
        + b.whip
            * ratio_to_runs(stat(pitching, StatField::BullpenWhip), lg.bullpen_whip, lg.bullpen_era)
        + b.runs_allowed_per_game * stat(pitching, StatField::RunsAllowedPerGame);

    w.offense * offense + w.starter * starter + w.bullpen * bullpen
}

fn ratio_to_runs(value: f64, league_value: f64, league_runs: f64) -> f64 {
    if league_value <= 0.0 {
        return league_runs;
    }
    league_runs * value / league_value
}

fn park_scale(home: &SideStats, cfg: &PipelineConfig) -> f64 {
    let lg = &cfg.league;
    let pf = home.get(StatField::ParkFactor).unwrap_or(lg.park_factor);
    let index = pf / lg.park_factor;
    (1.0 - cfg.weights.park) + cfg.weights.park * index
}

fn league_value(lg: &LeagueAverages, field: StatField) -> f64 {
    match field {
        StatField::RunsPerGame => lg.runs_per_game,
        StatField::RunsAllowedPerGame => lg.runs_allowed_per_game,
        StatField::StarterEra => lg.starter_era,
        StatField::StarterFip => lg.starter_fip,
        StatField::StarterWhip => lg.starter_whip,
        StatField::BullpenEra => lg.bullpen_era,
        StatField::BullpenWhip => lg.bullpen_whip,
        StatField::OnBasePct => lg.on_base_pct,
        StatField::ParkFactor => lg.park_factor,
        StatField::PowerRating => lg.power_rating,
    }
}

/// Base-10 logistic on the home-minus-away run differential.
pub fn win_probability(run_diff: f64, scale: f64) -> WinProbability {
    let home = 1.0 / (1.0 + 10f64.powf(-run_diff / scale));
    WinProbability {
        home,
        away: 1.0 - home,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::normalize_team;
    use crate::reconcile::reconcile;
    use crate::schedule::Game;
    use crate::stats::{PitcherStatRow, PitcherStatTable, StatFamily, TeamStatRow, TeamStatTable};

    fn game(away_p: &str, home_p: &str) -> Game {
        Game {
            id: "1".to_string(),
            start_utc: None,
            start_time: "07:10 PM".to_string(),
            away_name: "New York Yankees".to_string(),
            home_name: "Boston Red Sox".to_string(),
            away: normalize_team("NYY"),
            home: normalize_team("BOS"),
            away_pitcher: away_p.to_string(),
            home_pitcher: home_p.to_string(),
            book_total: Some(9.0),
            away_score: None,
            home_score: None,
        }
    }

    fn full_row() -> ReconciledGameRow {
        let rpg = TeamStatTable {
            family: StatFamily::RunsPerGame,
            rows: vec![
                TeamStatRow { team: normalize_team("NYY"), values: vec![Some(5.0)] },
                TeamStatRow { team: normalize_team("BOS"), values: vec![Some(4.5)] },
            ],
        };
        let pen = TeamStatTable {
            family: StatFamily::Bullpen,
            rows: vec![
                TeamStatRow { team: normalize_team("NYY"), values: vec![Some(3.5), Some(1.2)] },
                TeamStatRow { team: normalize_team("BOS"), values: vec![Some(4.0), Some(1.3)] },
            ],
        };
        let sp = PitcherStatTable {
            rows: vec![
                PitcherStatRow {
                    pitcher: "Gerrit Cole".into(),
                    team: normalize_team("NYY"),
                    era: Some(3.0),
                    fip: Some(3.5),
                    whip: Some(1.1),
                },
                PitcherStatRow {
                    pitcher: "Brayan Bello".into(),
                    team: normalize_team("BOS"),
                    era: Some(4.0),
                    fip: Some(4.5),
                    whip: Some(1.3),
                },
            ],
        };
        reconcile(&[game("Gerrit Cole", "Brayan Bello")], &[rpg, pen], &[sp])
            .rows
            .remove(0)
    }

    #[test]
    fn default_weights_match_reference_formula() {
        let cfg = PipelineConfig::default();
        let scored = score(full_row(), &cfg);
        // away: 0.4*5.0 + 0.3*4.0 + 0.2*4.5 + 0.1*4.0
        let away = 0.4 * 5.0 + 0.3 * 4.0 + 0.2 * 4.5 + 0.1 * 4.0;
        // home: 0.4*4.5 + 0.3*3.0 + 0.2*3.5 + 0.1*3.5
        let home = 0.4 * 4.5 + 0.3 * 3.0 + 0.2 * 3.5 + 0.1 * 3.5;
        assert!((scored.away_expected_runs.unwrap() - away).abs() < 1e-9);
        assert!((scored.home_expected_runs.unwrap() - home).abs() < 1e-9);
        assert_eq!(scored.model_total, Some(round1(away + home)));
    }

    #[test]
    fn probabilities_are_complementary_and_favor_the_better_side() {
        let cfg = PipelineConfig::default();
        let scored = score(full_row(), &cfg);
        let h = scored.home_win_probability.unwrap();
        let a = scored.away_win_probability.unwrap();
        assert!((h + a - 1.0).abs() < 1e-6);
        // Away projects more runs here.
        assert!(a > h);
        assert!(scored.win_prob_display().starts_with("NYY "));
        assert!(scored.win_prob_display().ends_with('%'));
    }

    #[test]
    fn win_probability_is_monotonic_and_bounded() {
        let mut prev = 0.0;
        for d in [-20.0, -3.0, -1.0, 0.0, 1.0, 3.0, 20.0] {
            let p = win_probability(d, 1.5);
            assert!(p.home > 0.0 && p.home < 1.0 || d.abs() >= 20.0);
            assert!(p.home >= prev);
            assert!((p.home + p.away - 1.0).abs() < 1e-12);
            prev = p.home;
        }
        assert_eq!(win_probability(0.0, 1.5).home, 0.5);
    }

    #[test]
    fn tbd_pitcher_yields_sentinel() {
        let mut row = full_row();
        row.game.away_pitcher = "TBD".to_string();
        let scored = score(row, &PipelineConfig::default());
        assert!(!scored.is_scored());
        assert_eq!(scored.away_expected_runs, None);
        assert_eq!(scored.win_prob_display(), "");
        assert_eq!(scored.recommendation, Recommendation::Tbd);
    }

    #[test]
    fn missing_stats_use_league_defaults() {
        let row = reconcile(&[game("Nobody", "Nobody Else")], &[], &[]).rows.remove(0);
        let cfg = PipelineConfig::default();
        let scored = score(row, &cfg);
        let lg = &cfg.league;
        let expected = 0.4 * lg.runs_per_game
            + 0.3 * lg.starter_era
            + 0.2 * lg.starter_fip
            + 0.1 * lg.bullpen_era;
        assert!((scored.away_expected_runs.unwrap() - expected).abs() < 1e-9);
        assert!(scored.model_total.unwrap().is_finite());
        assert_eq!(scored.home_win_probability, Some(0.5));
    }

    #[test]
    fn park_factor_scales_both_sides() {
        let parks = TeamStatTable {
            family: StatFamily::ParkFactor,
            rows: vec![TeamStatRow { team: normalize_team("BOS"), values: vec![Some(110.0)] }],
        };
        let row = reconcile(&[game("Gerrit Cole", "Brayan Bello")], &[parks], &[])
            .rows
            .remove(0);
        let mut cfg = PipelineConfig::default();
        cfg.weights.park = 1.0;

        let with_park = score(row.clone(), &cfg);
        let without_park = score(row, &PipelineConfig::default());
        for (a, b) in [
            (with_park.away_expected_runs, without_park.away_expected_runs),
            (with_park.home_expected_runs, without_park.home_expected_runs),
        ] {
            assert!((a.unwrap() / b.unwrap() - 1.1).abs() < 1e-9);
        }
    }

    #[test]
    fn home_field_runs_shift_home_only() {
        let mut cfg = PipelineConfig::default();
        cfg.home_field_runs = 0.3;
        let base = score(full_row(), &PipelineConfig::default());
        let adj = score(full_row(), &cfg);
        assert_eq!(base.away_expected_runs, adj.away_expected_runs);
        let delta = adj.home_expected_runs.unwrap() - base.home_expected_runs.unwrap();
        assert!((delta - 0.3).abs() < 1e-9);
    }

    #[test]
    fn slate_reports_incomplete_games() {
        let mut tbd = full_row();
        tbd.game.home_pitcher = "TBD".to_string();
        let (rows, diags) = score_slate(vec![full_row(), tbd], &PipelineConfig::default());
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_scored());
        assert!(!rows[1].is_scored());
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0], Diagnostic::IncompleteGame { .. }));
    }
}
