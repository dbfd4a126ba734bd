// Plain-text weekly report printed to stdout at the end of a run.

use std::fmt::Write;

use fourthdown_core::engine::WeeklyPlan;
use fourthdown_core::model::InjuryStatus;
use fourthdown_core::scoring::ScoredPlayer;
use fourthdown_core::signals::normalizer::NormalizeStats;
use fourthdown_core::week::WeekWindow;

/// Render the lineup, changes from the current starters, bench, exclusions
/// and waiver suggestions.
pub fn render(
    league_name: &str,
    window: &WeekWindow,
    plan: &WeeklyPlan,
    stats: &NormalizeStats,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, league_name, window, plan, stats);
    out
}

fn write_report(
    out: &mut String,
    league_name: &str,
    window: &WeekWindow,
    plan: &WeeklyPlan,
    stats: &NormalizeStats,
) -> std::fmt::Result {
    let last_day = window.end - chrono::Duration::days(1);
    writeln!(
        out,
        "{league_name}: week {} ({} to {})",
        window.week,
        window.start.format("%Y-%m-%d"),
        last_day.format("%Y-%m-%d")
    )?;
    writeln!(
        out,
        "signals: {} rows, {} linked, {} unlinked, {} outside the week",
        stats.rows, stats.linked, stats.unlinked, stats.out_of_window
    )?;
    writeln!(
        out,
        "risk: {} (starter confidence {:.2})",
        plan.risk, plan.confidence
    )?;

    writeln!(out)?;
    writeln!(out, "STARTERS")?;
    for slot in &plan.lineup.slots {
        match &slot.player {
            Some(sp) => {
                writeln!(out, "  {:<6}{}", slot.name, player_line(sp))?;
                match breakdown(sp) {
                    Some(breakdown) => writeln!(
                        out,
                        "        {breakdown} (confidence {:.2})",
                        sp.confidence()
                    )?,
                    None => writeln!(out, "        confidence {:.2}", sp.confidence())?,
                }
            }
            None => writeln!(out, "  {:<6}(empty: no eligible player)", slot.name)?,
        }
    }
    writeln!(out, "  total {:.1}", plan.lineup.total_score())?;

    if let Some(changes) = &plan.changes {
        writeln!(out)?;
        writeln!(out, "CHANGES")?;
        if changes.is_empty() {
            writeln!(out, "  none: current lineup is already the best")?;
        } else {
            for c in changes {
                writeln!(
                    out,
                    "  {:<6}{} -> {}, {:+.1}",
                    c.slot,
                    short_name(c.previous.as_ref()),
                    short_name(c.recommended.as_ref()),
                    c.delta
                )?;
            }
            let gain: f64 = changes.iter().map(|c| c.delta).sum();
            writeln!(out, "  gain {gain:+.1}")?;
        }
    }

    if !plan.lineup.bench.is_empty() {
        writeln!(out)?;
        writeln!(out, "BENCH")?;
        for sp in &plan.lineup.bench {
            writeln!(out, "        {}", player_line(sp))?;
        }
    }

    if !plan.excluded.is_empty() {
        writeln!(out)?;
        writeln!(out, "EXCLUDED")?;
        for ex in &plan.excluded {
            let whose = if ex.on_roster { "roster" } else { "free agent" };
            writeln!(out, "  {} ({whose}): {}", ex.name, ex.status)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "WAIVER SUGGESTIONS")?;
    if plan.waiver.is_empty() {
        writeln!(out, "  none")?;
    }
    for s in &plan.waiver {
        let current = match &s.current {
            Some(c) => format!("{} ({:.1})", c.player.name, c.value()),
            None => "empty slot".to_string(),
        };
        writeln!(
            out,
            "  {:<6}add {} over {current}, {:+.1}",
            s.slot,
            player_line(&s.candidate),
            s.delta
        )?;
        if let Some(d) = &s.drop_candidate {
            writeln!(out, "        drop {}", player_line(d))?;
        }
    }

    Ok(())
}

fn player_line(sp: &ScoredPlayer) -> String {
    let p = &sp.player;
    let mut line = format!("{} ({} {}) {:.1}", p.name, p.team, p.position, sp.value());
    if p.injury_status != InjuryStatus::Active {
        line.push_str(&format!(" [{}]", p.injury_status));
    }
    line
}

/// "Name (12.0)", or "empty".
fn short_name(sp: Option<&ScoredPlayer>) -> String {
    match sp {
        Some(sp) => format!("{} ({:.1})", sp.player.name, sp.value()),
        None => "empty".to_string(),
    }
}

/// "game_total 50.5 +3.0, spread -4.5 +2.0", or `None` when nothing scored.
fn breakdown(sp: &ScoredPlayer) -> Option<String> {
    if sp.score.contributions.is_empty() {
        return None;
    }
    let parts: Vec<String> = sp
        .score
        .contributions
        .iter()
        .map(|c| format!("{} {} {:+.1}", c.signal, c.value, c.points))
        .collect();
    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fourthdown_core::eligibility::Exclusion;
    use fourthdown_core::lineup::{assign, LineupChange, RiskLevel, RosterShape};
    use fourthdown_core::model::{Player, PlayerId, Position, RosterStatus};
    use fourthdown_core::scoring::{Category, Contribution, Score};
    use fourthdown_core::signals::Signal;
    use fourthdown_core::waiver::WaiverSuggestion;

    fn sp(id: &str, name: &str, pos: Position, total: f64) -> ScoredPlayer {
        ScoredPlayer {
            player: Player {
                id: PlayerId::new(id),
                name: name.into(),
                team: "CIN".into(),
                position: pos,
                extra_positions: vec![],
                roster_status: RosterStatus::OnRoster,
                injury_status: InjuryStatus::Active,
                play_probability: None,
                bye_week: None,
            },
            score: Score {
                total,
                confidence: 0.75,
                ..Score::default()
            },
        }
    }

    fn plan() -> WeeklyPlan {
        let mut chase = sp("1", "Ja'Marr Chase", Position::WideReceiver, 5.0);
        chase.score.contributions = vec![
            Contribution {
                signal: Signal::GameTotal,
                category: Category::Market,
                value: 50.5,
                points: 3.0,
            },
            Contribution {
                signal: Signal::ReceptionLine,
                category: Category::Market,
                value: 6.5,
                points: 2.0,
            },
        ];
        let lineup = assign(&[chase.clone()], &RosterShape::standard());
        let mut fa = sp("9", "Chase Brown", Position::RunningBack, 4.0);
        fa.player.roster_status = RosterStatus::FreeAgent;
        let tee_higgins = sp("3", "Tee Higgins", Position::WideReceiver, 1.0);
        WeeklyPlan {
            week: 6,
            lineup,
            waiver: vec![WaiverSuggestion {
                slot: "RB1".into(),
                current: None,
                candidate: fa,
                delta: 4.0,
                drop_candidate: None,
            }],
            excluded: vec![Exclusion {
                player_id: PlayerId::new("2"),
                name: "Joe Burrow".into(),
                status: InjuryStatus::Out,
                on_roster: true,
            }],
            risk: RiskLevel::Medium,
            confidence: 0.75,
            changes: Some(vec![LineupChange {
                slot: "WR1".into(),
                previous: Some(tee_higgins),
                recommended: Some(chase),
                delta: 4.0,
            }]),
        }
    }

    fn window() -> WeekWindow {
        WeekWindow::for_week(NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(), 6)
    }

    #[test]
    fn report_lists_every_section() {
        let text = render("Test League", &window(), &plan(), &NormalizeStats::default());
        assert!(text.starts_with("Test League: week 6 (2025-10-07 to 2025-10-13)\n"));
        assert!(text.contains("  WR1   Ja'Marr Chase (CIN WR) 5.0\n"));
        assert!(text.contains("game_total 50.5 +3.0, reception_line 6.5 +2.0"));
        assert!(text.contains("  QB    (empty: no eligible player)\n"));
        assert!(text.contains("  total 5.0\n"));
        assert!(text.contains("  Joe Burrow (roster): OUT\n"));
        assert!(text.contains("add Chase Brown (CIN RB) 4.0 over empty slot, +4.0"));
        assert!(!text.contains("BENCH"));
        assert!(!text.contains("drop "));
    }

    #[test]
    fn report_shows_risk_confidence_and_changes() {
        let text = render("Test League", &window(), &plan(), &NormalizeStats::default());
        assert!(text.contains("risk: MEDIUM (starter confidence 0.75)\n"));
        assert!(text.contains("reception_line 6.5 +2.0 (confidence 0.75)\n"));
        assert!(text.contains(
            "CHANGES\n  WR1   Tee Higgins (1.0) -> Ja'Marr Chase (5.0), +4.0\n  gain +4.0\n"
        ));
    }

    #[test]
    fn unchanged_and_unknown_current_lineups() {
        let mut p = plan();
        p.changes = Some(vec![]);
        let text = render("L", &window(), &p, &NormalizeStats::default());
        assert!(text.contains("CHANGES\n  none: current lineup is already the best\n"));

        p.changes = None;
        let text = render("L", &window(), &p, &NormalizeStats::default());
        assert!(!text.contains("CHANGES"));
    }

    #[test]
    fn waiver_line_names_the_drop() {
        let mut p = plan();
        let mut cut = sp("4", "Andrei Iosivas", Position::WideReceiver, 0.5);
        cut.score.confidence = 0.4;
        p.waiver[0].drop_candidate = Some(cut);
        let text = render("L", &window(), &p, &NormalizeStats::default());
        assert!(text.contains(
            "over empty slot, +4.0\n        drop Andrei Iosivas (CIN WR) 0.5\n"
        ));
    }

    #[test]
    fn no_suggestions_says_so() {
        let mut p = plan();
        p.waiver.clear();
        let text = render("L", &window(), &p, &NormalizeStats::default());
        assert!(text.ends_with("WAIVER SUGGESTIONS\n  none\n"));
    }
}
