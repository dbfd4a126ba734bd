// NFL team name canonicalization.
//
// Roster providers report abbreviations ("KC"), odds providers report full
// names ("Kansas City Chiefs"), and scraped projections sometimes report the
// nickname alone. Everything is folded to the abbreviation before alignment.

/// (abbreviation, full name, extra aliases)
const TEAMS: &[(&str, &str, &[&str])] = &[
    ("ARI", "Arizona Cardinals", &["ARZ"]),
    ("ATL", "Atlanta Falcons", &[]),
    ("BAL", "Baltimore Ravens", &["BLT"]),
    ("BUF", "Buffalo Bills", &[]),
    ("CAR", "Carolina Panthers", &[]),
    ("CHI", "Chicago Bears", &[]),
    ("CIN", "Cincinnati Bengals", &[]),
    ("CLE", "Cleveland Browns", &["CLV"]),
    ("DAL", "Dallas Cowboys", &[]),
    ("DEN", "Denver Broncos", &[]),
    ("DET", "Detroit Lions", &[]),
    ("GB", "Green Bay Packers", &["GNB"]),
    ("HOU", "Houston Texans", &["HST"]),
    ("IND", "Indianapolis Colts", &[]),
    ("JAX", "Jacksonville Jaguars", &["JAC"]),
    ("KC", "Kansas City Chiefs", &["KAN"]),
    ("LV", "Las Vegas Raiders", &["LVR", "OAK"]),
    ("LAC", "Los Angeles Chargers", &["SD"]),
    ("LAR", "Los Angeles Rams", &["LA", "STL"]),
    ("MIA", "Miami Dolphins", &[]),
    ("MIN", "Minnesota Vikings", &[]),
    ("NE", "New England Patriots", &["NWE"]),
    ("NO", "New Orleans Saints", &["NOR"]),
    ("NYG", "New York Giants", &[]),
    ("NYJ", "New York Jets", &[]),
    ("PHI", "Philadelphia Eagles", &[]),
    ("PIT", "Pittsburgh Steelers", &[]),
    ("SF", "San Francisco 49ers", &["SFO"]),
    ("SEA", "Seattle Seahawks", &[]),
    ("TB", "Tampa Bay Buccaneers", &["TAM"]),
    ("TEN", "Tennessee Titans", &[]),
    ("WAS", "Washington Commanders", &["WSH"]),
];

/// Lowercase and collapse internal whitespace.
pub fn fold(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical abbreviation for any known spelling of a team.
///
/// Accepts the abbreviation, a known alias, the full name, or the nickname
/// (last word of the full name). Unknown inputs are returned folded so two
/// identical unknown spellings still align with each other.
pub fn canonical_team(name: &str) -> String {
    let folded = fold(name);
    for &(abbr, full, aliases) in TEAMS {
        let nickname = full.rsplit(' ').next().unwrap_or(full);
        if folded == abbr.to_lowercase()
            || folded == full.to_lowercase()
            || folded == nickname.to_lowercase()
            || aliases.iter().any(|a| folded == a.to_lowercase())
        {
            return abbr.to_string();
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_and_abbreviation_agree() {
        assert_eq!(canonical_team("Kansas City Chiefs"), "KC");
        assert_eq!(canonical_team("kc"), "KC");
        assert_eq!(canonical_team("  Chiefs "), "KC");
    }

    #[test]
    fn historical_aliases_resolve() {
        assert_eq!(canonical_team("OAK"), "LV");
        assert_eq!(canonical_team("WSH"), "WAS");
        assert_eq!(canonical_team("JAC"), "JAX");
    }

    #[test]
    fn unknown_team_is_folded_not_dropped() {
        assert_eq!(canonical_team("London  Monarchs"), "london monarchs");
    }

    #[test]
    fn fold_collapses_whitespace_and_case() {
        assert_eq!(fold("  Amon-Ra   St. Brown "), "amon-ra st. brown");
    }
}
