use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum League {
    ChampionsLeague,
    Brasileirao,
    Bundesliga,
    PremierLeague,
    Championship,
    Eredivisie,
    LaLiga,
    PrimeiraLiga,
    SerieA,
    Ligue1,
}

impl League {
    pub const ALL: [League; 10] = [
        League::ChampionsLeague,
        League::Brasileirao,
        League::Bundesliga,
        League::PremierLeague,
        League::Championship,
        League::Eredivisie,
        League::LaLiga,
        League::PrimeiraLiga,
        League::SerieA,
        League::Ligue1,
    ];

    /// football-data.org competition code.
    pub fn code(self) -> &'static str {
        match self {
            League::ChampionsLeague => "CL",
            League::Brasileirao => "BSA",
            League::Bundesliga => "BL1",
            League::PremierLeague => "PL",
            League::Championship => "ELC",
            League::Eredivisie => "DED",
            League::LaLiga => "PD",
            League::PrimeiraLiga => "PPL",
            League::SerieA => "SA",
            League::Ligue1 => "FL1",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            League::ChampionsLeague => "Champions League",
            League::Brasileirao => "Brasileirão Série A",
            League::Bundesliga => "Bundesliga",
            League::PremierLeague => "Premier League",
            League::Championship => "Championship",
            League::Eredivisie => "Eredivisie",
            League::LaLiga => "La Liga",
            League::PrimeiraLiga => "Primeira Liga",
            League::SerieA => "Serie A",
            League::Ligue1 => "Ligue 1",
        }
    }

    pub fn from_code(raw: &str) -> Option<League> {
        let code = raw.trim();
        League::ALL
            .into_iter()
            .find(|league| league.code().eq_ignore_ascii_case(code))
    }
}

/// Parses a comma/semicolon/space separated list of codes, dropping unknown
/// entries and duplicates while keeping the first-seen order.
pub fn parse_league_codes(raw: &str) -> Vec<League> {
    let mut out = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let Some(league) = League::from_code(part) else {
            continue;
        };
        if !out.contains(&league) {
            out.push(league);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_lookup() {
        for league in League::ALL {
            assert_eq!(League::from_code(league.code()), Some(league));
        }
        assert_eq!(League::from_code(" pl "), Some(League::PremierLeague));
        assert_eq!(League::from_code("XYZ"), None);
    }

    #[test]
    fn parse_codes_dedups_and_skips_unknown() {
        let leagues = parse_league_codes("PL, bsa;PL XX  SA");
        assert_eq!(
            leagues,
            vec![League::PremierLeague, League::Brasileirao, League::SerieA]
        );
    }
}
