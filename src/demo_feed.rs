use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::fixture::{Fixture, FixtureStatus};
use crate::ingest::MatchSource;
use crate::league::League;
use crate::match_record::MatchRecord;

/// Offline stand-in for the sports API: a seeded double round-robin per
/// league plus a handful of fixtures around "today".
pub struct DemoSource {
    seed: u64,
    today: NaiveDate,
}

impl DemoSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            today: Utc::now().date_naive(),
        }
    }

    pub fn with_today(seed: u64, today: NaiveDate) -> Self {
        Self { seed, today }
    }

    fn rng_for(&self, league: League, salt: u64) -> StdRng {
        let idx = League::ALL.iter().position(|l| *l == league).unwrap_or(0) as u64;
        StdRng::seed_from_u64(self.seed ^ (idx << 32) ^ salt)
    }
}

impl MatchSource for DemoSource {
    fn finished_matches(&self, league: League) -> Result<Vec<MatchRecord>> {
        let mut rng = self.rng_for(league, 0x5eed);
        Ok(synthetic_history(&mut rng, demo_teams(league), self.today))
    }

    fn upcoming_fixtures(&self, league: League) -> Result<Vec<Fixture>> {
        let mut rng = self.rng_for(league, 0xf17);
        Ok(synthetic_fixtures(&mut rng, league, self.today, false))
    }

    fn live_fixtures(&self, league: League) -> Result<Vec<Fixture>> {
        let mut rng = self.rng_for(league, 0x11fe);
        Ok(synthetic_fixtures(&mut rng, league, self.today, true))
    }
}

/// Double round-robin ending the day before `until`, one round a week.
pub fn synthetic_history(rng: &mut impl Rng, teams: &[&str], until: NaiveDate) -> Vec<MatchRecord> {
    let n = teams.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1));
    for (h, home) in teams.iter().enumerate() {
        for (a, away) in teams.iter().enumerate() {
            if h != a {
                pairs.push((*home, *away));
            }
        }
    }
    let per_round = (n / 2).max(1);
    let rounds = pairs.len().div_ceil(per_round) as i64;
    let start = until - ChronoDuration::weeks(rounds);

    let mut out = Vec::with_capacity(pairs.len());
    for (idx, (home, away)) in pairs.into_iter().enumerate() {
        let round = (idx / per_round) as i64;
        let date = start + ChronoDuration::weeks(round) + ChronoDuration::days(rng.gen_range(0..3));
        let gh = sample_goals(rng, 1.5);
        let ga = sample_goals(rng, 1.1);
        let gh1 = first_half_share(rng, gh);
        let ga1 = first_half_share(rng, ga);
        if let Ok(record) = MatchRecord::try_new(home, away, (gh, ga), (gh1, ga1), date) {
            out.push(record);
        }
    }
    out
}

fn synthetic_fixtures(rng: &mut impl Rng, league: League, today: NaiveDate, live: bool) -> Vec<Fixture> {
    let teams = demo_teams(league);
    let mut order: Vec<usize> = (0..teams.len()).collect();
    order.shuffle(rng);
    let count = if live { 1 } else { teams.len() / 2 };
    order
        .chunks(2)
        .take(count)
        .enumerate()
        .filter_map(|(idx, pair)| {
            let [h, a] = pair else {
                return None;
            };
            let day = if live { 0 } else { 1 + idx as i64 };
            let kickoff = kickoff_on(today + ChronoDuration::days(day), 15 + (idx as u32 % 5));
            let (status, score) = if live {
                (FixtureStatus::InPlay, Some((rng.gen_range(0..3), rng.gen_range(0..3))))
            } else {
                (FixtureStatus::Timed, None)
            };
            Some(Fixture {
                id: 9_000_000 + (idx as u64) + if live { 500 } else { 0 },
                league,
                home: teams[*h].to_string(),
                away: teams[*a].to_string(),
                kickoff,
                status,
                score,
            })
        })
        .collect()
}

fn kickoff_on(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN))
}

// Inverse-CDF Poisson draw; enough for plausible scorelines.
fn sample_goals(rng: &mut impl Rng, lambda: f64) -> u32 {
    let u: f64 = rng.gen_range(0.0..1.0);
    let mut p = (-lambda).exp();
    let mut cdf = p;
    let mut k = 0u32;
    while u > cdf && k < 9 {
        k += 1;
        p *= lambda / f64::from(k);
        cdf += p;
    }
    k
}

fn first_half_share(rng: &mut impl Rng, goals: u32) -> u32 {
    (0..goals).filter(|_| rng.gen_bool(0.45)).count() as u32
}

pub fn demo_teams(league: League) -> &'static [&'static str] {
    match league {
        League::ChampionsLeague => &[
            "Real Madrid", "Manchester City", "Bayern Munich", "Inter", "Arsenal", "PSG", "Benfica", "Dortmund",
        ],
        League::Brasileirao => &[
            "Flamengo", "Palmeiras", "Corinthians", "São Paulo", "Fluminense", "Grêmio", "Internacional", "Botafogo",
        ],
        League::Bundesliga => &[
            "Bayern Munich", "Leverkusen", "Dortmund", "Leipzig", "Stuttgart", "Frankfurt", "Freiburg", "Wolfsburg",
        ],
        League::PremierLeague => &[
            "Arsenal", "Liverpool", "Manchester City", "Chelsea", "Tottenham", "Newcastle", "Aston Villa", "Brighton",
        ],
        League::Championship => &[
            "Leeds", "Sunderland", "Burnley", "Sheffield United", "Middlesbrough", "Norwich", "West Brom", "Coventry",
        ],
        League::Eredivisie => &[
            "PSV", "Feyenoord", "Ajax", "AZ", "Twente", "Utrecht", "Heerenveen", "Sparta Rotterdam",
        ],
        League::LaLiga => &[
            "Real Madrid", "Barcelona", "Atlético Madrid", "Athletic Club", "Real Sociedad", "Villarreal", "Betis", "Sevilla",
        ],
        League::PrimeiraLiga => &[
            "Benfica", "Porto", "Sporting CP", "Braga", "Vitória SC", "Famalicão", "Rio Ave", "Moreirense",
        ],
        League::SerieA => &[
            "Inter", "Milan", "Juventus", "Napoli", "Atalanta", "Roma", "Lazio", "Fiorentina",
        ],
        League::Ligue1 => &[
            "PSG", "Marseille", "Monaco", "Lille", "Lyon", "Nice", "Lens", "Rennes",
        ],
    }
}
