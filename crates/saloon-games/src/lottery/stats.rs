//! Lottery statistics.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use saloon_core::{DailyPick, Participant, ParticipantId};

use super::Lottery;
use crate::error::{GameResult, ValidationError};

const LEADERBOARD_SIZE: usize = 10;

/// First year the lottery ran.
const FIRST_YEAR: i32 = 2019;

fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
    ))
}

/// Winners ordered by pick count, most first; ties by participant id.
fn tally(picks: &[DailyPick]) -> Vec<(ParticipantId, usize)> {
    let mut counts: HashMap<ParticipantId, usize> = HashMap::new();
    for pick in picks {
        *counts.entry(pick.winner).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

impl Lottery {
    pub async fn personal(&self, participant: &Participant) -> GameResult<String> {
        let s = &self.services;
        let year = s.clock.today().year();
        let (from, until) = year_bounds(year).ok_or(ValidationError::InvalidYear(year))?;
        let mine = |picks: Vec<DailyPick>| {
            picks
                .iter()
                .filter(|p| p.winner == participant.id)
                .count()
        };
        let this_year = mine(s.store.picks_between(from, until).await?);
        let all_time = mine(s.store.picks_between(NaiveDate::MIN, NaiveDate::MAX).await?);
        Ok(format!(
            "This year you were the winner of the day {this_year} times!\nAll time you were the winner of the day {all_time} times!"
        ))
    }

    pub async fn leaderboard(&self, year: Option<i32>) -> GameResult<String> {
        let s = &self.services;
        let (title, picks) = match year {
            Some(year) => {
                // Only finished years have their own board; anything else
                // shows the current year.
                let current = s.clock.today().year();
                let year = if (FIRST_YEAR..current).contains(&year) {
                    year
                } else {
                    current
                };
                let (from, until) =
                    year_bounds(year).ok_or(ValidationError::InvalidYear(year))?;
                (
                    format!("Top 10 winners of {year}:"),
                    s.store.picks_between(from, until).await?,
                )
            }
            None => (
                "Top 10 winners of all time:".to_string(),
                s.store.picks_between(NaiveDate::MIN, NaiveDate::MAX).await?,
            ),
        };

        let mut text = format!("{title}\n\n");
        for (rank, (id, count)) in tally(&picks).into_iter().take(LEADERBOARD_SIZE).enumerate() {
            let name = self.participant(id).await?.display_name();
            text.push_str(&format!("{}. {name} - {count} time(s)\n", rank + 1));
        }
        let total = s.store.pool().await?.len();
        text.push_str(&format!("\nTotal participants: {total}"));
        Ok(text)
    }

    pub fn rules(&self) -> &'static str {
        super::rules()
    }
}
