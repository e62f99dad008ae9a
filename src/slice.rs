//! Splits one search into a search per day, using the provider's `since:`/`until:` operators.
//! The days are searched one after the other and their records are concatenated.

use chrono::{Days, NaiveDate};

use crate::process::{Harvest, Interrupted, Pager, Stop};
use crate::{Error, Result};

/// One day, `[since, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

/// The days of `since..until`, `until` excluded.
#[derive(Debug, Clone)]
pub struct DayWindows {
    next: NaiveDate,
    until: NaiveDate,
}

impl DayWindows {
    pub fn new(since: NaiveDate, until: NaiveDate) -> Result<Self> {
        if since >= until {
            return Err(Error::EmptyWindow { since, until });
        }
        Ok(Self { next: since, until })
    }
}

impl Iterator for DayWindows {
    type Item = DayWindow;

    fn next(&mut self) -> Option<DayWindow> {
        if self.next >= self.until {
            return None;
        }
        let since = self.next;
        let until = since.checked_add_days(Days::new(1))?;
        self.next = until;
        Some(DayWindow { since, until })
    }
}

/// `"<term> since:YYYY-MM-DD until:YYYY-MM-DD"`
pub fn sliced_term(term: &str, window: DayWindow) -> String {
    format!(
        "{} since:{} until:{}",
        term.trim(),
        window.since.format("%Y-%m-%d"),
        window.until.format("%Y-%m-%d")
    )
}

/// Runs `pager` once per window, in order.
/// A failing window ends the whole run. The records of the windows before it are kept.
///
/// A day without posts is just an empty day: with `require_results` set, the run only fails
/// with [`Error::EmptyResult`] if no window produced a record at all.
/// The returned `stop` is the one of the last window searched.
pub async fn run_sliced(
    pager: &Pager<'_>,
    term: &str,
    windows: DayWindows,
) -> core::result::Result<Harvest, Interrupted> {
    let day_pager = pager.allowing_empty();
    let mut records = Vec::new();
    let mut fetches = 0;
    let mut stop = Stop::Exhausted;

    for window in windows {
        let day_term = sliced_term(term, window);
        tracing::info!(term = %day_term, "searching day");

        match day_pager.run(&day_term).await {
            Ok(harvest) => {
                if harvest.stop != Stop::Exhausted && harvest.stop != Stop::EmptyPage {
                    tracing::info!(term = %day_term, stop = ?harvest.stop, "day ended early");
                }
                records.extend(harvest.records);
                fetches += harvest.fetches;
                stop = harvest.stop;
            }
            Err(interrupted) => {
                records.extend(interrupted.records);
                return Err(Interrupted {
                    records,
                    fetches: fetches + interrupted.fetches,
                    error: interrupted.error,
                });
            }
        }
    }

    if records.is_empty() && pager.config().require_results {
        return Err(Interrupted {
            records,
            fetches,
            error: Error::EmptyResult(term.to_string()),
        });
    }

    Ok(Harvest {
        records,
        fetches,
        stop,
    })
}
