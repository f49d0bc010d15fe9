//! Batch evaluation over a set of analogy queries, tallied per category.
//!
//! One bad query never aborts the batch: queries with out-of-vocabulary
//! words (or no expected answer to score against) are counted as skipped
//! and logged, and the run continues.

use chrono::{DateTime, Local};
use std::fmt;

use crate::analogy::{self, AnalogyQuery, SearchOptions};
use crate::store::VectorStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryTally {
    pub correct: usize,
    pub attempted: usize,
    pub skipped: usize,
}

impl CategoryTally {
    pub fn total(&self) -> usize {
        self.attempted + self.skipped
    }

    pub fn accuracy(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempted as f64
        }
    }
}

#[derive(Debug)]
pub struct SuiteReport {
    /// Per-category tallies in first-seen order.
    pub categories: Vec<(String, CategoryTally)>,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
}

impl SuiteReport {
    pub fn overall(&self) -> CategoryTally {
        let mut total = CategoryTally::default();
        for (_, tally) in &self.categories {
            total.correct += tally.correct;
            total.attempted += tally.attempted;
            total.skipped += tally.skipped;
        }
        total
    }
}

/// Evaluate every query and aggregate pass/fail per category.
pub fn run_suite(
    store: &VectorStore,
    queries: &[AnalogyQuery],
    opts: &SearchOptions,
) -> SuiteReport {
    let started = Local::now();
    let mut categories: Vec<(String, CategoryTally)> = Vec::new();

    for query in queries {
        let position = match categories.iter().position(|(c, _)| *c == query.category) {
            Some(p) => p,
            None => {
                categories.push((query.category.clone(), CategoryTally::default()));
                categories.len() - 1
            }
        };
        let tally = &mut categories[position].1;

        if query.expected.is_none() {
            log::warn!(
                "{}:{}::{}:? has no expected answer, skipping",
                query.a,
                query.b,
                query.c
            );
            tally.skipped += 1;
            continue;
        }

        match analogy::evaluate(store, query.clone(), opts) {
            Ok(result) => {
                tally.attempted += 1;
                if result.matched == Some(true) {
                    tally.correct += 1;
                }
            }
            Err(e) => {
                log::warn!(
                    "skipping {}:{}::{}:{}: {e}",
                    query.a,
                    query.b,
                    query.c,
                    query.expected.as_deref().unwrap_or("?")
                );
                tally.skipped += 1;
            }
        }
    }

    SuiteReport {
        categories,
        started,
        finished: Local::now(),
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ANALOGY TEST RESULTS")?;
        for (category, tally) in &self.categories {
            writeln!(
                f,
                "  {category} — Accuracy: {:5.2}% ({}/{}), skipped {}",
                100.0 * tally.accuracy(),
                tally.correct,
                tally.attempted,
                tally.skipped
            )?;
        }

        let overall = self.overall();
        writeln!(f)?;
        writeln!(
            f,
            "Total Accuracy: {:5.2}% ({}/{})",
            100.0 * overall.accuracy(),
            overall.correct,
            overall.attempted
        )?;
        if overall.total() > 0 {
            writeln!(
                f,
                "Questions attempted/total: {:5.2}% ({}/{})",
                100.0 * overall.attempted as f64 / overall.total() as f64,
                overall.attempted,
                overall.total()
            )?;
        }
        let elapsed = self.finished.signed_duration_since(self.started);
        write!(
            f,
            "Completed in {:.1}s",
            elapsed.num_milliseconds() as f64 / 1000.0
        )
    }
}
