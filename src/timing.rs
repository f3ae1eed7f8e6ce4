//! Per-stage timing samples and their min/max/mean summary.
//!
//! Timings are diagnostics only; they are logged at the end of a run and never
//! written to the output file.

use itertools::{Itertools, MinMaxResult};
use std::time::Duration;
use tracing::info;

/// Stage durations for one processed article.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingSample {
    /// HTTP fetch, retries included.
    pub fetch: Duration,
    /// Markup parsing into a document tree.
    pub parse: Duration,
    /// Field extraction from the parsed tree.
    pub extract: Duration,
}

/// Summary of one stage across all samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageStats {
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
}

impl StageStats {
    /// `None` when there are no samples.
    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        let (min, max) = match durations.iter().copied().minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(d) => (d, d),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let total: Duration = durations.iter().sum();
        let mean = total / durations.len() as u32;
        Some(Self { min, max, mean })
    }
}

/// Accumulated samples, appended to by the dispatcher's coordinator only.
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    fetch: Vec<Duration>,
    parse: Vec<Duration>,
    extract: Vec<Duration>,
}

impl StageTimings {
    pub fn push(&mut self, sample: TimingSample) {
        self.fetch.push(sample.fetch);
        self.parse.push(sample.parse);
        self.extract.push(sample.extract);
    }

    pub fn len(&self) -> usize {
        self.fetch.len()
    }

    pub fn fetch(&self) -> Option<StageStats> {
        StageStats::from_durations(&self.fetch)
    }

    pub fn parse(&self) -> Option<StageStats> {
        StageStats::from_durations(&self.parse)
    }

    pub fn extract(&self) -> Option<StageStats> {
        StageStats::from_durations(&self.extract)
    }

    /// Log the min/max/avg table, one line per stage.
    pub fn log_summary(&self) {
        if self.len() == 0 {
            info!("No timing samples collected");
            return;
        }
        for (stage, stats) in [
            ("fetch", self.fetch()),
            ("parse", self.parse()),
            ("extract", self.extract()),
        ] {
            if let Some(s) = stats {
                info!(
                    stage,
                    samples = self.len(),
                    min_secs = s.min.as_secs_f64(),
                    max_secs = s.max.as_secs_f64(),
                    avg_secs = s.mean.as_secs_f64(),
                    "Stage timing"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(StageStats::from_durations(&[]), None);
        assert_eq!(StageTimings::default().fetch(), None);
    }

    #[test]
    fn test_stats_single_sample() {
        let stats = StageStats::from_durations(&[ms(40)]).unwrap();
        assert_eq!(stats.min, ms(40));
        assert_eq!(stats.max, ms(40));
        assert_eq!(stats.mean, ms(40));
    }

    #[test]
    fn test_stage_timings_aggregate_per_stage() {
        let mut timings = StageTimings::default();
        timings.push(TimingSample {
            fetch: ms(100),
            parse: ms(10),
            extract: ms(2),
        });
        timings.push(TimingSample {
            fetch: ms(300),
            parse: ms(30),
            extract: ms(4),
        });
        timings.push(TimingSample {
            fetch: ms(200),
            parse: ms(20),
            extract: ms(6),
        });

        assert_eq!(timings.len(), 3);
        let fetch = timings.fetch().unwrap();
        assert_eq!((fetch.min, fetch.max, fetch.mean), (ms(100), ms(300), ms(200)));
        let parse = timings.parse().unwrap();
        assert_eq!((parse.min, parse.max, parse.mean), (ms(10), ms(30), ms(20)));
        let extract = timings.extract().unwrap();
        assert_eq!((extract.min, extract.max, extract.mean), (ms(2), ms(6), ms(4)));
    }
}
