//! Daily bucketing of sub-daily forecast samples.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::{
    condition::Condition,
    model::ForecastDay,
    units::{round_hundredths, round_whole},
};

/// One provider sample, at whatever cadence the provider reports (3h, 1h, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: Condition,
    pub precipitation_mm: f64,
}

#[derive(Debug)]
struct Bucket {
    date: NaiveDate,
    high: f64,
    low: f64,
    condition: Condition,
    precipitation: f64,
}

impl Bucket {
    fn open(date: NaiveDate, sample: &Sample) -> Self {
        Self {
            date,
            high: sample.temperature_c,
            low: sample.temperature_c,
            condition: sample.condition,
            precipitation: sample.precipitation_mm,
        }
    }

    fn absorb(&mut self, sample: &Sample) {
        self.high = self.high.max(sample.temperature_c);
        self.low = self.low.min(sample.temperature_c);
        self.precipitation += sample.precipitation_mm;
    }

    fn finish(self) -> ForecastDay {
        ForecastDay {
            date: self.date,
            high_c: round_whole(self.high),
            low_c: round_whole(self.low),
            condition: self.condition.to_string(),
            glyph: self.condition.glyph(true).to_string(),
            precipitation_mm: round_hundredths(self.precipitation),
        }
    }
}

/// Group samples by calendar date in `tz` and summarise each day.
///
/// Days come out in the order their first sample was seen, truncated to
/// `days`. A day's condition is taken from its first sample.
pub fn aggregate_daily<Tz: TimeZone>(samples: &[Sample], days: usize, tz: &Tz) -> Vec<ForecastDay> {
    let mut buckets: Vec<Bucket> = Vec::new();

    for sample in samples {
        let date = sample.timestamp.with_timezone(tz).date_naive();

        match buckets.iter_mut().find(|b| b.date == date) {
            Some(bucket) => bucket.absorb(sample),
            None => buckets.push(Bucket::open(date, sample)),
        }
    }

    buckets.into_iter().take(days).map(Bucket::finish).collect()
}
