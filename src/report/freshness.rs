//! Commit recency → color weight.

use chrono::NaiveDate;

/// Start of recorded history (the CVS → Mercurial migration).
pub fn history_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2007, 3, 22).unwrap_or_default()
}

/// Maps commit dates to a score in `[0, 1]`: 0 at the epoch, 1 today.
#[derive(Debug, Clone, Copy)]
pub struct Freshness {
    epoch: NaiveDate,
    today: NaiveDate,
}

impl Freshness {
    pub fn new(epoch: NaiveDate, today: NaiveDate) -> Self {
        Self { epoch, today }
    }

    pub fn as_of(today: NaiveDate) -> Self {
        Self::new(history_epoch(), today)
    }

    pub fn today() -> Self {
        Self::as_of(chrono::Local::now().date_naive())
    }

    /// Cubed so that recent changes stand out from the long tail.
    pub fn score(&self, date: NaiveDate) -> f64 {
        let span = (self.today - self.epoch).num_days();
        if span <= 0 {
            return if date >= self.today { 1.0 } else { 0.0 };
        }
        let fraction = (date - self.epoch).num_days() as f64 / span as f64;
        fraction.clamp(0.0, 1.0).powi(3)
    }
}

/// Background color for a line: white for old code, mid green for new.
pub fn line_color(score: f64) -> String {
    let lightness = (100.0 - score * 50.0) as u32;
    format!("hsl(120, 100%, {}%)", lightness)
}

/// Terminal bar, one star per tenth of freshness, padded to 10 columns.
pub fn age_stars(score: f64) -> String {
    let stars = (score * 10.0).round() as usize;
    format!("{:<10}", "*".repeat(stars))
}
