//! Minute-resolution time primitives for the weekly working-time model.
//!
//! Everything in this domain is expressed in minutes since Monday 00:00, not wall-clock
//! timestamps: routing times, wait durations and opening-hour offsets are all fractional or
//! integer minute counts over a fixed 7-day week.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

pub const MINUTES_PER_DAY: i64 = 24 * 60;
pub const MINUTES_PER_WEEK: i64 = 7 * MINUTES_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Monday = 0, ..., Sunday = 6 — matches the offset used when folding a day-bucketed
    /// working-time interval into the flat weekly timeline.
    pub const fn index(self) -> i64 {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
            Weekday::Saturday => 5,
            Weekday::Sunday => 6,
        }
    }

    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];
}

/// A duration or point in time measured in minutes. Used both for elapsed travel time (can be
/// fractional, e.g. road distance / velocity) and for minute-of-week offsets (always integral
/// in practice, but kept as `f64` so it composes with travel time without conversion).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Minutes(pub f64);

impl From<f64> for Minutes {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Minutes> for f64 {
    fn from(value: Minutes) -> Self {
        value.0
    }
}

impl Add for Minutes {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Minutes {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Minutes {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Minutes {
    pub const ZERO: Minutes = Minutes(0.0);

    /// Folds an absolute minute-of-week value into `[0, MINUTES_PER_WEEK)`.
    pub fn wrap_week(self) -> Minutes {
        let weeks = (self.0 / MINUTES_PER_WEEK as f64).floor();
        Minutes(self.0 - weeks * MINUTES_PER_WEEK as f64)
    }
}

/// Converts a distance-over-speed ratio into minutes: `meters / (kmh * 1000 / 60)`.
pub fn travel_minutes(meters: f64, kmh: f64) -> Minutes {
    Minutes(meters / (kmh * 1000.0 / 60.0))
}

#[test]
fn travel_minutes_matches_spec_example() {
    // bus_velocity = 30 km/h, 1000m => 2 minutes, matching the worked example in the spec.
    let t = travel_minutes(1000.0, 30.0);
    assert!((t.0 - 2.0).abs() < 1e-9);
}

#[test]
fn wrap_week_is_identity_inside_range() {
    let t = Minutes(600.0);
    assert_eq!(t.wrap_week().0, 600.0);
}

#[test]
fn wrap_week_folds_values_past_one_week() {
    let t = Minutes(MINUTES_PER_WEEK as f64 + 600.0);
    assert_eq!(t.wrap_week().0, 600.0);
}

#[test]
fn wrap_week_folds_negative_values() {
    let t = Minutes(-10.0);
    let wrapped = t.wrap_week();
    assert!((wrapped.0 - (MINUTES_PER_WEEK as f64 - 10.0)).abs() < 1e-9);
}
