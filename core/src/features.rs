//! Calendar and seasonal features for a prediction date.
//!
//! Each seasonal flag is a half-month window over (month, day):
//!
//!   womens_day      Mar 1-15
//!   mothers_day     Apr 16 - May 15
//!   valentines_day  May 16 - Jun 15
//!   black_friday    Nov 16-30
//!   christmas       Dec 1-15
//!
//! The windows never overlap, so at most one flag is set for any date.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonalFeatures {
    pub year:                i32,
    pub month:               u32,
    pub is_womens_day:       bool,
    pub is_mothers_day:      bool,
    pub is_valentines_day:   bool,
    pub is_black_friday:     bool,
    pub is_christmas_window: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalWindow {
    WomensDay,
    MothersDay,
    ValentinesDay,
    BlackFriday,
    Christmas,
}

pub fn derive_features(date: NaiveDate) -> SeasonalFeatures {
    let (month, day) = (date.month(), date.day());
    SeasonalFeatures {
        year:                date.year(),
        month,
        is_womens_day:       month == 3 && day <= 15,
        is_mothers_day:      (month == 4 && day > 15) || (month == 5 && day <= 15),
        is_valentines_day:   (month == 5 && day > 15) || (month == 6 && day <= 15),
        is_black_friday:     month == 11 && day > 15,
        is_christmas_window: month == 12 && day <= 15,
    }
}

impl SeasonalFeatures {
    pub fn active_flags(&self) -> usize {
        [
            self.is_womens_day,
            self.is_mothers_day,
            self.is_valentines_day,
            self.is_black_friday,
            self.is_christmas_window,
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }

    pub fn active_window(&self) -> Option<SeasonalWindow> {
        if self.is_womens_day {
            Some(SeasonalWindow::WomensDay)
        } else if self.is_mothers_day {
            Some(SeasonalWindow::MothersDay)
        } else if self.is_valentines_day {
            Some(SeasonalWindow::ValentinesDay)
        } else if self.is_black_friday {
            Some(SeasonalWindow::BlackFriday)
        } else if self.is_christmas_window {
            Some(SeasonalWindow::Christmas)
        } else {
            None
        }
    }

    /// Model column names and values, in a fixed order.
    pub fn columns(&self) -> [(&'static str, f64); 7] {
        [
            ("ANO", self.year as f64),
            ("MES", self.month as f64),
            ("eh_dia_mulher", flag(self.is_womens_day)),
            ("eh_dia_maes", flag(self.is_mothers_day)),
            ("eh_dia_namorados", flag(self.is_valentines_day)),
            ("eh_black_friday", flag(self.is_black_friday)),
            ("eh_natal", flag(self.is_christmas_window)),
        ]
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// The 15-day forecast period starting today (today + 14 days, inclusive).
pub fn forecast_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(14))
}
