//! Month grid of daily PnL, one row per week (Monday first).

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::errors::ValidationError;
use crate::domain::services::statistics::DailyPnl;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    /// `None` when nothing was booked that day
    pub pnl: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Seven slots per week; `None` pads days outside the month
    pub weeks: Vec<[Option<CalendarDay>; 7]>,
    pub month_pnl: f64,
    pub trading_days: usize,
}

pub fn calendar_month(daily: &[DailyPnl], year: i32, month: u32) -> Result<CalendarMonth, ValidationError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ValidationError::InvalidDate(format!("{}-{:02} is not a valid month", year, month))
    })?;

    let by_date: HashMap<NaiveDate, f64> = daily
        .iter()
        .filter(|d| d.date.year() == year && d.date.month() == month)
        .map(|d| (d.date, d.pnl))
        .collect();

    let mut weeks = Vec::new();
    let mut week: [Option<CalendarDay>; 7] = [None; 7];
    let mut current = Some(first);

    while let Some(date) = current.filter(|d| d.month() == month) {
        let slot = date.weekday().num_days_from_monday() as usize;
        week[slot] = Some(CalendarDay {
            day: date.day(),
            pnl: by_date.get(&date).copied(),
        });
        if slot == 6 {
            weeks.push(week);
            week = [None; 7];
        }
        current = date.checked_add_days(Days::new(1));
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }

    Ok(CalendarMonth {
        year,
        month,
        weeks,
        month_pnl: by_date.values().sum(),
        trading_days: by_date.len(),
    })
}
