//! Fixed-schedule trip views shared with the outer transit search.

mod schedule;

pub use schedule::{TripPattern, TripPatternForDates, TripPatternWithOffset, TripSchedule, TripTimes};
