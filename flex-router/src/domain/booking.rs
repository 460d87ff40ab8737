//! Booking rules for call-ahead service.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::FeedScopedId;

/// How far ahead a ride must be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookingType {
    /// Bookable up until departure.
    #[default]
    RealTime,
    /// Must be booked earlier on the same day.
    SameDay,
    /// Must be booked one or more days ahead.
    PriorDays,
}

/// Booking information attached to a stop-time row.
///
/// This is descriptive data for the rider; it does not constrain feasibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRule {
    pub id: FeedScopedId,
    #[serde(default)]
    pub booking_type: BookingType,
    /// Minimum notice in minutes (same-day bookings)
    #[serde(default)]
    pub prior_notice_duration_min: Option<i32>,
    /// Maximum notice in minutes (same-day bookings)
    #[serde(default)]
    pub prior_notice_duration_max: Option<i32>,
    #[serde(default)]
    pub prior_notice_last_day: Option<i32>,
    /// Seconds since midnight on the last booking day
    #[serde(default)]
    pub prior_notice_last_time: Option<i32>,
    #[serde(default)]
    pub prior_notice_start_day: Option<i32>,
    #[serde(default)]
    pub prior_notice_start_time: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pickup_message: Option<String>,
    #[serde(default)]
    pub drop_off_message: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub info_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl BookingRule {
    /// Creates a real-time booking rule with no notice requirements.
    pub fn new(id: FeedScopedId) -> Self {
        Self {
            id,
            booking_type: BookingType::RealTime,
            prior_notice_duration_min: None,
            prior_notice_duration_max: None,
            prior_notice_last_day: None,
            prior_notice_last_time: None,
            prior_notice_start_day: None,
            prior_notice_start_time: None,
            message: None,
            pickup_message: None,
            drop_off_message: None,
            phone_number: None,
            info_url: None,
            url: None,
        }
    }

    /// Minimum booking notice, if the rule sets one.
    pub fn prior_notice_min(&self) -> Option<Duration> {
        self.prior_notice_duration_min
            .map(|mins| Duration::minutes(mins as i64))
    }

    /// Maximum booking notice, if the rule sets one.
    pub fn prior_notice_max(&self) -> Option<Duration> {
        self.prior_notice_duration_max
            .map(|mins| Duration::minutes(mins as i64))
    }

    /// Returns true if the ride must be booked on an earlier day.
    pub fn requires_prior_day(&self) -> bool {
        self.booking_type == BookingType::PriorDays
    }
}
