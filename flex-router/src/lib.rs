//! Flexible-trip routing.
//!
//! Answers, for demand-responsive transit: "Can the rider reach this flex
//! trip, and at what time does the whole door-to-door journey run?"

pub mod domain;
pub mod flex;
pub mod network;
pub mod planner;
pub mod transit;
