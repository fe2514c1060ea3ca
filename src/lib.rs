//! Battle Odds - casualty selection and outcome estimation for turn-based battles

pub mod casualty;
pub mod combat;
pub mod core;
pub mod odds;
pub mod rules;
pub mod units;
