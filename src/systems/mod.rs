mod attrition;
mod round_timer;

pub use attrition::AttritionSystem;
pub use round_timer::RoundTimerSystem;
