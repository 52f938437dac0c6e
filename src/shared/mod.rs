pub mod geo;
pub mod time;

pub use geo::Coordinate;
pub use time::{Minutes, Weekday, MINUTES_PER_DAY, MINUTES_PER_WEEK};
