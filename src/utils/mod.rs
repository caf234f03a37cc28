pub mod text;
pub mod time;

pub use text::normalize_symbol;
pub use time::current_utc_timestamp;
