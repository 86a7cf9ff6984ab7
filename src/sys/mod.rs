pub mod dispatch;
pub mod skylight;
pub mod user_defaults;
