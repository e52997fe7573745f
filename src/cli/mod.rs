pub mod convert;
pub mod currencies;
pub mod last;
pub mod session;
pub mod setup;
pub mod ui;
