pub mod diff;
pub mod history;
pub mod key;
pub mod log;
pub mod track;
