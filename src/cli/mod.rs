pub mod run;
pub mod tui;
