pub mod app;
pub mod audio;
pub mod cli;
pub mod graphics;
pub mod input;
pub mod manipulation;
pub mod math;
pub mod sleeve;
pub mod state;
pub mod terminal;
pub mod time;
pub mod visuals;
pub mod widget;

pub use app::run;
