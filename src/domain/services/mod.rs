pub mod actions;
mod accumulator;
mod app_state;
mod code_view;
pub mod events;
mod generation;
mod scroll;
mod session;
mod syntaxes;
mod themes;

pub use accumulator::*;
pub use app_state::*;
pub use code_view::*;
pub use generation::*;
pub use scroll::*;
pub use session::*;
pub use syntaxes::*;
pub use themes::*;
