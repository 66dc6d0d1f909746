mod action;
mod backend;
mod conversation;
mod error;
mod event;
mod generation_config;
mod loading;
mod message;
mod publish;
mod request;
mod session_state;
mod slash_commands;
mod textarea;
mod toast;

pub use action::*;
pub use backend::*;
pub use conversation::*;
pub use error::*;
pub use event::*;
pub use generation_config::*;
pub use loading::*;
pub use message::*;
pub use publish::*;
pub use request::*;
pub use session_state::*;
pub use slash_commands::*;
pub use textarea::*;
pub use toast::*;
