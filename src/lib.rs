pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod invite;
pub mod mail;
pub mod models;
pub mod redis;
pub mod reply;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use invite::InvitationDispatcher;
pub use reply::ReplyAddressCodec;
pub use state::AppState;
