pub mod dispatcher;
pub mod recipient;

pub use dispatcher::{CommunityDirectory, InvitationDispatcher};
pub use recipient::{parse_recipient, split_batch, EmailValidator, SyntaxValidator};
