pub mod community;
pub mod invitation;
pub mod user;

pub use community::Community;
pub use invitation::{
    DispatchOutcome, InvitationContext, InvitationRequest, InviteRequest, InviteResponse,
    RecipientInput,
};
pub use user::{Claims, Inviter};
