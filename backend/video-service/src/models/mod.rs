pub mod account;
pub mod profile;
pub mod subscription;

pub use account::{Account, AccountView, Identity, MediaSlot, NewAccount, ReplacedMedia};
pub use profile::ChannelProfile;
pub use subscription::{SubscriberEntry, SubscriptionEdge, ToggleOutcome};
