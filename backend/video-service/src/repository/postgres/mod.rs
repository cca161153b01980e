mod accounts;
mod subscriptions;
mod videos;

pub use accounts::PgAccountRepository;
pub use subscriptions::PgSubscriptionRepository;
pub use videos::PgVideoRepository;
