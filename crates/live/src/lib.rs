mod config;
mod health;
mod subscription;

pub use self::config::SubscribeConfig;
pub use self::health::Health;
pub use self::subscription::{
    hash_rows, subscribe, LiveEvent, QuerySource, StoreSource, SubscriptionHandle,
};
