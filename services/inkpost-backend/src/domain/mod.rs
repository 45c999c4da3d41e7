pub mod dispatch;
pub mod new_subscription;
pub mod ports;
pub mod post_meta;
pub mod subscriber_email;
pub mod subscription;

pub use dispatch::{DispatchFailure, DispatchOutcome};
pub use new_subscription::{NewSubscription, SubscriptionRequest};
pub use post_meta::PostMeta;
pub use subscriber_email::SubscriberEmail;
pub use subscription::{Subscription, SubscriptionStatus};
