mod email_service;
mod page_source;
mod subscriber_storage;

pub use email_service::{Email, EmailService, Error as EmailError};
pub use page_source::{Error as PageError, PageSource};
pub use subscriber_storage::{Error as SubscriptionError, SubscriberPage, SubscriberStorage};

#[cfg(test)]
pub use email_service::MockEmailService;
#[cfg(test)]
pub use page_source::MockPageSource;
#[cfg(test)]
pub use subscriber_storage::MockSubscriberStorage;
