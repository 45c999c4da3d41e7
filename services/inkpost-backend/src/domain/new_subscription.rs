use serde::{Deserialize, Serialize};

use crate::domain::SubscriberEmail;

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub email: SubscriberEmail,
}

impl TryFrom<SubscriptionRequest> for NewSubscription {
    type Error = String;

    fn try_from(request: SubscriptionRequest) -> Result<Self, Self::Error> {
        let SubscriptionRequest { email } = request;

        let email = SubscriberEmail::try_from(email)?;

        Ok(NewSubscription { email })
    }
}

/// This is the information sent by the user to request a subscription.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SubscriptionRequest {
    pub email: String,
}
