//! Account service implementing signup and profile lookup.
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    IndexQuery, KeyValueStore, KeyValueStoreError, SecondaryIndex, UserAccounts,
};
use crate::domain::records::{Table, UserRecord};
use crate::domain::service_support::{decode, encode, map_store_error};
use crate::domain::{Error, Registration, User, UserId, UserProfile};

/// Accounts backed by the auth table.
#[derive(Clone)]
pub struct AccountService<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ?Sized> AccountService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl<S: ?Sized> UserAccounts for AccountService<S>
where
    S: KeyValueStore,
{
    async fn register(&self, registration: Registration) -> Result<UserId, Error> {
        let user = User {
            id: UserId::random(),
            email: registration.email,
            display_name: registration.display_name,
            created_date: self.clock.utc(),
            verified: false,
        };
        let item = encode(&UserRecord::from_user(&user))?;
        match self.store.put_if_absent(Table::Auth, item).await {
            Ok(()) => {}
            Err(KeyValueStoreError::ConditionFailed { .. }) => {
                return Err(Error::conflict("an account already exists for this email"));
            }
            Err(err) => return Err(map_store_error(err)),
        }
        info!(user_id = %user.id, "user registered");
        Ok(user.id)
    }

    async fn profile(&self, user_id: &UserId) -> Result<UserProfile, Error> {
        let query = IndexQuery::new(SecondaryIndex::Gsi1, user_id.to_string()).with_limit(1);
        let page = self
            .store
            .query(Table::Auth, query)
            .await
            .map_err(map_store_error)?;
        let Some(item) = page.items.into_iter().next() else {
            return Err(Error::not_found("user not found"));
        };
        let user = decode::<UserRecord>(item)?
            .into_user()
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(UserProfile::from(&user))
    }
}
