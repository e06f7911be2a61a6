//! Admin and moderator role sets.
//!
//! Both sets are mutated only by admins: admins manage admins, and admins
//! manage moderators. Bootstrap ingestion at startup bypasses the guard so a
//! fresh deployment can seed its first admin.

use std::collections::BTreeSet;
use std::sync::RwLock;

use crate::error::Error;
use crate::types::UserId;

pub trait RoleStore: Send + Sync {
    fn is_admin(&self, user: &UserId) -> Result<bool, Error>;
    fn is_moderator(&self, user: &UserId) -> Result<bool, Error>;

    /// All admins in byte order.
    fn list_admins(&self) -> Result<Vec<UserId>, Error>;
    /// All moderators in byte order.
    fn list_moderators(&self) -> Result<Vec<UserId>, Error>;

    /// Succeeds iff `caller` is an admin. An admin may remove itself; the
    /// set is allowed to empty.
    fn add_admin(&self, caller: &UserId, user: UserId) -> Result<(), Error>;
    fn remove_admin(&self, caller: &UserId, user: &UserId) -> Result<(), Error>;
    fn add_moderator(&self, caller: &UserId, user: UserId) -> Result<(), Error>;
    fn remove_moderator(&self, caller: &UserId, user: &UserId) -> Result<(), Error>;

    /// Unguarded insertion, for startup config only.
    fn bootstrap_admin(&self, user: UserId) -> Result<(), Error>;
    /// Unguarded insertion, for startup config only.
    fn bootstrap_moderator(&self, user: UserId) -> Result<(), Error>;
}

#[derive(Default)]
pub struct InMemoryRoleStore {
    admins: RwLock<BTreeSet<UserId>>,
    moderators: RwLock<BTreeSet<UserId>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_admins(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeSet<UserId>>, Error> {
        self.admins
            .read()
            .map_err(|_| Error::Internal("role store lock poisoned".into()))
    }

    fn write_guarded<'a>(
        &self,
        caller: &UserId,
        set: &'a RwLock<BTreeSet<UserId>>,
    ) -> Result<std::sync::RwLockWriteGuard<'a, BTreeSet<UserId>>, Error> {
        if !self.is_admin(caller)? {
            return Err(Error::NotAllowed);
        }
        set.write()
            .map_err(|_| Error::Internal("role store lock poisoned".into()))
    }
}

impl RoleStore for InMemoryRoleStore {
    fn is_admin(&self, user: &UserId) -> Result<bool, Error> {
        Ok(self.read_admins()?.contains(user))
    }

    fn is_moderator(&self, user: &UserId) -> Result<bool, Error> {
        Ok(self
            .moderators
            .read()
            .map_err(|_| Error::Internal("role store lock poisoned".into()))?
            .contains(user))
    }

    fn list_admins(&self) -> Result<Vec<UserId>, Error> {
        Ok(self.read_admins()?.iter().copied().collect())
    }

    fn list_moderators(&self) -> Result<Vec<UserId>, Error> {
        Ok(self
            .moderators
            .read()
            .map_err(|_| Error::Internal("role store lock poisoned".into()))?
            .iter()
            .copied()
            .collect())
    }

    fn add_admin(&self, caller: &UserId, user: UserId) -> Result<(), Error> {
        self.write_guarded(caller, &self.admins)?.insert(user);
        Ok(())
    }

    fn remove_admin(&self, caller: &UserId, user: &UserId) -> Result<(), Error> {
        self.write_guarded(caller, &self.admins)?.remove(user);
        Ok(())
    }

    fn add_moderator(&self, caller: &UserId, user: UserId) -> Result<(), Error> {
        self.write_guarded(caller, &self.moderators)?.insert(user);
        Ok(())
    }

    fn remove_moderator(&self, caller: &UserId, user: &UserId) -> Result<(), Error> {
        self.write_guarded(caller, &self.moderators)?.remove(user);
        Ok(())
    }

    fn bootstrap_admin(&self, user: UserId) -> Result<(), Error> {
        self.admins
            .write()
            .map_err(|_| Error::Internal("role store lock poisoned".into()))?
            .insert(user);
        Ok(())
    }

    fn bootstrap_moderator(&self, user: UserId) -> Result<(), Error> {
        self.moderators
            .write()
            .map_err(|_| Error::Internal("role store lock poisoned".into()))?
            .insert(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(seed: u8) -> UserId {
        UserId::from_bytes([seed; 32])
    }

    #[test]
    fn test_bootstrap_bypasses_guard() {
        let store = InMemoryRoleStore::new();
        store.bootstrap_admin(user(1)).unwrap();
        store.bootstrap_moderator(user(2)).unwrap();

        assert!(store.is_admin(&user(1)).unwrap());
        assert!(store.is_moderator(&user(2)).unwrap());
        assert!(!store.is_admin(&user(2)).unwrap());
    }

    #[test]
    fn test_non_admin_cannot_mutate() {
        let store = InMemoryRoleStore::new();
        let outsider = user(9);

        assert!(matches!(
            store.add_admin(&outsider, user(1)).unwrap_err(),
            Error::NotAllowed
        ));
        assert!(matches!(
            store.add_moderator(&outsider, user(1)).unwrap_err(),
            Error::NotAllowed
        ));
        assert!(store.list_admins().unwrap().is_empty());
    }

    #[test]
    fn test_admin_manages_both_sets() {
        let store = InMemoryRoleStore::new();
        store.bootstrap_admin(user(1)).unwrap();

        store.add_moderator(&user(1), user(2)).unwrap();
        store.add_admin(&user(1), user(3)).unwrap();
        assert!(store.is_moderator(&user(2)).unwrap());
        assert!(store.is_admin(&user(3)).unwrap());

        store.remove_moderator(&user(1), &user(2)).unwrap();
        assert!(!store.is_moderator(&user(2)).unwrap());

        // a freshly added admin has full rights
        store.remove_admin(&user(3), &user(1)).unwrap();
        assert!(!store.is_admin(&user(1)).unwrap());
    }

    #[test]
    fn test_admin_may_remove_itself() {
        let store = InMemoryRoleStore::new();
        store.bootstrap_admin(user(1)).unwrap();

        store.remove_admin(&user(1), &user(1)).unwrap();
        assert!(store.list_admins().unwrap().is_empty());
        // once the set is empty nobody can mutate it again
        assert!(matches!(
            store.add_admin(&user(1), user(1)).unwrap_err(),
            Error::NotAllowed
        ));
    }

    #[test]
    fn test_listing_is_ordered() {
        let store = InMemoryRoleStore::new();
        store.bootstrap_admin(user(3)).unwrap();
        store.bootstrap_admin(user(1)).unwrap();
        store.bootstrap_admin(user(2)).unwrap();

        assert_eq!(store.list_admins().unwrap(), vec![user(1), user(2), user(3)]);
    }
}
