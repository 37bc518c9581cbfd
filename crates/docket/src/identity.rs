//! User and group name resolution.

use docket_common::{DocketError, DocketResult};
use docket_oci::runtime::User;

/// Resolves user and group names to numeric IDs.
pub trait IdentityResolver {
    /// Look up a user by name, returning its UID and primary GID.
    fn lookup_user(&self, name: &str) -> DocketResult<(u32, u32)>;

    /// Look up a group by name.
    fn lookup_group(&self, name: &str) -> DocketResult<u32>;
}

/// Resolver backed by the host's user and group databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl IdentityResolver for SystemIdentity {
    fn lookup_user(&self, name: &str) -> DocketResult<(u32, u32)> {
        let user = nix::unistd::User::from_name(name)
            .map_err(|e| DocketError::lookup("user", name, e.to_string()))?
            .ok_or_else(|| DocketError::lookup("user", name, "no such user"))?;
        Ok((user.uid.as_raw(), user.gid.as_raw()))
    }

    fn lookup_group(&self, name: &str) -> DocketResult<u32> {
        let group = nix::unistd::Group::from_name(name)
            .map_err(|e| DocketError::lookup("group", name, e.to_string()))?
            .ok_or_else(|| DocketError::lookup("group", name, "no such group"))?;
        Ok(group.gid.as_raw())
    }
}

/// Resolve a group given by name or number.
///
/// # Errors
///
/// Returns [`DocketError::LookupFailure`] when a named group does not exist.
pub fn resolve_group(resolver: &dyn IdentityResolver, group: &str) -> DocketResult<u32> {
    match group.parse::<u32>() {
        Ok(gid) => Ok(gid),
        Err(_) => resolver.lookup_group(group),
    }
}

/// Resolve the container's primary user.
///
/// Accepts `user`, `uid`, `user:group` and `uid:gid`. Numeric parts are used
/// as-is. A name that cannot be resolved is logged and replaced by `0`, so a
/// missing account never fails the translation.
#[must_use]
pub fn resolve_user(resolver: &dyn IdentityResolver, spec: &str) -> User {
    if spec.is_empty() {
        return User::default();
    }

    let (user_part, group_part) = match spec.split_once(':') {
        Some((user, group)) => (user, Some(group)),
        None => (spec, None),
    };

    let (uid, mut gid) = match user_part.parse::<u32>() {
        Ok(uid) => (uid, 0),
        Err(_) => resolver.lookup_user(user_part).unwrap_or_else(|e| {
            tracing::warn!(user = %user_part, error = %e, "User lookup failed, falling back to root");
            (0, 0)
        }),
    };

    if let Some(group) = group_part.filter(|g| !g.is_empty()) {
        match resolve_group(resolver, group) {
            Ok(resolved) => gid = resolved,
            Err(e) => {
                tracing::warn!(group = %group, error = %e, "Group lookup failed, keeping primary group");
            }
        }
    }

    User {
        uid,
        gid,
        ..User::default()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixed identity table for tests.

    use std::collections::HashMap;

    use super::{DocketError, DocketResult, IdentityResolver};

    #[derive(Debug, Default)]
    pub struct StaticIdentity {
        users: HashMap<String, (u32, u32)>,
        groups: HashMap<String, u32>,
    }

    impl StaticIdentity {
        pub fn user(mut self, name: &str, uid: u32, gid: u32) -> Self {
            self.users.insert(name.to_string(), (uid, gid));
            self
        }

        pub fn group(mut self, name: &str, gid: u32) -> Self {
            self.groups.insert(name.to_string(), gid);
            self
        }
    }

    impl IdentityResolver for StaticIdentity {
        fn lookup_user(&self, name: &str) -> DocketResult<(u32, u32)> {
            self.users
                .get(name)
                .copied()
                .ok_or_else(|| DocketError::lookup("user", name, "no such user"))
        }

        fn lookup_group(&self, name: &str) -> DocketResult<u32> {
            self.groups
                .get(name)
                .copied()
                .ok_or_else(|| DocketError::lookup("group", name, "no such group"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticIdentity;
    use super::*;

    fn identity() -> StaticIdentity {
        StaticIdentity::default()
            .user("tor", 105, 110)
            .group("audio", 29)
    }

    #[test]
    fn numeric_user_passes_through() {
        let user = resolve_user(&identity(), "1000:1001");
        assert_eq!((user.uid, user.gid), (1000, 1001));

        let user = resolve_user(&identity(), "42");
        assert_eq!((user.uid, user.gid), (42, 0));
    }

    #[test]
    fn named_user_is_looked_up() {
        let user = resolve_user(&identity(), "tor");
        assert_eq!((user.uid, user.gid), (105, 110));

        let user = resolve_user(&identity(), "tor:audio");
        assert_eq!((user.uid, user.gid), (105, 29));
    }

    #[test]
    fn unknown_user_falls_back() {
        let user = resolve_user(&identity(), "ghost");
        assert_eq!((user.uid, user.gid), (0, 0));

        let user = resolve_user(&identity(), "tor:nogroup");
        assert_eq!((user.uid, user.gid), (105, 110));
    }

    #[test]
    fn group_resolution() {
        assert_eq!(resolve_group(&identity(), "audio").unwrap(), 29);
        assert_eq!(resolve_group(&identity(), "1234").unwrap(), 1234);
        assert!(matches!(
            resolve_group(&identity(), "video"),
            Err(DocketError::LookupFailure { .. })
        ));
    }

    #[test]
    fn system_identity_resolves_root() {
        let Ok((uid, _)) = SystemIdentity.lookup_user("root") else {
            return;
        };
        assert_eq!(uid, 0);
    }
}
