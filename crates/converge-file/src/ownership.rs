//! Owner and group lookup
//!
//! Identity strings are resolved against the host user/group database. A
//! string that names no user but parses as an integer is taken as a raw id.

use converge_core::ConvergeError;
use nix::unistd::{Gid, Group, Uid, User};

/// Resolve an owner name (or numeric uid)
///
/// # Errors
/// Returns [`ConvergeError::UnknownOwner`] if neither lookup succeeds
pub fn resolve_owner(name: &str) -> Result<Uid, ConvergeError> {
    match User::from_name(name) {
        Ok(Some(user)) => Ok(user.uid),
        Ok(None) => name
            .parse::<u32>()
            .map(Uid::from_raw)
            .map_err(|_| ConvergeError::UnknownOwner(name.to_string())),
        Err(errno) => {
            tracing::warn!(owner = name, %errno, "user database lookup failed");
            Err(ConvergeError::UnknownOwner(name.to_string()))
        }
    }
}

/// Resolve a group name (or numeric gid)
///
/// # Errors
/// Returns [`ConvergeError::UnknownGroup`] if neither lookup succeeds
pub fn resolve_group(name: &str) -> Result<Gid, ConvergeError> {
    match Group::from_name(name) {
        Ok(Some(group)) => Ok(group.gid),
        Ok(None) => name
            .parse::<u32>()
            .map(Gid::from_raw)
            .map_err(|_| ConvergeError::UnknownGroup(name.to_string())),
        Err(errno) => {
            tracing::warn!(group = name, %errno, "group database lookup failed");
            Err(ConvergeError::UnknownGroup(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_by_name() {
        assert_eq!(resolve_owner("root").unwrap(), Uid::from_raw(0));
    }

    #[test]
    fn numeric_ids_fall_back() {
        assert_eq!(resolve_owner("4242").unwrap(), Uid::from_raw(4242));
        assert_eq!(resolve_group("4242").unwrap(), Gid::from_raw(4242));
    }

    #[test]
    fn unknown_names_are_errors() {
        let err = resolve_owner("no-such-user-for-converge").unwrap_err();
        assert!(matches!(err, ConvergeError::UnknownOwner(name) if name == "no-such-user-for-converge"));
        let err = resolve_group("no-such-group-for-converge").unwrap_err();
        assert!(matches!(err, ConvergeError::UnknownGroup(_)));
    }
}
