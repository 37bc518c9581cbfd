//! User namespace UID/GID mappings.
//!
//! Supplementary groups have to keep their host GID inside a remapped
//! container, otherwise files owned by the group on the host stay
//! inaccessible. Each such GID is carved out of the range that contains it
//! and mapped to itself:
//!
//! ```text
//! (c, h, size) with c <= gid < c + size
//!   => (c, h, gid - c)                              before
//!      (gid, gid, 1)                                singleton
//!      (gid + 1, h + (gid - c) + 1, size - (gid - c) - 1)   after
//! ```
//!
//! Before and after portions of size zero are dropped, so a GID at either
//! edge of a range never produces an empty mapping. A GID outside every
//! range leaves the list untouched, and splitting on a GID that is already
//! a singleton changes nothing.

use docket_common::DocketResult;
use docket_oci::runtime::IdMapping;

use crate::identity::{IdentityResolver, resolve_group};

/// Host ID range used for user namespace remapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdRange {
    /// First host ID; container ID 0 maps here.
    pub root: u32,
    /// Number of IDs in the range.
    pub len: u32,
}

impl IdRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(root: u32, len: u32) -> Self {
        Self { root, len }
    }

    /// Whether the range remaps anything.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.len > 0
    }

    /// Mapping list for this range.
    #[must_use]
    pub fn mappings(&self) -> Vec<IdMapping> {
        if self.is_enabled() {
            vec![IdMapping::new(0, self.root, self.len)]
        } else {
            Vec::new()
        }
    }
}

/// Carve a 1:1 mapping for `gid` out of the range containing it.
#[must_use]
pub fn split_for_gid(mappings: &[IdMapping], gid: u32) -> Vec<IdMapping> {
    let mut split = Vec::with_capacity(mappings.len() + 2);

    for &mapping in mappings {
        if !mapping.contains(gid) {
            split.push(mapping);
            continue;
        }

        let offset = gid - mapping.container_id;
        if offset > 0 {
            split.push(IdMapping::new(mapping.container_id, mapping.host_id, offset));
        }

        split.push(IdMapping::new(gid, gid, 1));

        let remaining = mapping.size - offset - 1;
        if remaining > 0 {
            match (gid.checked_add(1), mapping.host_id.checked_add(offset + 1)) {
                (Some(container_id), Some(host_id)) => {
                    split.push(IdMapping::new(container_id, host_id, remaining));
                }
                _ => {
                    tracing::warn!(gid, ?mapping, "Mapping tail overflows the ID space, dropping it");
                }
            }
        }
    }

    split
}

/// Split `mappings` once per GID, in order.
///
/// Each pass works on the output of the previous one, so later GIDs may
/// land in ranges produced by earlier splits.
#[must_use]
pub fn split_for_gids(mappings: Vec<IdMapping>, gids: &[u32]) -> Vec<IdMapping> {
    gids.iter().fold(mappings, |mappings, &gid| {
        tracing::debug!(gid, "Splitting GID mappings for supplementary group");
        split_for_gid(&mappings, gid)
    })
}

/// Resolve `groups` by name or number, then split `mappings` for each.
///
/// # Errors
///
/// Returns [`docket_common::DocketError::LookupFailure`] for a group name
/// that cannot be resolved.
pub fn split_for_groups(
    mappings: Vec<IdMapping>,
    groups: &[String],
    resolver: &dyn IdentityResolver,
) -> DocketResult<Vec<IdMapping>> {
    let gids = groups
        .iter()
        .map(|group| resolve_group(resolver, group))
        .collect::<DocketResult<Vec<u32>>>()?;
    Ok(split_for_gids(mappings, &gids))
}
