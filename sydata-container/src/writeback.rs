//! Link-or-copy writeback shared by every container.
//!
//! Each element is first offered a link into the target. If it declines,
//! a child of the element's type is created and the element writes itself
//! into it in full.

use std::fmt::Display;

use sydata_result::Result;
use sydata_types::TypeTag;

use crate::container::Container;
use crate::slot::{Slot, load};
use crate::source::SourceRef;

/// How the target relates to the container's own datasource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The target is the container's own datasource.
    InPlace,
    /// Same file, different object.
    SameOrigin,
    Foreign,
}

pub(crate) fn placement(source: Option<&SourceRef>, target: &SourceRef) -> Placement {
    match source {
        Some(s) if s.identity() == target.identity() => Placement::InPlace,
        Some(s) if s.shares_origin(target.as_ref()) => Placement::SameOrigin,
        _ => Placement::Foreign,
    }
}

#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub(crate) linked: usize,
    pub(crate) copied: usize,
    pub(crate) kept: usize,
}

/// Store `value` under `key` of `target`, linking when possible.
pub(crate) fn write_element(
    value: &mut Container,
    target: &SourceRef,
    key: &str,
    tag: &TypeTag,
    tally: &mut Tally,
) -> Result<()> {
    if value.writeback(target, Some(key))? {
        tally.linked += 1;
        return Ok(());
    }
    // Replacing the child would drop data the value still reads from.
    if value
        .datasource()
        .is_some_and(|s| s.identity() == target.child_identity(key))
    {
        value.detach()?;
    }
    let child = target.write_with_type(key, tag)?;
    value.writeback(&child, None)?;
    tally.copied += 1;
    Ok(())
}

/// Write one slot under `key`.
///
/// In place, slots that still mirror the datasource are kept. When the
/// target shares the file, unread slots are written without being cached.
pub(crate) fn write_slot<K: Display>(
    slot: &mut Slot<K>,
    source: Option<&SourceRef>,
    target: &SourceRef,
    key: &str,
    tag: &TypeTag,
    placement: Placement,
    tally: &mut Tally,
) -> Result<()> {
    match (placement, slot) {
        (Placement::InPlace, Slot::Unmaterialized(_) | Slot::Materialized(_)) => {
            tally.kept += 1;
            Ok(())
        }
        (Placement::SameOrigin, Slot::Unmaterialized(from)) => {
            let mut value = load(source, &from.to_string(), tag)?;
            write_element(&mut value, target, key, tag, tally)
        }
        (_, slot) => {
            let value = slot.materialize(source, tag)?;
            write_element(value, target, key, tag, tally)
        }
    }
}
