//! # Assignment ledger
//!
//! History-aware routing of [`ObjectIdentity`] values to dataset [`Split`]s.
//!
//! ## Contract
//! -----------------
//! [`AssignmentLedger::resolve`] answers one question: *may this record of this object be
//! emitted into the split currently being generated?*
//!
//! | Ledger state for the object | Requested split | Outcome |
//! |-----------------------------|-----------------|---------|
//! | unknown                     | `S`             | bind object to `S`, **accept** |
//! | bound to `S`                | `S`             | **accept** (another camera of the same object) |
//! | bound to `T ≠ S`            | `S`             | **reject**, no state change |
//!
//! The first split that successfully claims an object owns it for the lifetime of the
//! ledger. Bindings are stored in a single map `ObjectIdentity → Split`, so an object
//! can never be a member of two splits.
//!
//! ## Duplicate tracking
//! -----------------
//! Every accepted record also registers its [`CameraIdentity`]. Seeing the same
//! `(object, camera)` pair again is reported through [`Resolution::Accepted::duplicate`];
//! the ledger does not refuse such records.
use std::collections::{HashMap, HashSet};

use ahash::RandomState;
use tracing::trace;

use crate::{
    identity::{CameraIdentity, ObjectIdentity},
    split::Split,
};

/// Outcome of [`AssignmentLedger::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The record may be emitted. `duplicate` is `true` when this exact
    /// `(object, camera)` pair had already been accepted.
    Accepted { duplicate: bool },
    /// The object belongs to `owner`; the record must be skipped.
    Rejected { owner: Split },
}

impl Resolution {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Resolution::Accepted { .. })
    }
}

/// Exclusive `object → split` bindings plus the camera-qualified sighting history.
#[derive(Debug, Clone, Default)]
pub struct AssignmentLedger {
    bindings: HashMap<ObjectIdentity, Split, RandomState>,
    sightings: HashSet<CameraIdentity, RandomState>,
}

impl AssignmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a record of `identity`, seen through `camera`, may go to `requested`.
    ///
    /// Arguments
    /// -----------------
    /// * `identity`: the physical object carried by the record.
    /// * `camera`: camera tag of the record, only used for duplicate tracking and logs.
    /// * `requested`: the split currently being generated.
    ///
    /// Return
    /// ----------
    /// * [`Resolution::Accepted`] if the object is unknown (it becomes bound to `requested`)
    ///   or already bound to `requested`.
    /// * [`Resolution::Rejected`] if the object is bound to another split. Nothing is recorded.
    pub fn resolve(
        &mut self,
        identity: &ObjectIdentity,
        camera: &str,
        requested: Split,
    ) -> Resolution {
        match self.bindings.get(identity) {
            Some(&owner) if owner != requested => {
                trace!(
                    object = %identity,
                    camera,
                    %owner,
                    %requested,
                    "object already assigned to another split, record rejected"
                );
                return Resolution::Rejected { owner };
            }
            Some(_) => {}
            None => {
                self.bindings.insert(identity.clone(), requested);
            }
        }

        trace!(object = %identity, camera, split = %requested, "object assigned");
        let duplicate = !self.sightings.insert(identity.with_camera(camera));
        Resolution::Accepted { duplicate }
    }

    /// Split owning `identity`, if any.
    pub fn owner_of(&self, identity: &ObjectIdentity) -> Option<Split> {
        self.bindings.get(identity).copied()
    }

    /// Objects bound to `split`, in no particular order.
    pub fn members(&self, split: Split) -> impl Iterator<Item = &ObjectIdentity> + '_ {
        self.bindings
            .iter()
            .filter(move |&(_, &owner)| owner == split)
            .map(|(identity, _)| identity)
    }

    pub fn member_count(&self, split: Split) -> usize {
        self.bindings.values().filter(|&&s| s == split).count()
    }

    /// Number of distinct objects bound to any split.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether this exact `(object, camera)` pair has been accepted before.
    pub fn has_seen(&self, camera_identity: &CameraIdentity) -> bool {
        self.sightings.contains(camera_identity)
    }

    pub fn sighting_count(&self) -> usize {
        self.sightings.len()
    }
}
