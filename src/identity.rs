//! Identities of simulated galaxies.
//!
//! A TNG file holds several renderings of the same galaxy. [`ObjectIdentity`] names the
//! galaxy/snapshot independently of the viewing camera and is the key of split
//! exclusivity; [`CameraIdentity`] adds the camera and only feeds duplicate tracking.
use std::fmt;

use serde::Serialize;

use crate::constants::{SnapNum, SubhaloId};

/// Physical object behind an extension: `(EXTNAME, ORIGIN, SIMTAG, SNAPNUM, SUBHALO)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectIdentity {
    pub extname: String,
    pub origin: String,
    pub simtag: String,
    pub snapnum: SnapNum,
    pub subhalo: SubhaloId,
}

impl ObjectIdentity {
    pub fn new(
        extname: impl Into<String>,
        origin: impl Into<String>,
        simtag: impl Into<String>,
        snapnum: SnapNum,
        subhalo: SubhaloId,
    ) -> Self {
        ObjectIdentity {
            extname: extname.into(),
            origin: origin.into(),
            simtag: simtag.into(),
            snapnum,
            subhalo,
        }
    }

    /// Qualify this object with the camera that rendered it.
    pub fn with_camera(&self, camera: impl Into<String>) -> CameraIdentity {
        CameraIdentity {
            object: self.clone(),
            camera: camera.into(),
        }
    }
}

impl fmt::Display for ObjectIdentity {
    /// `EXTNAME_ORIGIN_SIMTAG_SNAPNUM_SUBHALO`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.extname, self.origin, self.simtag, self.snapnum, self.subhalo
        )
    }
}

/// An [`ObjectIdentity`] seen through one camera.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CameraIdentity {
    pub object: ObjectIdentity,
    pub camera: String,
}

impl fmt::Display for CameraIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.object, self.camera)
    }
}
