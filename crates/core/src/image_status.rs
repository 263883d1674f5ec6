//! Image processing status and the transitions each actor may perform.
//!
//! ```text
//!            worker          worker
//!  pending ─────────▶ processing ─────▶ done | failed
//!     ▲                                      │
//!     └──────────── engine (re-arm) ─────────┘   (from any state)
//! ```
//!
//! The discriminants match the seed rows of the `image_statuses` lookup
//! table.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::StatusId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum ImageStatus {
    /// Queued for the worker.
    Pending = 1,
    /// Claimed by the worker.
    Processing = 2,
    /// Worker finished; `edited_url` is current.
    Done = 3,
    /// Worker gave up on this revision.
    Failed = 4,
}

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// This engine: may only re-arm.
    Engine,
    /// The external image-processing worker.
    Worker,
}

impl ImageStatus {
    /// String representation for display, logging, and the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Parse from the database status ID.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Processing),
            3 => Ok(Self::Done),
            4 => Ok(Self::Failed),
            other => Err(CoreError::Internal(format!("Unknown image status id {other}"))),
        }
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid image status '{other}'. Must be one of: pending, processing, done, failed"
            ))),
        }
    }
}

/// Check that `actor` may move an image from `from` to `to`.
///
/// The engine may re-arm from any state (including an in-flight
/// `processing`) and nothing else. The worker may only claim a pending
/// image and settle a processing one.
pub fn validate_transition(
    from: ImageStatus,
    to: ImageStatus,
    actor: Actor,
) -> Result<(), CoreError> {
    use ImageStatus::*;

    let allowed = match actor {
        Actor::Engine => to == Pending,
        Actor::Worker => matches!(
            (from, to),
            (Pending, Processing) | (Processing, Done) | (Processing, Failed)
        ),
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "{actor:?} may not move an image from '{from}' to '{to}'"
        )))
    }
}

/// The edited output URL, if it reflects the current settings.
///
/// A URL left over from an earlier `done` stays in storage after a re-arm
/// but is stale until the worker reports `done` again.
pub fn fresh_edited_url(status: ImageStatus, edited_url: Option<&str>) -> Option<&str> {
    match status {
        ImageStatus::Done => edited_url,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ImageStatus::*;

    const ALL: [ImageStatus; 4] = [Pending, Processing, Done, Failed];

    #[test]
    fn ids_match_seed_data() {
        assert_eq!(Pending.id(), 1);
        assert_eq!(Processing.id(), 2);
        assert_eq!(Done.id(), 3);
        assert_eq!(Failed.id(), 4);
        for status in ALL {
            assert_eq!(ImageStatus::from_id(status.id()).unwrap(), status);
        }
        assert!(ImageStatus::from_id(9).is_err());
    }

    #[test]
    fn parse_matches_as_str() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<ImageStatus>().unwrap(), status);
        }
        assert!("queued".parse::<ImageStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Processing).unwrap(), "\"processing\"");
    }

    #[test]
    fn engine_can_rearm_from_every_state() {
        for from in ALL {
            assert!(validate_transition(from, Pending, Actor::Engine).is_ok(), "{from}");
        }
    }

    #[test]
    fn engine_cannot_set_worker_states() {
        for from in ALL {
            for to in [Processing, Done, Failed] {
                let err = validate_transition(from, to, Actor::Engine).unwrap_err();
                assert!(matches!(err, CoreError::Conflict(_)));
            }
        }
    }

    #[test]
    fn worker_follows_the_claim_then_settle_path() {
        assert!(validate_transition(Pending, Processing, Actor::Worker).is_ok());
        assert!(validate_transition(Processing, Done, Actor::Worker).is_ok());
        assert!(validate_transition(Processing, Failed, Actor::Worker).is_ok());
    }

    #[test]
    fn worker_cannot_skip_or_rearm() {
        assert!(validate_transition(Pending, Done, Actor::Worker).is_err());
        assert!(validate_transition(Done, Processing, Actor::Worker).is_err());
        assert!(validate_transition(Failed, Pending, Actor::Worker).is_err());
        assert!(validate_transition(Done, Failed, Actor::Worker).is_err());
    }

    #[test]
    fn edited_url_only_trusted_when_done() {
        let url = Some("https://cdn/edited/a.jpg");
        assert_eq!(fresh_edited_url(Done, url), url);
        assert_eq!(fresh_edited_url(Pending, url), None);
        assert_eq!(fresh_edited_url(Processing, url), None);
        assert_eq!(fresh_edited_url(Failed, url), None);
    }
}
