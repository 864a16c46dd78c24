use bytes::Bytes;

use crate::firestore::model::{SnapshotVersion, TargetDefinition};

/// Why a target is being listened to. Only kept in memory; decoded records are
/// always [`TargetPurpose::Listen`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetPurpose {
    /// A regular, user-initiated listen.
    #[default]
    Listen,
    /// Re-listen after an existence filter reported a mismatch.
    ExistenceFilterMismatch,
    /// Listen to a single document whose presence in a view is unresolved.
    LimboResolution,
}

/// Everything the local store tracks about one active target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetData {
    target_id: i32,
    target: TargetDefinition,
    purpose: TargetPurpose,
    sequence_number: i64,
    snapshot_version: SnapshotVersion,
    resume_token: Bytes,
}

impl TargetData {
    pub fn new(
        target: TargetDefinition,
        target_id: i32,
        sequence_number: i64,
        purpose: TargetPurpose,
    ) -> Self {
        Self {
            target_id,
            target,
            purpose,
            sequence_number,
            snapshot_version: SnapshotVersion::none(),
            resume_token: Bytes::new(),
        }
    }

    pub fn target_id(&self) -> i32 {
        self.target_id
    }

    pub fn target(&self) -> &TargetDefinition {
        &self.target
    }

    pub fn purpose(&self) -> TargetPurpose {
        self.purpose
    }

    /// The listen sequence number of the most recent access. Used by the garbage
    /// collector as a recency signal.
    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    pub fn snapshot_version(&self) -> SnapshotVersion {
        self.snapshot_version
    }

    /// Opaque backend token used to resume the watch stream for this target.
    pub fn resume_token(&self) -> &Bytes {
        &self.resume_token
    }

    pub fn with_sequence_number(&self, sequence_number: i64) -> Self {
        Self {
            sequence_number,
            ..self.clone()
        }
    }

    pub fn with_resume_token(
        &self,
        resume_token: impl Into<Bytes>,
        snapshot_version: SnapshotVersion,
    ) -> Self {
        Self {
            resume_token: resume_token.into(),
            snapshot_version,
            ..self.clone()
        }
    }

    pub fn with_purpose(&self, purpose: TargetPurpose) -> Self {
        Self {
            purpose,
            ..self.clone()
        }
    }
}

/// Cache-wide bookkeeping shared by every target. Exactly one is persisted.
///
/// Both counters are high-water marks: they only grow, even when the target that
/// raised them is removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TargetGlobal {
    pub highest_target_id: i32,
    pub highest_listen_sequence_number: i64,
    pub last_remote_snapshot_version: SnapshotVersion,
}

impl TargetGlobal {
    /// Raises the high-water marks so that `target_data` is covered.
    pub(crate) fn cover(&mut self, target_data: &TargetData) -> bool {
        let mut changed = false;
        if target_data.target_id > self.highest_target_id {
            self.highest_target_id = target_data.target_id;
            changed = true;
        }
        if target_data.sequence_number > self.highest_listen_sequence_number {
            self.highest_listen_sequence_number = target_data.sequence_number;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::model::{ResourcePath, Timestamp};

    fn target_data(target_id: i32, sequence_number: i64) -> TargetData {
        TargetData::new(
            TargetDefinition::query(ResourcePath::from_segments(["rooms"]), vec![1u8, 2]),
            target_id,
            sequence_number,
            TargetPurpose::Listen,
        )
    }

    #[test]
    fn with_methods_leave_original_untouched() {
        let original = target_data(2, 10);
        let version = SnapshotVersion::new(Timestamp::new(5, 0));
        let updated = original
            .with_sequence_number(11)
            .with_resume_token(vec![9u8], version);

        assert_eq!(original.sequence_number(), 10);
        assert!(original.resume_token().is_empty());
        assert_eq!(updated.sequence_number(), 11);
        assert_eq!(updated.resume_token()[..], [9u8]);
        assert_eq!(updated.snapshot_version(), version);
        assert_eq!(updated.target_id(), 2);
    }

    #[test]
    fn cover_only_raises() {
        let mut global = TargetGlobal {
            highest_target_id: 4,
            highest_listen_sequence_number: 20,
            ..Default::default()
        };
        assert!(!global.cover(&target_data(2, 10)));
        assert!(global.cover(&target_data(6, 3)));
        assert_eq!(global.highest_target_id, 6);
        assert_eq!(global.highest_listen_sequence_number, 20);
        assert!(global.cover(&target_data(1, 21)));
        assert_eq!(global.highest_listen_sequence_number, 21);
    }
}
