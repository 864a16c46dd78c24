use bytes::Bytes;

use crate::firestore::error::{data_loss, FirestoreResult};
use crate::firestore::local::proto::{ProtoReader, ProtoWriter};
use crate::firestore::local::target_data::{TargetData, TargetGlobal, TargetPurpose};
use crate::firestore::model::{
    DatabaseId, DocumentKey, DocumentsTarget, QueryTarget, ResourcePath, SnapshotVersion,
    TargetDefinition, Timestamp,
};

/// Encodes the target records kept in the local cache.
///
/// The byte layout follows the `firestore.client.Target` and
/// `firestore.client.TargetGlobal` protos so caches stay readable across SDKs.
#[derive(Clone, Debug)]
pub struct LocalSerializer {
    database_id: DatabaseId,
}

impl LocalSerializer {
    pub fn new(database_id: DatabaseId) -> Self {
        Self { database_id }
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    pub fn database_name(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.database_id.project_id(),
            self.database_id.database()
        )
    }

    /// Fully qualified name for a path under the database's document root.
    pub fn resource_name(&self, path: &ResourcePath) -> String {
        if path.is_empty() {
            format!("{}/documents", self.database_name())
        } else {
            format!(
                "{}/documents/{}",
                self.database_name(),
                path.canonical_string()
            )
        }
    }

    pub fn document_name(&self, key: &DocumentKey) -> String {
        self.resource_name(key.path())
    }

    /// Inverse of [`LocalSerializer::resource_name`]. Names belonging to another
    /// database are reported as data loss.
    pub fn decode_resource_name(&self, name: &str) -> FirestoreResult<ResourcePath> {
        let path = ResourcePath::from_string(name)
            .map_err(|err| data_loss(format!("Invalid resource name {name}: {}", err.message())))?;
        let valid = path.len() >= 5
            && path.segment(0) == "projects"
            && path.segment(1) == self.database_id.project_id()
            && path.segment(2) == "databases"
            && path.segment(3) == self.database_id.database()
            && path.segment(4) == "documents";
        if !valid {
            return Err(data_loss(format!(
                "Resource name {name} does not belong to {}",
                self.database_name()
            )));
        }
        Ok(path.drop_first(5))
    }

    pub fn encode_target_data(&self, target_data: &TargetData) -> Bytes {
        let mut writer = ProtoWriter::new();
        writer.int32(1, target_data.target_id());
        if !target_data.snapshot_version().is_none() {
            writer.message(2, &encode_timestamp(target_data.snapshot_version().timestamp()));
        }
        writer.bytes(3, target_data.resume_token());
        writer.int64(4, target_data.sequence_number());
        match target_data.target() {
            TargetDefinition::Query(query) => {
                writer.message(5, &self.encode_query_target(query));
            }
            TargetDefinition::Documents(documents) => {
                writer.message(6, &self.encode_documents_target(documents));
            }
        }
        writer.finish()
    }

    pub fn decode_target_data(&self, encoded: &[u8]) -> FirestoreResult<TargetData> {
        let mut target_id = 0;
        let mut snapshot_version = SnapshotVersion::none();
        let mut resume_token = Bytes::new();
        let mut sequence_number = 0;
        let mut target = None;

        let mut reader = ProtoReader::new(encoded);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => target_id = value.as_int32("target_id")?,
                2 => {
                    snapshot_version =
                        SnapshotVersion::new(decode_timestamp(value.as_bytes("snapshot_version")?)?)
                }
                3 => resume_token = Bytes::copy_from_slice(value.as_bytes("resume_token")?),
                4 => sequence_number = value.as_int64("last_listen_sequence_number")?,
                5 => {
                    target = Some(TargetDefinition::Query(
                        self.decode_query_target(value.as_bytes("query")?)?,
                    ))
                }
                6 => {
                    target = Some(TargetDefinition::Documents(
                        self.decode_documents_target(value.as_bytes("documents")?)?,
                    ))
                }
                _ => {}
            }
        }

        let target = target.ok_or_else(|| {
            data_loss(format!("Target {target_id} has no query or documents target"))
        })?;
        Ok(
            TargetData::new(target, target_id, sequence_number, TargetPurpose::Listen)
                .with_resume_token(resume_token, snapshot_version),
        )
    }

    pub fn encode_target_global(&self, global: &TargetGlobal) -> Bytes {
        let mut writer = ProtoWriter::new();
        writer.int32(1, global.highest_target_id);
        writer.int64(2, global.highest_listen_sequence_number);
        if !global.last_remote_snapshot_version.is_none() {
            writer.message(
                3,
                &encode_timestamp(global.last_remote_snapshot_version.timestamp()),
            );
        }
        writer.finish()
    }

    pub fn decode_target_global(&self, encoded: &[u8]) -> FirestoreResult<TargetGlobal> {
        let mut global = TargetGlobal::default();
        let mut reader = ProtoReader::new(encoded);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => global.highest_target_id = value.as_int32("highest_target_id")?,
                2 => {
                    global.highest_listen_sequence_number =
                        value.as_int64("highest_listen_sequence_number")?
                }
                3 => {
                    global.last_remote_snapshot_version = SnapshotVersion::new(decode_timestamp(
                        value.as_bytes("last_remote_snapshot_version")?,
                    )?)
                }
                _ => {}
            }
        }
        Ok(global)
    }

    fn encode_query_target(&self, query: &QueryTarget) -> Bytes {
        let mut writer = ProtoWriter::new();
        writer.string(1, &self.resource_name(query.parent()));
        writer.message(2, query.structured_query());
        writer.finish()
    }

    fn decode_query_target(&self, encoded: &[u8]) -> FirestoreResult<QueryTarget> {
        let mut parent = None;
        let mut structured_query = Bytes::new();
        let mut reader = ProtoReader::new(encoded);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => parent = Some(self.decode_resource_name(value.as_string("parent")?)?),
                2 => {
                    structured_query =
                        Bytes::copy_from_slice(value.as_bytes("structured_query")?)
                }
                _ => {}
            }
        }
        let parent = parent.ok_or_else(|| data_loss("Query target is missing its parent"))?;
        Ok(QueryTarget::new(parent, structured_query))
    }

    fn encode_documents_target(&self, target: &DocumentsTarget) -> Bytes {
        let mut writer = ProtoWriter::new();
        for key in target.documents() {
            writer.repeated_string(2, &self.document_name(key));
        }
        writer.finish()
    }

    fn decode_documents_target(&self, encoded: &[u8]) -> FirestoreResult<DocumentsTarget> {
        let mut documents = Vec::new();
        let mut reader = ProtoReader::new(encoded);
        while let Some((field, value)) = reader.next_field()? {
            if field == 2 {
                let path = self.decode_resource_name(value.as_string("documents")?)?;
                let key = DocumentKey::from_path(path)
                    .map_err(|err| data_loss(err.message().to_string()))?;
                documents.push(key);
            }
        }
        Ok(DocumentsTarget::new(documents))
    }
}

fn encode_timestamp(timestamp: Timestamp) -> Bytes {
    let mut writer = ProtoWriter::new();
    writer.int64(1, timestamp.seconds);
    writer.int32(2, timestamp.nanos);
    writer.finish()
}

fn decode_timestamp(encoded: &[u8]) -> FirestoreResult<Timestamp> {
    let mut timestamp = Timestamp::default();
    let mut reader = ProtoReader::new(encoded);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => timestamp.seconds = value.as_int64("seconds")?,
            2 => timestamp.nanos = value.as_int32("nanos")?,
            _ => {}
        }
    }
    if !(0..1_000_000_000).contains(&timestamp.nanos) {
        return Err(data_loss(format!(
            "Timestamp nanos out of range: {}",
            timestamp.nanos
        )));
    }
    Ok(timestamp)
}
