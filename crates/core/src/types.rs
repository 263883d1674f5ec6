/// All primary keys are UUIDs, generated by the caller before insert so a
/// blob can be uploaded under the row's final id.
pub type DbId = uuid::Uuid;

/// Identity of an (anonymous) user owning batches.
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Status ID type matching SMALLINT lookup columns in the database.
pub type StatusId = i16;
