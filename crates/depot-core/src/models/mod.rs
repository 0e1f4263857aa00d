pub mod content;
pub mod credentials;
pub mod fixity;
pub mod job;
pub mod metadata;
pub mod version;

pub use content::{ContentKind, ContentObject, ObjectId};
pub use credentials::RemoteCredentials;
pub use fixity::{Checksum, ChecksumAlgorithm, FixityEntry, FixityOutcome};
pub use job::{Job, JobKind, JobOutput, JobReport, JobStatus, Lane, LanePolicy};
pub use metadata::{MimeSource, TechnicalMetadata};
pub use version::{Version, VersionDescriptor, VersionRef};
