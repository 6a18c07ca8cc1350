pub mod notification;
pub mod sqs;
pub mod traits;

pub use notification::parse_notification;
pub use sqs::SqsWorkSource;
pub use traits::{SourceError, SourceMessage, WorkSource};
