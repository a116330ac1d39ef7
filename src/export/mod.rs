pub mod query;
pub mod record;
pub mod stream;

pub use query::{build_query_text, SearchQuery, TimeRange};
pub use record::{parse_record, RawRecord, SearchRecord};
pub use stream::{ExportLine, ExportStream, RecordSource};
