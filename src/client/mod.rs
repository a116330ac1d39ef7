pub mod error;
pub mod export_source;
pub mod http;
pub mod namespace;
pub mod transport;

pub use error::{Message, TransportError};
pub use export_source::HttpRecordSource;
pub use http::HttpTransport;
pub use namespace::Namespace;
pub use transport::{SessionToken, Transport};
