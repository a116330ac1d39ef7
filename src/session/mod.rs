pub mod export_session;
pub mod state;

pub use export_session::SearchExportSession;
pub use state::{SessionError, SessionOutcome, SessionState};
