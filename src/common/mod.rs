mod state;

pub use state::{build_response_cache, AppState, CachedResponse, ResponseCache};
