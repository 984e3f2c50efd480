//! SMB2 client: session lifecycle, request correlation and enumeration

pub mod bridge;
pub mod config;
pub mod enumerator;
pub mod fallback;
pub mod session;

pub use bridge::{PendingRequest, RequestBridge};
pub use config::{ClientConfig, DEFAULT_PORT};
pub use enumerator::ShareEnumerator;
pub use session::{SessionState, SocketSession};
