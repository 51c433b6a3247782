// netpresence-api: async client for the Technicolor CGA router web API

pub mod error;
pub mod router;
pub mod transport;

pub use error::Error;
pub use router::RouterClient;
pub use router::models::{HostEntry, HostTable};
pub use transport::{TlsMode, TransportConfig};
