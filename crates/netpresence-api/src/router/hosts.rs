// Host table endpoint

use tracing::debug;

use crate::error::Error;
use crate::router::client::RouterClient;
use crate::router::models::{HostEntry, HostTable};

impl RouterClient {
    /// Fetch the router's current host table.
    ///
    /// `GET /api/v1/host/hostTbl`. A response without `data` or without
    /// `hostTbl` yields an empty list.
    pub async fn host_table(&self) -> Result<Vec<HostEntry>, Error> {
        let url = self.api_url("host/hostTbl")?;
        let table: Option<HostTable> = self.get(url).await?;
        let hosts = table.map(|t| t.hosts).unwrap_or_default();
        debug!(size = hosts.len(), "fetched host table");
        Ok(hosts)
    }
}
