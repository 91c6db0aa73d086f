//! Batch submission shared by pulls and syncs

use crate::api::{ApiRequest, BatchResponse, BatchTransport};
use crate::error::Result;
use crate::http::RetryPolicy;
use std::time::Duration;
use tracing::info;

/// Submits batches through a transport under the whole-batch retry policy
pub(crate) struct BatchRunner<'a> {
    transport: &'a dyn BatchTransport,
    retry: RetryPolicy,
    cooldown: Duration,
}

impl<'a> BatchRunner<'a> {
    pub(crate) fn new(
        transport: &'a dyn BatchTransport,
        retry: RetryPolicy,
        cooldown: Duration,
    ) -> Self {
        Self {
            transport,
            retry,
            cooldown,
        }
    }

    /// Submit one batch, retrying the whole submission on transport errors
    pub(crate) async fn submit(
        &self,
        label: &str,
        requests: Vec<(String, ApiRequest)>,
    ) -> Result<Vec<BatchResponse>> {
        let transport = self.transport;
        self.retry
            .run(label, || transport.submit_batch(requests.clone()))
            .await
    }

    /// Pause for the quota window
    pub(crate) async fn cool_down(&self, label: &str) {
        info!(
            "{label}: Quota exceeded. Pausing for {} seconds...",
            self.cooldown.as_secs()
        );
        tokio::time::sleep(self.cooldown).await;
    }
}
