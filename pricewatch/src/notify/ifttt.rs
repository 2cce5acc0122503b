use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::notify::{NotifyError, Notifier};

const SERVICE_KEY_HEADER: &str = "IFTTT-Service-Key";

#[derive(Debug, Serialize)]
struct NotificationBody<'a> {
    data: [NotificationItem<'a>; 1],
}

#[derive(Debug, Serialize)]
struct NotificationItem<'a> {
    trigger_identity: &'a str,
}

/// IFTTT realtime API client. Tells the channel that new events exist for a
/// trigger so it polls immediately instead of waiting for its next cycle.
#[derive(Clone)]
pub struct IftttRealtimeNotifier {
    http: Client,
    url: String,
    service_key: String,
}

impl IftttRealtimeNotifier {
    pub fn new(url: String, service_key: String, timeout: Duration) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(NotifyError::Build)?;

        Ok(Self {
            http,
            url,
            service_key,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for IftttRealtimeNotifier {
    #[instrument(skip(self), level = "debug")]
    async fn notify(&self, trigger_identity: &str) -> Result<(), NotifyError> {
        let body = NotificationBody {
            data: [NotificationItem { trigger_identity }],
        };

        let resp = self
            .http
            .post(&self.url)
            .header(SERVICE_KEY_HEADER, &self.service_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(NotifyError::Unreachable)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected { status });
        }

        debug!(%status, "realtime notification accepted");
        Ok(())
    }
}
