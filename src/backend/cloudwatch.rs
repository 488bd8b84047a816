//! CloudWatch Logs implementation of [`LogBackend`].

use crate::backend::{
    EventQuery, LogBackend, LogGroupInfo, LogStreamInfo, Page, RawEvent, StreamQuery,
};
use crate::error::{CwtailError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::OrderBy;
use aws_sdk_cloudwatchlogs::Client;

/// Backend handle owning one SDK client. Built once at the composition root.
#[derive(Debug, Clone)]
pub struct CloudWatchBackend {
    client: Client,
}

impl CloudWatchBackend {
    /// Wrap an already configured SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS provider chain, with optional overrides
    pub async fn from_env(profile: Option<&str>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_owned()));
        }
        let sdk_config = loader.load().await;
        log::debug!(
            "CloudWatch client configured for region {:?}",
            sdk_config.region()
        );
        Self::new(Client::new(&sdk_config))
    }
}

fn backend_error<E>(operation: &str, err: E) -> CwtailError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CwtailError::backend(format!("{operation}: {}", DisplayErrorContext(err)))
}

#[async_trait]
impl LogBackend for CloudWatchBackend {
    async fn list_log_groups(&self, next_token: Option<String>) -> Result<Page<LogGroupInfo>> {
        let output = self
            .client
            .describe_log_groups()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| backend_error("DescribeLogGroups", e))?;

        let items = output
            .log_groups()
            .iter()
            .filter_map(|group| group.log_group_name())
            .map(|name| LogGroupInfo {
                name: name.to_owned(),
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_owned),
        })
    }

    async fn list_log_streams(&self, query: StreamQuery) -> Result<Page<LogStreamInfo>> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(query.group)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .limit(query.page_size)
            .set_next_token(query.next_token)
            .send()
            .await
            .map_err(|e| backend_error("DescribeLogStreams", e))?;

        let items = output
            .log_streams()
            .iter()
            .filter_map(|stream| {
                stream.log_stream_name().map(|name| LogStreamInfo {
                    name: name.to_owned(),
                    first_event_time: stream.first_event_timestamp(),
                    last_event_time: stream.last_event_timestamp(),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_owned),
        })
    }

    async fn filter_events(&self, query: EventQuery) -> Result<Page<RawEvent>> {
        let filter_pattern = (!query.filter_pattern.is_empty()).then_some(query.filter_pattern);
        // The service treats endTime as inclusive; the contract here is half-open.
        let end_time = query.end_time.saturating_sub(1);

        let output = self
            .client
            .filter_log_events()
            .log_group_name(query.group)
            .set_log_stream_names(Some(query.stream_names))
            .start_time(query.start_time)
            .end_time(end_time)
            .set_filter_pattern(filter_pattern)
            .limit(query.limit)
            .set_next_token(query.next_token)
            .send()
            .await
            .map_err(|e| backend_error("FilterLogEvents", e))?;

        let items = output
            .events()
            .iter()
            .filter_map(|event| {
                event.timestamp().map(|timestamp| RawEvent {
                    timestamp,
                    message: event.message().unwrap_or_default().to_owned(),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_owned),
        })
    }
}
