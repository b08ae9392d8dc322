use super::errors::classify_sdk_error;
use crate::adapters::{AdapterError, AdapterResult, LogSink};
use crate::types::Event;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs as logs;
use aws_sdk_cloudwatchlogs::error::SdkError;
use aws_sdk_cloudwatchlogs::operation::put_log_events::PutLogEventsError;
use aws_sdk_cloudwatchlogs::types::{InputLogEvent, LogStream};

/// CloudWatch Logs stream writer, one log group for the whole fleet.
pub struct CloudWatchLogSink {
    client: logs::Client,
    log_group: String,
}

enum PutFailure {
    /// The service told us which token it expected instead.
    StaleToken(String),
    Failed(AdapterError),
}

impl CloudWatchLogSink {
    pub fn new(config: &SdkConfig, log_group: &str) -> Self {
        Self {
            client: logs::Client::new(config),
            log_group: log_group.to_string(),
        }
    }

    pub fn log_group(&self) -> &str {
        &self.log_group
    }

    /// Creates the log group unless it already exists.
    pub async fn ensure_log_group(&self) -> AdapterResult<()> {
        match self
            .client
            .create_log_group()
            .log_group_name(&self.log_group)
            .send()
            .await
        {
            Ok(_) => {
                tracing::info!(log_group = %self.log_group, "Created log group");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_already_exists_exception()) =>
            {
                tracing::debug!(log_group = %self.log_group, "Log group already exists");
                Ok(())
            }
            Err(err) => Err(classify_sdk_error("CreateLogGroup", err)),
        }
    }

    /// The stream named exactly `stream_name`, if it exists.
    ///
    /// Walks every page, since other streams may share the name as a prefix.
    async fn find_stream(&self, stream_name: &str) -> AdapterResult<Option<LogStream>> {
        let mut pages = self
            .client
            .describe_log_streams()
            .log_group_name(&self.log_group)
            .log_stream_name_prefix(stream_name)
            .into_paginator()
            .send();

        let mut matches = 0;
        let mut found = None;
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| classify_sdk_error("DescribeLogStreams", err))?;
            let streams = page.log_streams();
            matches += streams.len();
            if found.is_none() {
                found = exact_stream(streams, stream_name);
            }
        }

        if matches > 1 {
            tracing::warn!(
                stream = stream_name,
                matches,
                "Found more than one log stream in DescribeLogStreams call"
            );
        }
        Ok(found)
    }

    async fn create_stream(&self, stream_name: &str) -> AdapterResult<()> {
        match self
            .client
            .create_log_stream()
            .log_group_name(&self.log_group)
            .log_stream_name(stream_name)
            .send()
            .await
        {
            Ok(_) => {
                tracing::info!(stream = stream_name, "Created log stream");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_already_exists_exception()) =>
            {
                Ok(())
            }
            Err(err) => Err(classify_sdk_error("CreateLogStream", err)),
        }
    }

    async fn put_once(
        &self,
        stream_name: &str,
        log_event: InputLogEvent,
        continuation: Option<String>,
    ) -> Result<Option<String>, PutFailure> {
        let result = self
            .client
            .put_log_events()
            .log_group_name(&self.log_group)
            .log_stream_name(stream_name)
            .log_events(log_event)
            .set_sequence_token(continuation)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.next_sequence_token().map(str::to_string)),
            Err(err) => match expected_sequence_token(&err) {
                Some(Expected::Retry(token)) => Err(PutFailure::StaleToken(token)),
                Some(Expected::AlreadyAccepted(token)) => {
                    tracing::debug!(stream = stream_name, "Event was already accepted");
                    Ok(token)
                }
                None => Err(PutFailure::Failed(classify_sdk_error("PutLogEvents", err))),
            },
        }
    }
}

fn exact_stream(streams: &[LogStream], stream_name: &str) -> Option<LogStream> {
    streams
        .iter()
        .find(|stream| stream.log_stream_name() == Some(stream_name))
        .cloned()
}

enum Expected {
    Retry(String),
    AlreadyAccepted(Option<String>),
}

fn expected_sequence_token<R>(err: &SdkError<PutLogEventsError, R>) -> Option<Expected> {
    match err.as_service_error()? {
        PutLogEventsError::InvalidSequenceTokenException(e) => e
            .expected_sequence_token()
            .map(|token| Expected::Retry(token.to_string())),
        PutLogEventsError::DataAlreadyAcceptedException(e) => Some(Expected::AlreadyAccepted(
            e.expected_sequence_token().map(str::to_string),
        )),
        _ => None,
    }
}

#[async_trait]
impl LogSink for CloudWatchLogSink {
    async fn ensure_stream(&self, stream_name: &str) -> AdapterResult<Option<String>> {
        let stream = match self.find_stream(stream_name).await? {
            Some(stream) => stream,
            None => {
                self.create_stream(stream_name).await?;
                self.find_stream(stream_name).await?.ok_or_else(|| {
                    AdapterError::transient(format!(
                        "log stream {} not visible after creation",
                        stream_name
                    ))
                })?
            }
        };

        Ok(stream.upload_sequence_token().map(str::to_string))
    }

    async fn append(
        &self,
        stream_name: &str,
        event: &Event,
        continuation: Option<String>,
    ) -> AdapterResult<Option<String>> {
        let log_event = InputLogEvent::builder()
            .timestamp(event.timestamp_millis())
            .message(&event.message)
            .build()
            .map_err(|err| {
                AdapterError::rejected(format!("invalid log event {}: {}", event.id, err))
            })?;

        match self.put_once(stream_name, log_event.clone(), continuation).await {
            Ok(next) => Ok(next),
            Err(PutFailure::StaleToken(expected)) => {
                tracing::warn!(
                    stream = stream_name,
                    event_id = %event.id,
                    "Sequence token was stale, resending with the expected one"
                );
                match self.put_once(stream_name, log_event, Some(expected)).await {
                    Ok(next) => Ok(next),
                    Err(PutFailure::StaleToken(_)) => Err(AdapterError::transient(format!(
                        "sequence token for {} keeps moving",
                        stream_name
                    ))),
                    Err(PutFailure::Failed(err)) => Err(err),
                }
            }
            Err(PutFailure::Failed(err)) => Err(err),
        }
    }
}
