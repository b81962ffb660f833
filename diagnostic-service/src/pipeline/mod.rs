use std::{pin::Pin, sync::Arc, time::SystemTime};

use diagnostic_engine::EngineError;
use futures::{Stream, StreamExt};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    /// The source itself failed (unopenable or unreadable file); nothing after
    /// it can be trusted, whatever the batch policy.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
    #[error(transparent)]
    Invalid(#[from] EngineError),
}

impl PipelineError {
    /// True when the error ends the stream rather than rejecting one record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::SourceUnavailable(_))
    }
}

/// What a sink does with a bad reading: halt the whole batch, or report it and
/// keep going with the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    FailFast,
    #[default]
    CollectErrors,
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T, T> + Send + Sync>>, // same-type transforms chain
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<(), PipelineError> {
        let mut stream = self.source.stream().await;

        for t in self.transforms {
            stream = Box::pin(stream.then(move |item| {
                let t = t.clone();
                async move {
                    match item {
                        Ok(env) => t.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        self.sink.run(stream).await
    }
}

/// Drain a source through the given transforms, keeping every item.
pub async fn collect<T, S>(
    source: &S,
    transforms: &[Arc<dyn Transform<T, T> + Send + Sync>],
) -> Vec<Result<Envelope<T>, PipelineError>>
where
    T: Send + 'static,
    S: Source<T>,
{
    let mut stream = source.stream().await;
    let mut out = Vec::new();

    while let Some(item) = stream.next().await {
        let mut item = item;
        for t in transforms {
            item = match item {
                Ok(env) => t.apply(env).await,
                Err(e) => Err(e),
            };
        }
        out.push(item);
    }

    out
}
