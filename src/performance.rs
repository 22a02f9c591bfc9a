use lazy_static::lazy_static;
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use crate::env;

lazy_static! {
    static ref LOG_PERF: bool = env::get_env_bool("LOG_PERF").unwrap_or(false);
}

/// Logs how long the wrapped future took to resolve, when LOG_PERF is set.
#[pin_project]
pub struct Timed<Fut>
where
    Fut: Future,
{
    #[pin]
    inner: Fut,
    name: &'static str,
    start: Option<Instant>,
}

impl<Fut> Future for Timed<Fut>
where
    Fut: Future,
{
    type Output = Fut::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let this = self.project();
        let start = this.start.get_or_insert_with(Instant::now);

        match this.inner.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(v) => {
                if *LOG_PERF {
                    let elapsed = start.elapsed();
                    tracing::debug!(name = *this.name, ?elapsed, "timed future resolved");
                }
                Poll::Ready(v)
            }
        }
    }
}

pub trait TimedExt: Sized + Future {
    fn timed(self, name: &'static str) -> Timed<Self> {
        Timed {
            inner: self,
            name,
            start: None,
        }
    }
}

impl<F: Future> TimedExt for F {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timed_passes_output_through_test() {
        let output = async { 42 }.timed("answer").await;
        assert_eq!(output, 42);
    }
}
