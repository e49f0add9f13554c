//! Deferred work produced by update functions.
//!
//! An update never awaits. It returns a [`Task`] describing the futures to
//! run, and the controller loop feeds each future's output back in as the
//! next message.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

#[must_use = "a Task does nothing unless handed to the controller loop"]
pub struct Task<M> {
    futures: Vec<BoxFuture<'static, M>>,
}

impl<M> fmt::Debug for Task<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("futures", &self.futures.len())
            .finish()
    }
}

impl<M> Default for Task<M> {
    fn default() -> Self {
        Self::none()
    }
}

impl<M> Task<M> {
    pub fn none() -> Self {
        Self {
            futures: Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.futures.is_empty()
    }

    pub fn into_futures(self) -> Vec<BoxFuture<'static, M>> {
        self.futures
    }
}

impl<M: Send + 'static> Task<M> {
    /// Run `future` and map its output into a message
    pub fn perform<T, F>(
        future: F,
        map: impl FnOnce(T) -> M + Send + 'static,
    ) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            futures: vec![future.map(map).boxed()],
        }
    }

    /// Feed `message` back immediately
    pub fn done(message: M) -> Self {
        Self {
            futures: vec![futures::future::ready(message).boxed()],
        }
    }

    pub fn batch(tasks: impl IntoIterator<Item = Task<M>>) -> Self {
        Self {
            futures: tasks.into_iter().flat_map(|t| t.futures).collect(),
        }
    }

    pub fn map<N: Send + 'static>(
        self,
        f: impl Fn(M) -> N + Clone + Send + 'static,
    ) -> Task<N> {
        Task {
            futures: self
                .futures
                .into_iter()
                .map(|fut| {
                    let f = f.clone();
                    fut.map(f).boxed()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    #[tokio::test]
    async fn batch_keeps_every_future() {
        let task = Task::batch([
            Task::done(1),
            Task::none(),
            Task::perform(async { 2 }, |n: i32| n * 10),
        ]);

        let outputs = join_all(task.into_futures()).await;
        assert_eq!(outputs, vec![1, 20]);
    }

    #[tokio::test]
    async fn map_converts_message_type() {
        let task = Task::done(3).map(|n: i32| n.to_string());
        let outputs = join_all(task.into_futures()).await;
        assert_eq!(outputs, vec!["3".to_string()]);
    }

    #[test]
    fn none_is_empty() {
        assert!(Task::<()>::none().is_none());
    }
}
