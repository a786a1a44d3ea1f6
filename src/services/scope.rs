// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lifetime scope for background tasks.
//!
//! Every task spawned through a [`TaskScope`] is aborted when the scope is
//! closed or dropped, so no task can write state after its owner is gone.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct TaskScope {
    name: &'static str,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl TaskScope {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Spawn a task owned by this scope. Ignored once the scope is closed.
    pub fn spawn<F>(&self, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.is_closed() {
            tracing::debug!(scope = self.name, "Scope closed, not spawning task");
            return false;
        }
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(tokio::spawn(future));
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Abort every task. Idempotent.
    pub fn close(&self) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let count = tasks.len();
        for handle in tasks.drain(..) {
            handle.abort();
        }
        tracing::debug!(scope = self.name, tasks = count, "Scope closed");
    }

    pub fn live_tasks(&self) -> usize {
        match self.tasks.lock() {
            Ok(tasks) => tasks.iter().filter(|h| !h.is_finished()).count(),
            Err(poisoned) => poisoned.into_inner().iter().filter(|h| !h.is_finished()).count(),
        }
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_close_aborts_tasks() {
        let scope = TaskScope::new("test");
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        assert!(scope.spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        scope.close();
        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(seen, 2);
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
        assert_eq!(scope.live_tasks(), 0);
    }

    #[tokio::test]
    async fn test_spawn_after_close_is_refused() {
        let scope = TaskScope::new("test");
        scope.close();
        assert!(!scope.spawn(async {}));
    }
}
