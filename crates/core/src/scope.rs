// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2025 iotsdk contributors. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Hierarchical cancellation scopes.
//!
//! A [`CancellationScope`] is a node in an explicit tree rooted at the broker
//! connection. Cancelling a scope fires its signal exactly once and cascades to
//! every descendant. Cancelling a child never affects its parent or siblings.
//!
//! Cleanup work is attached with [`CancellationScope::on_cancel`], which spawns a
//! watcher task that waits for the signal and then runs the cleanup future once.

use std::{
    fmt::{Debug, Formatter},
    future::Future,
    sync::Arc,
};

use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Error returned when an operation is attempted on a scope which has fired.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Scope '{label}' has been cancelled")]
pub struct ScopeCancelled {
    /// The label of the cancelled scope.
    pub label: String,
}

/// A node in a cancellation tree.
///
/// Clones share the same signal. A child holds only the token linkage back to its
/// parent, so dropping a child never keeps the parent's resources alive.
#[derive(Clone)]
pub struct CancellationScope {
    label: Arc<str>,
    token: CancellationToken,
}

impl Debug for CancellationScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(CancellationScope))
            .field("label", &self.label)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

impl CancellationScope {
    /// Creates a new root [`CancellationScope`] with the given `label`.
    #[must_use]
    pub fn root(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            token: CancellationToken::new(),
        }
    }

    /// Creates a child scope which fires whenever this scope fires.
    ///
    /// If this scope has already fired the child is created in the fired state.
    #[must_use]
    pub fn child(&self, label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            token: self.token.child_token(),
        }
    }

    /// Returns the label of this scope.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fires the scope's signal, cascading to all descendants.
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            log::debug!("Cancelling scope '{}'", self.label);
        }
        self.token.cancel();
    }

    /// Returns whether the scope's signal has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns a future which completes once the scope's signal has fired.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Checks the scope is still live.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeCancelled`] if the scope's signal has fired.
    pub fn check(&self) -> Result<(), ScopeCancelled> {
        if self.token.is_cancelled() {
            return Err(ScopeCancelled {
                label: self.label.to_string(),
            });
        }
        Ok(())
    }

    /// Registers `cleanup` to run exactly once after the scope fires.
    ///
    /// The watcher task is spawned on `handle` immediately and parks until the
    /// signal is observed.
    pub fn on_cancel<F>(&self, handle: &Handle, cleanup: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        let label = Arc::clone(&self.label);
        handle.spawn(async move {
            token.cancelled().await;
            log::debug!("Running cleanup for scope '{label}'");
            cleanup.await;
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_new_scope_is_live() {
        let scope = CancellationScope::root("app");
        assert!(!scope.is_cancelled());
        assert!(scope.check().is_ok());
        assert_eq!(scope.label(), "app");
    }

    #[rstest]
    fn test_cancel_cascades_to_descendants() {
        let root = CancellationScope::root("root");
        let app = root.child("app");
        let device = app.child("device");

        root.cancel();

        assert!(app.is_cancelled());
        assert!(device.is_cancelled());
    }

    #[rstest]
    fn test_cancel_child_does_not_affect_parent_or_siblings() {
        let app = CancellationScope::root("app");
        let dev1 = app.child("dev1");
        let dev2 = app.child("dev2");

        dev1.cancel();

        assert!(dev1.is_cancelled());
        assert!(!dev2.is_cancelled());
        assert!(!app.is_cancelled());
    }

    #[rstest]
    fn test_child_of_cancelled_scope_starts_cancelled() {
        let app = CancellationScope::root("app");
        app.cancel();

        let device = app.child("device");
        assert!(device.is_cancelled());
    }

    #[rstest]
    fn test_check_reports_label() {
        let scope = CancellationScope::root("device dev1");
        scope.cancel();
        scope.cancel();

        let err = scope.check().unwrap_err();
        assert_eq!(err.label, "device dev1");
        assert_eq!(err.to_string(), "Scope 'device dev1' has been cancelled");
    }

    #[rstest]
    #[tokio::test]
    async fn test_on_cancel_runs_cleanup_once() {
        let scope = CancellationScope::root("app");
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let watcher = scope.on_cancel(&Handle::current(), async move {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        scope.cancel();
        scope.cancel();
        watcher.await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_on_cancel_fires_from_ancestor() {
        let root = CancellationScope::root("root");
        let device = root.child("device");
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let watcher = device.on_cancel(&Handle::current(), async move {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        root.cancel();
        watcher.await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
