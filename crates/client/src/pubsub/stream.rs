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

//! Read handles over topic channel buffers.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use tokio::sync::{
    Mutex,
    mpsc::{self, error::TryRecvError},
};

/// A cloneable read handle over a [`TopicChannel`](super::TopicChannel) buffer.
///
/// All clones drain the same buffer, so each message is observed by exactly one
/// reader. Once the channel is unsubscribed the stream yields any messages still
/// buffered and then ends.
pub struct MessageStream<M> {
    receiver: Arc<Mutex<mpsc::Receiver<M>>>,
}

impl<M> Clone for MessageStream<M> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
        }
    }
}

impl<M> Debug for MessageStream<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(MessageStream))
            .field("readers", &Arc::strong_count(&self.receiver))
            .finish()
    }
}

impl<M> MessageStream<M> {
    pub(crate) fn new(receiver: mpsc::Receiver<M>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Receives the next message, waiting until one is available.
    ///
    /// Returns `None` once the channel has been closed and drained.
    pub async fn recv(&self) -> Option<M> {
        self.receiver.lock().await.recv().await
    }

    /// Receives the next message if one is immediately available.
    ///
    /// # Errors
    ///
    /// Returns [`TryRecvError::Empty`] if no message is buffered (or another
    /// reader is currently receiving), and [`TryRecvError::Disconnected`] once
    /// the channel has been closed and drained.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        match self.receiver.try_lock() {
            Ok(mut receiver) => receiver.try_recv(),
            Err(_) => Err(TryRecvError::Empty),
        }
    }

    /// Returns whether `other` reads from the same buffer as this stream.
    #[must_use]
    pub fn is_same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.receiver, &other.receiver)
    }
}
