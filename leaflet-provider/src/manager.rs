//! Message correlation engine.
//!
//! The manager owns the channel and the filter registry. One dispatch task
//! drains the channel's inbound sink and offers every frame to the installed
//! filters in insertion order; provider operations install filters and await
//! their completions. All registry mutation happens under one lock, held for
//! the dispatch of a single frame at a time.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};

use leaflet_core::codec;
use leaflet_core::wallet_protocol::NewPeakWallet;
use leaflet_core::{Message, ProtocolMessageType};

use leaflet_net::MessageChannel;

use crate::error::{ProviderError, ProviderResult};
use crate::filter::{Completion, Filter, FilterId, Predicate};

/// Sentinel for "no peak observed yet" in the atomic peak height.
const PEAK_UNSET: u64 = u64::MAX;

const STATE_NEW: u8 = 0;
const STATE_CONNECTED: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// A filter as stored in the registry.
struct RegisteredFilter {
    id: FilterId,
    consume: Predicate,
    delete_after_first_consumed: bool,
    completion: Option<oneshot::Sender<ProviderResult<Message>>>,
}

/// Registry, peak cache and lifecycle state shared with the dispatch and
/// timeout tasks.
struct ManagerInner {
    /// Installed filters in insertion order.
    filters: Mutex<Vec<RegisteredFilter>>,
    /// Latest peak height pushed by the node; [`PEAK_UNSET`] until the first
    /// `new_peak_wallet` arrives. Readers are lock-free.
    peak_height: AtomicU64,
    next_filter_id: AtomicU64,
    state: AtomicU8,
}

impl ManagerInner {
    /// Offer one inbound frame to the installed filters.
    ///
    /// Filters are visited in insertion order. Every matching subscription
    /// observes the frame (independent subscribers on the same key each get
    /// their copy); the first matching one-shot filter consumes it
    /// exclusively: it is removed and completed, and no later filter sees
    /// the frame. A frame nothing matched is discarded; unsolicited
    /// messages are not an error.
    async fn dispatch(&self, frame: &Message) {
        let mut completed = None;
        {
            let mut filters = self.filters.lock().await;
            let mut consumed = false;
            let mut index = 0;
            while index < filters.len() {
                if (filters[index].consume)(frame) {
                    consumed = true;
                    if filters[index].delete_after_first_consumed {
                        completed = Some(filters.remove(index));
                        break;
                    }
                }
                index += 1;
            }
            if !consumed {
                tracing::trace!(msg_type = %frame.msg_type, "Discarding unsolicited frame");
            }
        }

        if let Some(filter) = completed {
            if let Some(tx) = filter.completion {
                let _ = tx.send(Ok(frame.clone()));
            }
        }
    }

    /// Remove a filter without resolving its completion.
    async fn take_filter(&self, id: FilterId) -> Option<RegisteredFilter> {
        let mut filters = self.filters.lock().await;
        let position = filters.iter().position(|f| f.id == id)?;
        Some(filters.remove(position))
    }

    /// Deadline handler: remove the filter and fail its completion.
    ///
    /// A no-op when the filter already matched or was cancelled; a match
    /// arriving after this ran is treated as unsolicited and discarded.
    async fn expire(&self, id: FilterId) {
        if let Some(filter) = self.take_filter(id).await {
            tracing::debug!(filter = %id, "Request timed out");
            if let Some(tx) = filter.completion {
                let _ = tx.send(Err(ProviderError::Timeout));
            }
        }
    }

    /// Fail every outstanding completion and clear the registry.
    async fn cancel_all(&self) {
        let drained: Vec<RegisteredFilter> = {
            let mut filters = self.filters.lock().await;
            filters.drain(..).collect()
        };
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "Cancelling outstanding filters");
        }
        for filter in drained {
            if let Some(tx) = filter.completion {
                let _ = tx.send(Err(ProviderError::Cancelled));
            }
        }
    }
}

/// Deregistration handle for a subscription filter.
pub struct SubscriptionHandle {
    id: FilterId,
    inner: Arc<ManagerInner>,
}

impl SubscriptionHandle {
    /// Id of the underlying filter.
    pub fn id(&self) -> FilterId {
        self.id
    }

    /// Remove the subscription filter from the registry.
    pub async fn unsubscribe(self) {
        self.inner.take_filter(self.id).await;
    }
}

/// Owns the channel, the filter registry, the peak-height watcher, the
/// timeout scheduler and the connection lifecycle.
pub struct MessageManager {
    channel: Mutex<Box<dyn MessageChannel>>,
    inner: Arc<ManagerInner>,
}

impl MessageManager {
    /// Create a manager over an unopened channel.
    pub fn new(channel: Box<dyn MessageChannel>) -> Self {
        Self {
            channel: Mutex::new(channel),
            inner: Arc::new(ManagerInner {
                filters: Mutex::new(Vec::new()),
                peak_height: AtomicU64::new(PEAK_UNSET),
                next_filter_id: AtomicU64::new(1),
                state: AtomicU8::new(STATE_NEW),
            }),
        }
    }

    /// Open the channel and start dispatching.
    ///
    /// Installs the permanent peak watcher and spawns the dispatch task.
    /// A no-op when already connected; a closed manager stays closed (a
    /// disconnect cancels all pending operations and is not retried).
    pub async fn initialize(&self) -> ProviderResult<()> {
        match self.inner.state.load(Ordering::SeqCst) {
            STATE_CONNECTED => return Ok(()),
            STATE_CLOSED => return Err(ProviderError::NotConnected),
            _ => {}
        }

        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel();
        {
            let mut channel = self.channel.lock().await;
            channel.set_sink(sink_tx);
            channel.open().await?;
        }
        self.inner.state.store(STATE_CONNECTED, Ordering::SeqCst);

        // Permanent peak watcher. Installed first, so it is always the
        // oldest filter in the registry. Decode failures keep the previously
        // cached height.
        let peak_inner = self.inner.clone();
        let watcher = Filter::subscription(move |msg| {
            if msg.msg_type != ProtocolMessageType::NewPeakWallet {
                return false;
            }
            match codec::decode::<NewPeakWallet>(&msg.data) {
                Ok(peak) => {
                    tracing::debug!(height = peak.height, "New peak");
                    peak_inner.peak_height.store(peak.height, Ordering::SeqCst);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to decode peak update");
                }
            }
            true
        });
        self.install(watcher, None).await?;

        // Dispatch task: drains the sink until the channel drops it, then
        // cancels everything outstanding.
        let inner = self.inner.clone();
        tokio::spawn(async move {
            while let Some(frame) = sink_rx.recv().await {
                inner.dispatch(&frame).await;
            }
            tracing::debug!("Channel closed, cancelling outstanding filters");
            inner.state.store(STATE_CLOSED, Ordering::SeqCst);
            inner.cancel_all().await;
        });

        Ok(())
    }

    /// Install a one-shot filter and return its completion.
    ///
    /// The filter's `message_to_send` is transmitted exactly once after the
    /// filter is in the registry, so the response cannot race past it.
    pub async fn register_filter(&self, filter: Filter) -> ProviderResult<Completion> {
        debug_assert!(filter.is_one_shot(), "subscriptions go through subscribe()");
        let (tx, rx) = oneshot::channel();
        self.install(filter, Some(tx)).await?;
        Ok(Completion::new(rx))
    }

    /// Install a subscription filter and return its deregistration handle.
    pub async fn subscribe(&self, filter: Filter) -> ProviderResult<SubscriptionHandle> {
        debug_assert!(!filter.is_one_shot(), "requests go through register_filter()");
        let id = self.install(filter, None).await?;
        Ok(SubscriptionHandle {
            id,
            inner: self.inner.clone(),
        })
    }

    async fn install(
        &self,
        filter: Filter,
        completion: Option<oneshot::Sender<ProviderResult<Message>>>,
    ) -> ProviderResult<FilterId> {
        if self.inner.state.load(Ordering::SeqCst) != STATE_CONNECTED {
            return Err(ProviderError::NotConnected);
        }

        let Filter {
            message_to_send,
            consume,
            delete_after_first_consumed,
            expected_max_response_wait,
        } = filter;

        let id = FilterId(self.inner.next_filter_id.fetch_add(1, Ordering::SeqCst));
        {
            let mut filters = self.inner.filters.lock().await;
            filters.push(RegisteredFilter {
                id,
                consume,
                delete_after_first_consumed,
                completion,
            });
        }

        if let Some(message) = message_to_send {
            let channel = self.channel.lock().await;
            if let Err(e) = channel.send(message).await {
                self.inner.take_filter(id).await;
                return Err(ProviderError::Transport(e));
            }
        }

        if let Some(wait) = expected_max_response_wait {
            let weak = Arc::downgrade(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(wait).await;
                if let Some(inner) = weak.upgrade() {
                    inner.expire(id).await;
                }
            });
        }

        Ok(id)
    }

    /// Close the channel, fail all outstanding completions with `Cancelled`
    /// and clear the registry. Idempotent.
    pub async fn close(&self) {
        let previous = self.inner.state.swap(STATE_CLOSED, Ordering::SeqCst);
        if previous == STATE_CLOSED {
            return;
        }
        self.channel.lock().await.close().await;
        self.inner.cancel_all().await;
    }

    /// Latest peak height pushed by the node, if any was observed.
    pub fn latest_peak_height(&self) -> Option<u64> {
        match self.inner.peak_height.load(Ordering::SeqCst) {
            PEAK_UNSET => None,
            height => Some(height),
        }
    }

    /// Whether the manager is connected.
    pub fn is_connected(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) == STATE_CONNECTED
    }

    /// Number of installed filters (including the peak watcher).
    pub async fn filter_count(&self) -> usize {
        self.inner.filters.lock().await.len()
    }
}
