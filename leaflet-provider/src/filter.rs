//! Message filters.
//!
//! A filter is a registered intent to send zero or one outbound frame and to
//! consume matching inbound frames via a predicate. Two kinds exist, and the
//! constructors keep them apart:
//!
//! - **one-shot** ([`Filter::request`]): removed on first match, paired with
//!   a [`Completion`] that resolves with the consumed frame, bounded by a
//!   response deadline;
//! - **subscription** ([`Filter::subscription`]): stays installed, has no
//!   completion and no deadline; its predicate delivers updates through a
//!   channel owned by the subscriber.
//!
//! Predicates are pure functions over the frame contents. The wire protocol
//! carries no caller-chosen correlation id, so each call site captures its
//! request fields by value and matches the response against them.

use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;

use leaflet_core::Message;

use crate::error::{ProviderError, ProviderResult};

/// Default deadline for one-shot filters.
pub const DEFAULT_RESPONSE_WAIT: Duration = Duration::from_secs(15);

pub(crate) type Predicate = Box<dyn FnMut(&Message) -> bool + Send>;

/// Unique identifier of an installed filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(pub(crate) u64);

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "filter-{}", self.0)
    }
}

/// A registered intent to match inbound frames.
pub struct Filter {
    pub(crate) message_to_send: Option<Message>,
    pub(crate) consume: Predicate,
    pub(crate) delete_after_first_consumed: bool,
    pub(crate) expected_max_response_wait: Option<Duration>,
}

impl Filter {
    /// Create a one-shot request filter.
    ///
    /// `message_to_send` is transmitted exactly once at registration. The
    /// filter is removed on first match and its completion resolves with the
    /// matched frame. The default deadline is [`DEFAULT_RESPONSE_WAIT`].
    pub fn request(
        message_to_send: Message,
        consume: impl FnMut(&Message) -> bool + Send + 'static,
    ) -> Self {
        Self {
            message_to_send: Some(message_to_send),
            consume: Box::new(consume),
            delete_after_first_consumed: true,
            expected_max_response_wait: Some(DEFAULT_RESPONSE_WAIT),
        }
    }

    /// Create a passive subscription filter with no registration message.
    pub fn subscription(consume: impl FnMut(&Message) -> bool + Send + 'static) -> Self {
        Self {
            message_to_send: None,
            consume: Box::new(consume),
            delete_after_first_consumed: false,
            expected_max_response_wait: None,
        }
    }

    /// Create a subscription filter that sends a registration message once
    /// at install time.
    pub fn registered_subscription(
        message_to_send: Message,
        consume: impl FnMut(&Message) -> bool + Send + 'static,
    ) -> Self {
        Self {
            message_to_send: Some(message_to_send),
            ..Self::subscription(consume)
        }
    }

    /// Override the response deadline. A zero duration disables the
    /// deadline entirely.
    pub fn with_response_wait(mut self, wait: Duration) -> Self {
        self.expected_max_response_wait = if wait.is_zero() { None } else { Some(wait) };
        self
    }

    /// Whether this filter removes itself after its first match.
    pub fn is_one_shot(&self) -> bool {
        self.delete_after_first_consumed
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("message_to_send", &self.message_to_send)
            .field("delete_after_first_consumed", &self.delete_after_first_consumed)
            .field("expected_max_response_wait", &self.expected_max_response_wait)
            .finish_non_exhaustive()
    }
}

/// One-shot waiter paired with a request filter.
///
/// Resolves with the consumed frame, or with `Timeout` / `Cancelled` when
/// the deadline elapses or the connection closes first.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<ProviderResult<Message>>,
}

impl Completion {
    pub(crate) fn new(rx: oneshot::Receiver<ProviderResult<Message>>) -> Self {
        Self { rx }
    }

    /// Wait for the filter to be fulfilled.
    pub async fn wait(self) -> ProviderResult<Message> {
        match self.rx.await {
            Ok(outcome) => outcome,
            // Sender dropped without resolving: the registry is gone.
            Err(_) => Err(ProviderError::Cancelled),
        }
    }
}
