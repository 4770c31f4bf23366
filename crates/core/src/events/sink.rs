//! Event sinks.

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::LedgerEvent;

/// Receives ledger events after commit.
///
/// `publish` must not block and must not fail the caller: the voucher is
/// already committed when it runs.
pub trait LedgerEventSink: Send + Sync {
    /// Publishes one event.
    fn publish(&self, event: &LedgerEvent);
}

/// Logs every event through `tracing`. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl LedgerEventSink for TracingEventSink {
    fn publish(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::VoucherPosted {
                voucher_id,
                number,
                total,
                accounts,
                ..
            } => info!(
                event = event.name(),
                %voucher_id,
                %number,
                %total,
                accounts = accounts.len(),
                "Voucher posted"
            ),
            LedgerEvent::VoucherReversed {
                voucher_id,
                reversal_voucher_id,
                reason,
                ..
            } => info!(
                event = event.name(),
                %voucher_id,
                %reversal_voucher_id,
                %reason,
                "Voucher reversed"
            ),
        }
    }
}

/// Forwards events to a bounded channel.
///
/// Uses `try_send`; when the channel is full or the receiver is gone the
/// event is dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::Sender<LedgerEvent>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiving end of its channel.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LedgerEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl LedgerEventSink for ChannelEventSink {
    fn publish(&self, event: &LedgerEvent) {
        if let Err(err) = self.tx.try_send(event.clone()) {
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "channel full",
                mpsc::error::TrySendError::Closed(_) => "channel closed",
            };
            warn!(
                event = event.name(),
                voucher_id = %event.voucher_id(),
                reason,
                "Dropping ledger event"
            );
        }
    }
}
