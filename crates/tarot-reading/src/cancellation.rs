use tokio::sync::watch;

/// A "close requested" signal threaded through the orchestrator so a client
/// closing its SSE connection can cooperatively stop in-flight subtasks at
/// their next await point (spec §5 Cancellation; §C supplement 4). Grounded
/// in the teacher's paired start/done signal convention
/// (`gameroom::room::Room` coordinating via channels rather than polling a
/// flag directly), generalized here to a broadcastable boolean since many
/// concurrent per-card tasks must observe the same cancellation.
#[derive(Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

/// The orchestrator-held half; dropping it (or calling `cancel`) tells every
/// clone of the paired `CancellationToken` to stop.
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

pub fn cancellation_pair() -> (CancellationHandle, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (CancellationHandle { tx }, CancellationToken { rx })
}

impl CancellationHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_observed_by_every_clone() {
        let (handle, token) = cancellation_pair();
        let other = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(other.is_cancelled());
    }
}
