use tokio::sync::watch;

/// Creates a linked notifier/signal pair.
///
/// The host calls [`MountNotifier::mounted`] once the scroll container and
/// anchor elements exist; the sequencer awaits [`MountSignal::wait`].
#[must_use]
pub fn mount_signal() -> (MountNotifier, MountSignal) {
    let (tx, rx) = watch::channel(false);
    (MountNotifier { tx }, MountSignal { rx })
}

/// Host side of the mount signal.
#[derive(Debug)]
pub struct MountNotifier {
    tx: watch::Sender<bool>,
}

impl MountNotifier {
    /// Marks the anchors as present. Idempotent.
    pub fn mounted(&self) {
        self.tx.send_replace(true);
    }

    /// Marks the anchors as gone (e.g. on route change).
    pub fn unmounted(&self) {
        self.tx.send_replace(false);
    }
}

/// Sequencer side of the mount signal.
#[derive(Debug, Clone)]
pub struct MountSignal {
    rx: watch::Receiver<bool>,
}

impl MountSignal {
    /// A signal that reports mounted forever. For hosts without a mount
    /// lifecycle.
    #[must_use]
    pub fn already_mounted() -> Self {
        let (_, rx) = watch::channel(true);
        Self { rx }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the host reports mounted. Stays pending if the notifier
    /// is dropped first; callers bound it with a timeout.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|mounted| *mounted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
