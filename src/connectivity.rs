use tokio::sync::watch;
use tracing::info;

pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Online flag fed by the host (OS network events, a health probe, ...).
/// Receivers from [`OnlineFlag::subscribe`] see each online/offline
/// transition.
pub struct OnlineFlag {
    tx: watch::Sender<bool>,
}

impl OnlineFlag {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    /// Returns true when the value changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            if online {
                info!("network restored");
            } else {
                info!("network offline; remote sync paused");
            }
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Connectivity for OnlineFlag {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transitions_notify() {
        let flag = OnlineFlag::new(false);
        let mut rx = flag.subscribe();

        assert!(!flag.set_online(false));
        assert!(!rx.has_changed().unwrap());

        assert!(flag.set_online(true));
        assert!(flag.is_online());
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
    }
}
