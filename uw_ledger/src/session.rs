use std::sync::{Mutex, TryLockError};

use crate::{client::Transport, BtcClient, Error};

/// Opens a fresh [`Transport`] to a device.
pub trait Connect {
    type Transport: Transport;

    fn connect(&self) -> Result<Self::Transport, Error>;
}

/// A Ledger device reachable through a [`Connect`]or.
///
/// A transport is opened for the duration of a single closure and closed when the closure
/// returns, whatever its outcome. At most one session is active at a time: a second session
/// started while one is active fails with [`Error::SessionActive`].
#[derive(Debug)]
pub struct Ledger<C: Connect> {
    connector: C,
    session: Mutex<()>,
}

impl<C: Connect> Ledger<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            session: Mutex::new(()),
        }
    }

    /// Run `f` with a newly opened transport
    pub fn with_transport<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&C::Transport) -> Result<R, Error>,
    {
        let _active = match self.session.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(Error::SessionActive),
        };
        let transport = Scoped(self.connector.connect()?);
        f(&transport.0)
    }

    /// Run `f` with a Bitcoin app client over a newly opened transport
    pub fn with_app<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&BtcClient<'_, C::Transport>, &C::Transport) -> Result<R, Error>,
    {
        self.with_transport(|transport| {
            let app = BtcClient::new(transport);
            f(&app, transport)
        })
    }
}

/// Closes the transport when dropped
struct Scoped<T: Transport>(T);

impl<T: Transport> Drop for Scoped<T> {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            tracing::warn!("error closing Ledger transport: {e}");
        }
    }
}
