use std::time::Duration;

use ledger_transport_hid::{hidapi::HidApi, LedgerHIDError, TransportNativeHID};

use crate::apdu::APDUCmdVec;
use crate::session::Connect;
use crate::{apdu::StatusWord, client::Transport, Error};

/// Transport with the Ledger device.
pub struct TransportHID(TransportNativeHID);

impl TransportHID {
    pub fn new(t: TransportNativeHID) -> Self {
        Self(t)
    }
}

impl Transport for TransportHID {
    type Error = LedgerHIDError;

    fn exchange(&self, cmd: &APDUCmdVec) -> Result<(StatusWord, Vec<u8>), Self::Error> {
        self.0.exchange(cmd).map(|answer| {
            (
                StatusWord::from_retcode(answer.retcode()),
                answer.data().to_vec(),
            )
        })
    }

    fn set_exchange_timeout(&self, timeout: Duration) -> Result<(), Self::Error> {
        tracing::debug!("HID reads use a fixed timeout, ignoring {timeout:?}");
        Ok(())
    }
}

/// Opens a [`TransportHID`] to the first Ledger device plugged in.
#[derive(Debug, Default, Clone, Copy)]
pub struct HidConnector;

impl Connect for HidConnector {
    type Transport = TransportHID;

    fn connect(&self) -> Result<TransportHID, Error> {
        let api = HidApi::new().map_err(Error::transport)?;
        let transport = TransportNativeHID::new(&api).map_err(Error::transport)?;
        Ok(TransportHID::new(transport))
    }
}
