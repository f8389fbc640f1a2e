use uw_common::{Interaction, Message};

use crate::client::{make_raw_request, Transport};
use crate::consts::DASHBOARD_SCRAMBLE_KEY;
use crate::interaction::dashboard_messages;
use crate::metadata::{decode_metadata, DeviceMetadata};
use crate::session::{Connect, Ledger};
use crate::{command, Error};

/// Returns the model, firmware and MCU versions of the device.
///
/// The device must show the dashboard, with the Bitcoin app open the query is rejected.
///
/// ```no_run
/// use uw_ledger::{GetMetadata, Interaction, Ledger, TcpConnector};
///
/// let ledger = Ledger::new(TcpConnector::new(9999));
/// let metadata = GetMetadata::new(&ledger).run()?;
/// println!("{}", metadata.spec); // Nano S v1.4.2 (MCU v1.7)
/// # Ok::<(), uw_ledger::Error>(())
/// ```
pub struct GetMetadata<'a, C: Connect> {
    ledger: &'a Ledger<C>,
}

impl<'a, C: Connect> GetMetadata<'a, C> {
    pub fn new(ledger: &'a Ledger<C>) -> Self {
        Self { ledger }
    }
}

impl<C: Connect> Interaction for GetMetadata<'_, C> {
    type Output = DeviceMetadata;
    type Error = Error;

    fn messages(&self) -> Vec<Message> {
        dashboard_messages()
    }

    fn run(&self) -> Result<DeviceMetadata, Error> {
        self.ledger.with_transport(|transport| {
            transport.set_scramble_key(DASHBOARD_SCRAMBLE_KEY);
            let response = make_raw_request(transport, &command::get_device_info())?;
            decode_metadata(&response)
        })
    }
}
