#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Interactions with Ledger hardware wallets running the legacy Bitcoin app: device metadata,
//! public key export and multisig transaction signing.
//!
//! Every operation implements [`Interaction`]: [`Interaction::messages()`] describes what the
//! user should do with the device and [`Interaction::run()`] talks to it through a [`Ledger`].
//!
//! ```no_run
//! use uw_ledger::{ExportPublicKey, Interaction, Ledger, TcpConnector};
//!
//! let ledger = Ledger::new(TcpConnector::new(9999));
//! let interaction = ExportPublicKey::new(&ledger, "m/48'/0'/0'/2'/0".parse()?);
//! for message in interaction.messages() {
//!     println!("{}", message.text);
//! }
//! let public_key = interaction.run()?;
//! # Ok::<(), uw_ledger::Error>(())
//! ```

mod apdu;
mod client;
mod command;
pub mod consts;
mod error;
mod export_public_key;
mod get_metadata;
pub mod interaction;
mod metadata;
mod session;
mod sign_multisig;
mod transport_tcp;

#[cfg(feature = "serial")]
mod transport_hid;

#[cfg(test)]
mod mock;

pub use apdu::{APDUCmdVec, BtcCommandCode, StatusWord};
pub use client::{
    BtcClient, LedgerInput, SignP2shParams, SplitTransaction, Transport, WalletPublicKey,
};
pub use error::Error;
pub use export_public_key::{parse_public_key, ExportHdNode, ExportPublicKey};
pub use get_metadata::GetMetadata;
pub use metadata::{decode_metadata, model_name, DeviceMetadata, McuVersion, Version};
pub use session::{Connect, Ledger};
pub use sign_multisig::SignMultisigTransaction;
pub use transport_tcp::{TcpConnector, TransportTcp};

#[cfg(feature = "serial")]
pub use transport_hid::{HidConnector, TransportHID};

pub use uw_common::{Interaction, Message, MessageFilter};

pub type Result<T> = std::result::Result<T, Error>;
