#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! A crate containing common code used by the hardware wallet crates in the workspace, such as:
//!
//!  * [`Interaction`] trait and [`Message`]s: the lifecycle contract every device operation
//!    implements, reporting human readable guidance to the caller.
//!  * [`Bip32Path`], [`Network`], [`Multisig`] and the transaction models consumed by signing
//!    flows.
//!  * [`compress_public_key()`] to normalize public keys exported by devices.
//!
//!  To avoid circular dependencies this crate must not depend on other crate of the workspace

mod error;
mod interaction;
mod keys;
mod model;
mod multisig;
mod network;
mod path;

pub use crate::error::Error;
pub use crate::interaction::{
    keystore_messages, FirmwareVersion, Interaction, Level, Message, MessageFilter, State, Step,
};
pub use crate::keys::compress_public_key;
pub use crate::model::{TransactionOutput, UtxoInput};
pub use crate::multisig::{Multisig, MultisigAddressType};
pub use crate::network::Network;
pub use crate::path::Bip32Path;

pub type Result<T> = std::result::Result<T, Error>;
