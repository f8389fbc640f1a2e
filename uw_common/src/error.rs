#[allow(missing_docs)]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid BIP32 path '{path}': {reason}")]
    InvalidBip32Path { path: String, reason: String },

    #[error("Invalid network '{0}', possible values are: 'mainnet', 'testnet', 'regtest'")]
    InvalidNetwork(String),

    #[error("Invalid multisig: {0}")]
    InvalidMultisig(String),

    #[error("Invalid firmware version '{0}'")]
    InvalidFirmwareVersion(String),

    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),

    #[error(transparent)]
    P2sh(#[from] bitcoin::address::P2shError),
}
