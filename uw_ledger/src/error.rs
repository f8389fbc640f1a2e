use crate::apdu::StatusWord;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport failed, e.g. the device is not connected
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The device answered with an error status, e.g. the user rejected the request
    #[error("Ledger device returned {status:?} for command {command:#04x}")]
    Device { command: u8, status: StatusWord },

    #[error("Unexpected result for command {command:#04x}: {data:?}")]
    UnexpectedResult { command: u8, data: Vec<u8> },

    #[error("Unable to parse metadata from Ledger device.")]
    MetadataDecode,

    #[error("Received no public key from Ledger device.")]
    MissingPublicKey,

    #[error("Unable to compress public key from Ledger device.")]
    PublicKeyCompression,

    #[error("Expected one BIP32 path per input, got {paths} paths for {inputs} inputs")]
    PathCountMismatch { inputs: usize, paths: usize },

    #[error("Output {index} does not exist in the transaction spent by input {input}")]
    OutputIndexOutOfRange { input: usize, index: u32 },

    #[error("Input {0} has no script to sign with")]
    MissingScript(usize),

    #[error("Transaction has witness data but segwit parsing was not requested")]
    UnexpectedWitness,

    #[error("A session with the Ledger device is already active")]
    SessionActive,

    #[error(transparent)]
    Common(#[from] uw_common::Error),

    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Encode(#[from] bitcoin::consensus::encode::Error),

    #[error(transparent)]
    Address(#[from] bitcoin::address::ParseError),

    #[error(transparent)]
    Bip32(#[from] bitcoin::bip32::Error),
}

impl Error {
    /// Wrap an error coming from a [`crate::Transport`]
    pub fn transport<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport(Box::new(e))
    }
}
