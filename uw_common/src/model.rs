use bitcoin::Txid;

use crate::Multisig;

/// An unspent multisig output to be spent by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoInput {
    pub txid: Txid,

    /// Index of the output in the transaction `txid`
    pub index: u32,

    /// The whole transaction `txid`, hex encoded
    pub transaction_hex: String,

    pub multisig: Multisig,
    pub amount_sats: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    pub address: String,
    pub amount_sats: u64,
}
