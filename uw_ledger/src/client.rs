use std::time::Duration;

use bitcoin::bip32::DerivationPath;
use bitcoin::consensus::encode::{self, VarInt};
use bitcoin::hashes::Hash;
use bitcoin::Transaction;

use crate::{
    apdu::{APDUCmdVec, StatusWord},
    command,
    consts::{DEFAULT_SEQUENCE, MAX_SCRIPT_BLOCK},
    Error,
};

/// Communication layer between the host and the Ledger device.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn exchange(&self, command: &APDUCmdVec) -> Result<(StatusWord, Vec<u8>), Self::Error>;

    /// Select the key scrambling payloads, only meaningful for U2F transports
    fn set_scramble_key(&self, _key: &str) {}

    /// Maximum time to wait for the answer of a single exchange
    fn set_exchange_timeout(&self, timeout: Duration) -> Result<(), Self::Error>;

    /// Release the device, called once when the session ends
    fn close(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub(crate) fn make_request<T: Transport>(
    transport: &T,
    req: &APDUCmdVec,
) -> Result<Vec<u8>, Error> {
    tracing::debug!(
        "\n--->\t{:02x}{:02x}{:02x}{:02x} {}",
        req.cla,
        req.ins,
        req.p1,
        req.p2,
        hex::encode(&req.data)
    );
    let (sw, data) = transport.exchange(req).map_err(Error::transport)?;
    tracing::debug!("\n<---\t{:?} {}", sw, hex::encode(&data));

    if sw != StatusWord::OK {
        Err(Error::Device {
            status: sw,
            command: req.ins,
        })
    } else {
        Ok(data)
    }
}

/// Like [`make_request`] but returns the answer as sent by the device, status word included.
pub(crate) fn make_raw_request<T: Transport>(
    transport: &T,
    req: &APDUCmdVec,
) -> Result<Vec<u8>, Error> {
    let mut answer = make_request(transport, req)?;
    answer.extend_from_slice(&(StatusWord::OK as u16).to_be_bytes());
    Ok(answer)
}

/// A node exported by the Bitcoin app
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletPublicKey {
    /// Uncompressed public key, hex encoded
    pub public_key: String,
    pub bitcoin_address: String,
    /// Hex encoded
    pub chain_code: String,
}

/// A transaction parsed the way the Bitcoin app expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitTransaction {
    tx: Transaction,
    segwit: bool,
}

impl SplitTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Whether it was parsed allowing witness data
    pub fn is_segwit(&self) -> bool {
        self.segwit
    }
}

/// An input to sign: the transaction it spends, which output, and the script to sign with.
#[derive(Debug, Clone)]
pub struct LedgerInput {
    pub transaction: SplitTransaction,
    pub output_index: u32,

    /// Redeem script for legacy inputs, witness script for segwit ones
    pub script_hex: String,

    /// Defaults to [`DEFAULT_SEQUENCE`]
    pub sequence: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SignP2shParams {
    pub inputs: Vec<LedgerInput>,

    /// Derivation paths without the root segment, one per input
    pub associated_keysets: Vec<String>,

    /// Serialized outputs, see [`BtcClient::serialize_transaction_outputs`]
    pub output_script_hex: String,

    pub lock_time: u32,
    pub sighash_type: u8,
    pub segwit: bool,
    pub transaction_version: u32,
}

/// An input as streamed to the device while hashing
#[derive(Debug, Clone)]
struct HashInput {
    /// Previous txid and output index, followed by the amount for segwit
    reference: Vec<u8>,
    script: Vec<u8>,
    sequence: u32,
}

impl HashInput {
    fn without_script(&self) -> Self {
        Self {
            script: vec![],
            ..self.clone()
        }
    }

    /// The script in blocks, the sequence is sent along the last one
    fn script_blocks(&self) -> Vec<Vec<u8>> {
        let sequence = self.sequence.to_le_bytes();
        if self.script.is_empty() {
            return vec![sequence.to_vec()];
        }
        let mut blocks: Vec<Vec<u8>> = self
            .script
            .chunks(MAX_SCRIPT_BLOCK)
            .map(<[u8]>::to_vec)
            .collect();
        if let Some(last) = blocks.last_mut() {
            last.extend_from_slice(&sequence);
        }
        blocks
    }
}

/// BtcClient calls and interprets commands of the legacy Bitcoin app.
pub struct BtcClient<'a, T: Transport> {
    transport: &'a T,
}

impl<'a, T: Transport> BtcClient<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Retrieve the public key at `path`, with `verify` the device asks the user to confirm.
    ///
    /// An empty answer gives an empty [`WalletPublicKey`].
    pub fn get_wallet_public_key(
        &self,
        path: &DerivationPath,
        verify: bool,
    ) -> Result<WalletPublicKey, Error> {
        let cmd = command::get_wallet_public_key(path, verify);
        let data = make_request(self.transport, &cmd)?;
        if data.is_empty() {
            return Ok(WalletPublicKey::default());
        }
        let unexpected = || Error::UnexpectedResult {
            command: cmd.ins,
            data: data.clone(),
        };

        let public_key_len = data[0] as usize;
        let public_key = data.get(1..1 + public_key_len).ok_or_else(unexpected)?;

        let address_start = 1 + public_key_len;
        let address_len = *data.get(address_start).ok_or_else(unexpected)? as usize;
        let address_end = address_start + 1 + address_len;
        let address = data
            .get(address_start + 1..address_end)
            .ok_or_else(unexpected)?;

        let chain_code = data
            .get(address_end..address_end + 32)
            .ok_or_else(unexpected)?;

        Ok(WalletPublicKey {
            public_key: hex::encode(public_key),
            bitcoin_address: String::from_utf8_lossy(address).into_owned(),
            chain_code: hex::encode(chain_code),
        })
    }

    /// Parse a hex encoded transaction, witness data is accepted only if `segwit` is set.
    pub fn split_transaction(
        &self,
        transaction_hex: &str,
        segwit: bool,
    ) -> Result<SplitTransaction, Error> {
        let bytes = hex::decode(transaction_hex)?;
        let tx: Transaction = encode::deserialize(&bytes)?;
        if !segwit && tx.input.iter().any(|i| !i.witness.is_empty()) {
            return Err(Error::UnexpectedWitness);
        }
        Ok(SplitTransaction { tx, segwit })
    }

    /// The outputs section of the transaction: outputs count followed by the outputs
    pub fn serialize_transaction_outputs(&self, tx: &SplitTransaction) -> Vec<u8> {
        encode::serialize(&tx.tx.output)
    }

    /// Sign every input of a transaction spending multisig outputs, returning one hex encoded
    /// DER signature per input.
    ///
    /// Legacy signatures have the sighash byte stripped.
    pub fn sign_p2sh_transaction(&self, params: &SignP2shParams) -> Result<Vec<String>, Error> {
        if params.associated_keysets.len() != params.inputs.len() {
            return Err(Error::PathCountMismatch {
                inputs: params.inputs.len(),
                paths: params.associated_keysets.len(),
            });
        }
        let output_script = hex::decode(&params.output_script_hex)?;
        let version = params.transaction_version.to_le_bytes();

        let mut hash_inputs = Vec::with_capacity(params.inputs.len());
        for (i, input) in params.inputs.iter().enumerate() {
            let tx = input.transaction.transaction();
            let mut reference = tx.compute_txid().to_byte_array().to_vec();
            reference.extend_from_slice(&input.output_index.to_le_bytes());
            if params.segwit {
                let output = tx
                    .output
                    .get(input.output_index as usize)
                    .ok_or(Error::OutputIndexOutOfRange {
                        input: i,
                        index: input.output_index,
                    })?;
                reference.extend_from_slice(&output.value.to_sat().to_le_bytes());
            }
            hash_inputs.push(HashInput {
                reference,
                script: hex::decode(&input.script_hex)?,
                sequence: input.sequence.unwrap_or(DEFAULT_SEQUENCE),
            });
        }

        let mut signatures = Vec::with_capacity(hash_inputs.len());
        if params.segwit {
            let blank: Vec<HashInput> = hash_inputs.iter().map(HashInput::without_script).collect();
            self.start_untrusted_hash(true, &version, &blank, true)?;
            self.hash_output_full(&output_script)?;

            for (input, keyset) in hash_inputs.iter().zip(&params.associated_keysets) {
                self.start_untrusted_hash(false, &version, std::slice::from_ref(input), true)?;
                let signature = self.sign(keyset, params.lock_time, params.sighash_type)?;
                signatures.push(hex::encode(signature));
            }
        } else {
            for (i, keyset) in params.associated_keysets.iter().enumerate() {
                let pseudo: Vec<HashInput> = hash_inputs
                    .iter()
                    .enumerate()
                    .map(|(j, input)| {
                        if i == j {
                            input.clone()
                        } else {
                            input.without_script()
                        }
                    })
                    .collect();
                self.start_untrusted_hash(i == 0, &version, &pseudo, false)?;
                self.hash_output_full(&output_script)?;

                let mut signature = self.sign(keyset, params.lock_time, params.sighash_type)?;
                signature.pop(); // sighash type
                signatures.push(hex::encode(signature));
            }
        }
        Ok(signatures)
    }

    fn start_untrusted_hash(
        &self,
        new_transaction: bool,
        version: &[u8; 4],
        inputs: &[HashInput],
        segwit: bool,
    ) -> Result<(), Error> {
        let send = |first_round: bool, data: Vec<u8>| {
            let cmd = command::untrusted_hash_transaction_input_start(
                first_round,
                new_transaction,
                segwit,
                data,
            );
            make_request(self.transport, &cmd)
        };

        let mut data = version.to_vec();
        data.extend(encode::serialize(&VarInt(inputs.len() as u64)));
        send(true, data)?;

        for input in inputs {
            let mut data = vec![if segwit { 0x02 } else { 0x00 }];
            data.extend_from_slice(&input.reference);
            data.extend(encode::serialize(&VarInt(input.script.len() as u64)));
            send(false, data)?;

            for block in input.script_blocks() {
                send(false, block)?;
            }
        }
        Ok(())
    }

    fn hash_output_full(&self, output_script: &[u8]) -> Result<(), Error> {
        let mut blocks = output_script.chunks(MAX_SCRIPT_BLOCK).peekable();
        while let Some(block) = blocks.next() {
            let last = blocks.peek().is_none();
            make_request(self.transport, &command::hash_output_full(last, block.to_vec()))?;
        }
        Ok(())
    }

    fn sign(&self, keyset: &str, lock_time: u32, sighash_type: u8) -> Result<Vec<u8>, Error> {
        let path = keyset_path(keyset)?;
        let cmd = command::untrusted_hash_sign(&path, lock_time, sighash_type);
        let mut signature = make_request(self.transport, &cmd)?;
        // the device flags the parity of R in the first byte
        if let Some(first) = signature.first_mut() {
            *first = 0x30;
        }
        Ok(signature)
    }
}

/// Parse a derivation path without the root segment, e.g. `45'/0'/0'/0`
fn keyset_path(keyset: &str) -> Result<DerivationPath, Error> {
    if keyset.is_empty() {
        Ok(DerivationPath::master())
    } else {
        Ok(format!("m/{keyset}").parse()?)
    }
}
