use std::str::FromStr;
use std::time::Duration;

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use uw_common::{
    Bip32Path, Interaction, Message, MultisigAddressType, Network, TransactionOutput, UtxoInput,
};

use crate::client::{BtcClient, LedgerInput, SignP2shParams, Transport};
use crate::consts::{DEFAULT_SEQUENCE, LOCK_TIME, OUTPUT_REVIEW_TIMEOUT, SIGHASH_ALL, TX_VERSION};
use crate::interaction::bitcoin_messages;
use crate::session::{Connect, Ledger};
use crate::Error;

/// Signs every input of a transaction spending multisig outputs, with the key at the BIP32 path
/// given for that input.
///
/// Returns one DER signature per input, hex encoded, in input order.
pub struct SignMultisigTransaction<'a, C: Connect> {
    ledger: &'a Ledger<C>,
    network: Network,
    inputs: Vec<UtxoInput>,
    outputs: Vec<TransactionOutput>,
    bip32_paths: Vec<Bip32Path>,
}

impl<'a, C: Connect> SignMultisigTransaction<'a, C> {
    pub fn new(
        ledger: &'a Ledger<C>,
        network: Network,
        inputs: Vec<UtxoInput>,
        outputs: Vec<TransactionOutput>,
        bip32_paths: Vec<Bip32Path>,
    ) -> Self {
        Self {
            ledger,
            network,
            inputs,
            outputs,
            bip32_paths,
        }
    }

    /// The inputs as expected by [`BtcClient::sign_p2sh_transaction`]: the spent transaction,
    /// the output index, and the redeem script for P2SH or the witness script otherwise
    pub fn ledger_inputs<T: Transport>(
        &self,
        app: &BtcClient<'_, T>,
    ) -> Result<Vec<LedgerInput>, Error> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let multisig = &input.multisig;
                let script = match multisig.address_type() {
                    MultisigAddressType::P2sh => multisig.redeem_script(),
                    MultisigAddressType::P2shP2wsh | MultisigAddressType::P2wsh => {
                        multisig.witness_script()
                    }
                }
                .ok_or(Error::MissingScript(i))?;
                Ok(LedgerInput {
                    transaction: app.split_transaction(&input.transaction_hex, true)?,
                    output_index: input.index,
                    script_hex: hex::encode(script.as_bytes()),
                    sequence: None,
                })
            })
            .collect()
    }

    /// The BIP32 paths without the root segment
    pub fn ledger_keysets(&self) -> Vec<String> {
        self.bip32_paths.iter().map(Bip32Path::device_path).collect()
    }

    /// The serialized outputs section of the unsigned transaction, hex encoded
    pub fn ledger_output_script_hex<T: Transport>(
        &self,
        app: &BtcClient<'_, T>,
    ) -> Result<String, Error> {
        let network = self.network.bitcoin_network();
        let output = self
            .outputs
            .iter()
            .map(|o| {
                let address = Address::from_str(&o.address)?.require_network(network)?;
                Ok(TxOut {
                    value: Amount::from_sat(o.amount_sats),
                    script_pubkey: address.script_pubkey(),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let input = self
            .inputs
            .iter()
            .map(|i| TxIn {
                previous_output: OutPoint::new(i.txid, i.index),
                script_sig: ScriptBuf::new(),
                sequence: Sequence(DEFAULT_SEQUENCE),
                witness: Witness::new(),
            })
            .collect();
        let tx = Transaction {
            version: Version(TX_VERSION as i32),
            lock_time: LockTime::from_consensus(LOCK_TIME),
            input,
            output,
        };

        let split = app.split_transaction(&serialize_hex(&tx), self.any_segwit_inputs())?;
        Ok(hex::encode(app.serialize_transaction_outputs(&split)))
    }

    pub fn any_segwit_inputs(&self) -> bool {
        self.inputs.iter().any(|i| i.multisig.address_type().is_segwit())
    }

    /// Leaves the user time to review every output on the device
    pub fn exchange_timeout(&self) -> Duration {
        OUTPUT_REVIEW_TIMEOUT * self.outputs.len() as u32
    }
}

impl<C: Connect> Interaction for SignMultisigTransaction<'_, C> {
    type Output = Vec<String>;
    type Error = Error;

    fn messages(&self) -> Vec<Message> {
        bitcoin_messages()
    }

    fn run(&self) -> Result<Vec<String>, Error> {
        if self.bip32_paths.len() != self.inputs.len() {
            return Err(Error::PathCountMismatch {
                inputs: self.inputs.len(),
                paths: self.bip32_paths.len(),
            });
        }
        self.ledger.with_app(|app, transport| {
            transport
                .set_exchange_timeout(self.exchange_timeout())
                .map_err(Error::transport)?;
            let params = SignP2shParams {
                inputs: self.ledger_inputs(app)?,
                associated_keysets: self.ledger_keysets(),
                output_script_hex: self.ledger_output_script_hex(app)?,
                lock_time: LOCK_TIME,
                sighash_type: SIGHASH_ALL,
                segwit: self.any_segwit_inputs(),
                transaction_version: TX_VERSION,
            };
            app.sign_p2sh_transaction(&params)
        })
    }
}
