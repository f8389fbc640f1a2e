use bitcoin::opcodes::all::OP_CHECKMULTISIG;
use bitcoin::script::{Builder, Script, ScriptBuf};
use bitcoin::{Address, PublicKey};

use crate::{Error, Network};

/// Maximum number of keys in a multisig script
pub const MAX_MULTISIG_KEYS: usize = 15;

/// The way a multisig script is locked in an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultisigAddressType {
    /// Legacy pay to script hash
    P2sh,
    /// Segwit wrapped in pay to script hash
    P2shP2wsh,
    /// Native segwit pay to witness script hash
    P2wsh,
}

impl MultisigAddressType {
    pub fn is_segwit(&self) -> bool {
        match self {
            MultisigAddressType::P2sh => false,
            MultisigAddressType::P2shP2wsh | MultisigAddressType::P2wsh => true,
        }
    }
}

/// A multisig output: the bare `OP_m <keys> OP_n OP_CHECKMULTISIG` script and how it is locked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Multisig {
    address_type: MultisigAddressType,
    script: ScriptBuf,
}

impl Multisig {
    /// Build the `required`-of-`public_keys.len()` multisig, keys are kept in the given order.
    pub fn from_public_keys(
        address_type: MultisigAddressType,
        required: usize,
        public_keys: &[PublicKey],
    ) -> Result<Self, Error> {
        let total = public_keys.len();
        if required == 0 {
            return Err(Error::InvalidMultisig("required cannot be 0".into()));
        } else if required > total {
            return Err(Error::InvalidMultisig(
                "required cannot be greater than the number of keys".into(),
            ));
        } else if total > MAX_MULTISIG_KEYS {
            return Err(Error::InvalidMultisig(format!(
                "at most {MAX_MULTISIG_KEYS} keys are supported"
            )));
        }

        let builder = public_keys
            .iter()
            .fold(Builder::new().push_int(required as i64), |b, pk| {
                b.push_key(pk)
            });
        let script = builder
            .push_int(total as i64)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script();
        Ok(Self {
            address_type,
            script,
        })
    }

    /// Wrap an existing multisig script
    pub fn from_script(
        address_type: MultisigAddressType,
        script: ScriptBuf,
    ) -> Result<Self, Error> {
        if script.as_bytes().last() != Some(&OP_CHECKMULTISIG.to_u8()) {
            return Err(Error::InvalidMultisig(
                "script does not end with OP_CHECKMULTISIG".into(),
            ));
        }
        Ok(Self {
            address_type,
            script,
        })
    }

    pub fn from_hex(address_type: MultisigAddressType, script_hex: &str) -> Result<Self, Error> {
        Self::from_script(address_type, ScriptBuf::from_bytes(hex::decode(script_hex)?))
    }

    pub fn address_type(&self) -> MultisigAddressType {
        self.address_type
    }

    /// The bare multisig script
    pub fn multisig_script(&self) -> &Script {
        &self.script
    }

    /// The script revealed in the script sig, if any
    ///
    /// For P2SH it is the multisig script itself, for P2SH-P2WSH the witness program.
    pub fn redeem_script(&self) -> Option<ScriptBuf> {
        match self.address_type {
            MultisigAddressType::P2sh => Some(self.script.clone()),
            MultisigAddressType::P2shP2wsh => Some(self.script.to_p2wsh()),
            MultisigAddressType::P2wsh => None,
        }
    }

    /// The script revealed in the witness, if any
    pub fn witness_script(&self) -> Option<ScriptBuf> {
        match self.address_type {
            MultisigAddressType::P2sh => None,
            MultisigAddressType::P2shP2wsh | MultisigAddressType::P2wsh => {
                Some(self.script.clone())
            }
        }
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        match self.address_type {
            MultisigAddressType::P2sh => self.script.to_p2sh(),
            MultisigAddressType::P2shP2wsh => self.script.to_p2wsh().to_p2sh(),
            MultisigAddressType::P2wsh => self.script.to_p2wsh(),
        }
    }

    pub fn address(&self, network: Network) -> Result<Address, Error> {
        let network = network.bitcoin_network();
        Ok(match self.address_type {
            MultisigAddressType::P2sh => Address::p2sh(&self.script, network)?,
            MultisigAddressType::P2shP2wsh => Address::p2shwsh(&self.script, network),
            MultisigAddressType::P2wsh => Address::p2wsh(&self.script, network),
        })
    }
}
