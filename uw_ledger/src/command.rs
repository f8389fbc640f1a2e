//! APDU commands for the dashboard and the legacy Bitcoin application.

use bitcoin::bip32::{ChildNumber, DerivationPath};

use super::apdu::{self, APDUCmdVec, BtcCommandCode};

fn path_data(path: &DerivationPath) -> Vec<u8> {
    let child_numbers: &[ChildNumber] = path.as_ref();
    child_numbers
        .iter()
        .fold(vec![child_numbers.len() as u8], |mut acc, &x| {
            acc.extend_from_slice(&u32::from(x).to_be_bytes());
            acc
        })
}

/// Creates the APDU Command to retrieve target id and versions, the dashboard must be open.
pub fn get_device_info() -> APDUCmdVec {
    apdu::apdu_empty(BtcCommandCode::GetDeviceInfo)
}

/// Creates the APDU command to get the public key at the given derivation path, in legacy
/// address format.
///
/// With `verify` the device shows the path and the address and waits for confirmation.
pub fn get_wallet_public_key(path: &DerivationPath, verify: bool) -> APDUCmdVec {
    apdu::apdu(
        BtcCommandCode::GetWalletPublicKey,
        if verify { 0x01 } else { 0x00 },
        0x00,
        path_data(path),
    )
}

/// Creates one of the APDU commands streaming a transaction with its inputs to be hashed.
///
/// `first_round` marks the first chunk of a stream, `new_transaction` a stream starting the
/// signature of a new transaction rather than continuing the current one.
pub fn untrusted_hash_transaction_input_start(
    first_round: bool,
    new_transaction: bool,
    segwit: bool,
    data: Vec<u8>,
) -> APDUCmdVec {
    let p1 = if first_round { 0x00 } else { 0x80 };
    let p2 = match (new_transaction, segwit) {
        (false, _) => 0x80,
        (true, false) => 0x00,
        (true, true) => 0x02,
    };
    apdu::apdu(
        BtcCommandCode::UntrustedHashTransactionInputStart,
        p1,
        p2,
        data,
    )
}

/// Creates one of the APDU commands streaming the serialized outputs, `last` for the final block.
pub fn hash_output_full(last: bool, data: Vec<u8>) -> APDUCmdVec {
    apdu::apdu(
        BtcCommandCode::UntrustedHashTransactionInputFinalizeFull,
        if last { 0x80 } else { 0x00 },
        0x00,
        data,
    )
}

/// Creates the APDU command signing the hashed transaction with the key at `path`.
pub fn untrusted_hash_sign(path: &DerivationPath, lock_time: u32, sighash_type: u8) -> APDUCmdVec {
    let mut data = path_data(path);
    data.push(0x00); // no user validation code
    data.extend_from_slice(&lock_time.to_be_bytes());
    data.push(sighash_type);
    apdu::apdu(BtcCommandCode::UntrustedHashSign, 0x00, 0x00, data)
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn wallet_public_key_command() {
        let path = DerivationPath::from_str("m/45'/0").unwrap();
        let cmd = get_wallet_public_key(&path, true);
        assert_eq!(
            cmd.serialize(),
            vec![0xE0, 0x40, 0x01, 0x00, 0x09, 0x02, 0x80, 0x00, 0x00, 0x2d, 0x00, 0x00, 0x00, 0x00]
        );
        let cmd = get_wallet_public_key(&DerivationPath::master(), false);
        assert_eq!(cmd.p1, 0x00);
        assert_eq!(cmd.data, vec![0x00]);
    }

    #[test]
    fn untrusted_hash_commands() {
        let cmd = untrusted_hash_transaction_input_start(true, true, false, vec![]);
        assert_eq!((cmd.p1, cmd.p2), (0x00, 0x00));
        let cmd = untrusted_hash_transaction_input_start(true, true, true, vec![]);
        assert_eq!((cmd.p1, cmd.p2), (0x00, 0x02));
        let cmd = untrusted_hash_transaction_input_start(false, false, true, vec![]);
        assert_eq!((cmd.p1, cmd.p2), (0x80, 0x80));

        assert_eq!(hash_output_full(true, vec![]).p1, 0x80);
        assert_eq!(hash_output_full(false, vec![]).p1, 0x00);

        let path = DerivationPath::from_str("m/1").unwrap();
        let cmd = untrusted_hash_sign(&path, 0, 1);
        assert_eq!(cmd.ins, 0x48);
        assert_eq!(
            cmd.data,
            vec![0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]
        );
    }
}
