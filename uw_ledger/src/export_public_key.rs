use uw_common::{compress_public_key, Bip32Path, Interaction, Message};

use crate::client::WalletPublicKey;
use crate::interaction::{bitcoin_messages, path_warning_messages};
use crate::session::{Connect, Ledger};
use crate::Error;

/// Returns the HD node at a BIP32 path, the device shows the path and asks for confirmation.
pub struct ExportHdNode<'a, C: Connect> {
    ledger: &'a Ledger<C>,
    bip32_path: Bip32Path,
}

impl<'a, C: Connect> ExportHdNode<'a, C> {
    pub fn new(ledger: &'a Ledger<C>, bip32_path: Bip32Path) -> Self {
        Self { ledger, bip32_path }
    }

    pub fn bip32_path(&self) -> &Bip32Path {
        &self.bip32_path
    }
}

impl<C: Connect> Interaction for ExportHdNode<'_, C> {
    type Output = WalletPublicKey;
    type Error = Error;

    fn messages(&self) -> Vec<Message> {
        let mut messages = bitcoin_messages();
        messages.extend(path_warning_messages(&self.bip32_path));
        messages
    }

    fn run(&self) -> Result<WalletPublicKey, Error> {
        self.ledger.with_app(|app, _| {
            app.get_wallet_public_key(self.bip32_path.derivation_path(), true)
        })
    }
}

/// Returns the compressed public key at a BIP32 path, hex encoded.
///
/// ```no_run
/// use uw_ledger::{ExportPublicKey, Interaction, Ledger, TcpConnector};
///
/// let ledger = Ledger::new(TcpConnector::new(9999));
/// let interaction = ExportPublicKey::new(&ledger, "m/48'/0'/0'/2'/0".parse()?);
/// let public_key = interaction.run()?; // "03..."
/// # Ok::<(), uw_ledger::Error>(())
/// ```
pub struct ExportPublicKey<'a, C: Connect> {
    node: ExportHdNode<'a, C>,
}

impl<'a, C: Connect> ExportPublicKey<'a, C> {
    pub fn new(ledger: &'a Ledger<C>, bip32_path: Bip32Path) -> Self {
        Self {
            node: ExportHdNode::new(ledger, bip32_path),
        }
    }
}

impl<C: Connect> Interaction for ExportPublicKey<'_, C> {
    type Output = String;
    type Error = Error;

    fn messages(&self) -> Vec<Message> {
        self.node.messages()
    }

    fn run(&self) -> Result<String, Error> {
        parse_public_key(&self.node.run()?.public_key)
    }
}

/// Compress a public key exported by the device.
pub fn parse_public_key(public_key: &str) -> Result<String, Error> {
    if public_key.is_empty() {
        return Err(Error::MissingPublicKey);
    }
    compress_public_key(public_key).map_err(|e| {
        tracing::error!("failed to compress public key {public_key}: {e}");
        Error::PublicKeyCompression
    })
}

#[cfg(test)]
mod test {
    use uw_common::{FirmwareVersion, Level, MessageFilter};

    use super::*;
    use crate::apdu::StatusWord;
    use crate::mock::MockDevice;

    const UNCOMPRESSED_G: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";
    const COMPRESSED_G: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const ADDRESS: &str = "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm";

    fn wallet_public_key_answer(public_key: &str) -> Vec<u8> {
        let public_key = hex::decode(public_key).unwrap();
        let mut data = vec![public_key.len() as u8];
        data.extend_from_slice(&public_key);
        data.push(ADDRESS.len() as u8);
        data.extend_from_slice(ADDRESS.as_bytes());
        data.extend_from_slice(&[0x11; 32]);
        data
    }

    #[test]
    fn export_hd_node() {
        let device = MockDevice::new();
        device.respond(0x40, StatusWord::OK, wallet_public_key_answer(UNCOMPRESSED_G));
        let ledger = device.ledger();

        let node = ExportHdNode::new(&ledger, "m/45'/0".parse().unwrap())
            .run()
            .unwrap();
        assert_eq!(node.public_key, UNCOMPRESSED_G);
        assert_eq!(node.bitcoin_address, ADDRESS);
        assert_eq!(node.chain_code, "11".repeat(32));

        let sent = device.sent_ins(0x40);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].p1, 0x01);
        assert_eq!(
            sent[0].data,
            vec![0x02, 0x80, 0x00, 0x00, 0x2d, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn export_public_key() {
        let device = MockDevice::new();
        device.respond(0x40, StatusWord::OK, wallet_public_key_answer(UNCOMPRESSED_G));
        let ledger = device.ledger();

        let public_key = ExportPublicKey::new(&ledger, "m/48'/0'/0'/2'/0".parse().unwrap())
            .run()
            .unwrap();
        assert_eq!(public_key, COMPRESSED_G);
        assert_eq!(public_key.len(), 66);
        assert_eq!(device.closes(), 1);
    }

    #[test]
    fn missing_public_key() {
        let device = MockDevice::new();
        let ledger = device.ledger();

        let err = ExportPublicKey::new(&ledger, "m/0".parse().unwrap())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::MissingPublicKey));
        assert_eq!(err.to_string(), "Received no public key from Ledger device.");
    }

    #[test]
    fn invalid_public_key() {
        let device = MockDevice::new();
        device.respond(0x40, StatusWord::OK, wallet_public_key_answer(&"04".repeat(65)));
        let ledger = device.ledger();

        let err = ExportPublicKey::new(&ledger, "m/0".parse().unwrap())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::PublicKeyCompression));
    }

    #[test]
    fn truncated_answer() {
        let device = MockDevice::new();
        let mut answer = wallet_public_key_answer(UNCOMPRESSED_G);
        answer.truncate(70);
        device.respond(0x40, StatusWord::OK, answer);
        let ledger = device.ledger();

        let err = ExportHdNode::new(&ledger, "m/0".parse().unwrap())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedResult { command: 0x40, .. }));
    }

    #[test]
    fn rejected_by_user() {
        let device = MockDevice::new();
        device.respond(0x40, StatusWord::Deny, vec![]);
        let ledger = device.ledger();

        let err = ExportPublicKey::new(&ledger, "m/0".parse().unwrap())
            .run()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Device {
                command: 0x40,
                status: StatusWord::Deny
            }
        ));
    }

    #[test]
    fn parse() {
        assert_eq!(parse_public_key(UNCOMPRESSED_G).unwrap(), COMPRESSED_G);
        assert_eq!(parse_public_key(COMPRESSED_G).unwrap(), COMPRESSED_G);
        assert!(matches!(parse_public_key(""), Err(Error::MissingPublicKey)));
        assert!(matches!(
            parse_public_key("zz"),
            Err(Error::PublicKeyCompression)
        ));
    }

    #[test]
    fn messages() {
        let device = MockDevice::new();
        let ledger = device.ledger();
        let interaction = ExportPublicKey::new(&ledger, "m/48'/0'/0'/2'/0".parse().unwrap());

        let messages = interaction.messages();
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[3].code, "ledger.app.bitcoin");

        let warnings = MessageFilter::new().level(Level::Warning);
        assert_eq!(interaction.messages_for(&warnings).len(), 2);

        let new_firmware = warnings.version(FirmwareVersion::new(2, 0, 1));
        let warning = interaction.message_for(&new_firmware).unwrap();
        assert_eq!(warning.steps.len(), 6);
        assert!(warning.steps[1].text.contains("m/48'/0'/0'/2'/0"));
    }
}
