//! Decoding of the device info returned by the dashboard.
//!
//! Layout of the answer, followed by the status word:
//!
//! | field            | size      |
//! |------------------|-----------|
//! | target id        | 4, BE     |
//! | se version len N | 1         |
//! | se version       | N, ASCII  |
//! | flags len F      | 1         |
//! | flags            | F         |
//! | MCU version len  | 1         |
//! | MCU version      | M, ASCII, optionally NUL terminated |
//!
//! A device answering with `N == 0` is unversioned, the rest of the answer is ignored.
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::Error;

const MANAGER_ALLOWED_FLAG: u8 = 0x08;
const PIN_VALIDATED_FLAG: u8 = 0x80;

const OSU_MARKER: &str = "-osu";
const UNVERSIONED: &str = "0.0.0";

const DEFAULT_PROVIDER: u32 = 1;
const PROVIDERS: [(&str, u32); 5] = [
    ("", 1),
    ("das", 2),
    ("club", 3),
    ("shitcoins", 4),
    ("ee", 5),
];

// +-----------------+------------+
// |    Firmware     | Target ID  |
// +-----------------+------------+
// | Nano S <= 1.3.1 | 0x31100002 |
// | Nano S 1.4.x    | 0x31100003 |
// | Nano S 1.5.x    | 0x31100004 |
// | Blue 2.0.x      | 0x31000002 |
// | Blue 2.1.x      | 0x31000004 |
// | Blue 2.1.x V2   | 0x31010004 |
// | Nano X          | 0x33000004 |
// | MCU,any version | 0x01000001 |
// +-----------------+------------+
//
// Order matters: high to low minimum target id, first match wins.
const MODEL_RANGES: [(u32, &str); 4] = [
    (0x33000004, "Nano X"),
    (0x31100002, "Nano S"),
    (0x31100002, "Blue"),
    (0x01000001, "MCU"),
];
const UNKNOWN_MODEL: &str = "Unknown";

/// Secure element firmware version, components are missing if absent from the string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: Option<String>,
    pub minor: Option<String>,
    pub patch: Option<String>,
    pub string: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McuVersion {
    pub major: Option<String>,
    pub minor: Option<String>,
    pub string: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    /// Summary like `Nano S v1.4.2 (MCU v1.7)`
    pub spec: String,
    pub model: String,
    pub version: Version,
    pub mcu_version: McuVersion,
}

/// The model name of a target id.
pub fn model_name(target_id: u32) -> &'static str {
    if target_id == 0 {
        return UNKNOWN_MODEL;
    }
    MODEL_RANGES
        .iter()
        .find(|(min_target_id, _)| target_id >= *min_target_id)
        .map_or(UNKNOWN_MODEL, |(_, model)| *model)
}

/// Decode the raw answer to the dashboard device info query, status word included.
pub fn decode_metadata(response: &[u8]) -> Result<DeviceMetadata, Error> {
    match DeviceInfo::parse(response) {
        Ok(info) => Ok(info.metadata()),
        Err(e) => {
            tracing::error!("failed to decode device info {}: {e}", hex::encode(response));
            Err(Error::MetadataDecode)
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DecodeError {
    #[error("answer too short, missing {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

struct Cursor<'a> {
    data: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.data.len() < len {
            return Err(DecodeError::Missing(field));
        }
        let (taken, rest) = self.data.split_at(len);
        self.data = rest;
        Ok(taken)
    }

    fn len_prefix(&mut self, field: &'static str) -> Result<usize, DecodeError> {
        Ok(self.take(1, field)?[0] as usize)
    }

    fn string(&mut self, len: usize, field: &'static str) -> Result<String, DecodeError> {
        Ok(String::from_utf8(self.take(len, field)?.to_vec())?)
    }
}

/// Everything the dashboard tells about the device, only part of it ends up in
/// [`DeviceMetadata`]
#[derive(Debug, PartialEq, Eq)]
struct DeviceInfo {
    target_id: u32,
    se_version: String,
    flags: Vec<u8>,
    mcu_version: String,
}

impl DeviceInfo {
    fn parse(response: &[u8]) -> Result<Self, DecodeError> {
        let data = response
            .len()
            .checked_sub(2)
            .map(|len| &response[..len])
            .ok_or(DecodeError::Missing("status word"))?;
        let mut cursor = Cursor { data };

        let target_id = BigEndian::read_u32(cursor.take(4, "target id")?);
        let se_version_len = cursor.len_prefix("firmware version length")?;
        if se_version_len == 0 {
            return Ok(Self {
                target_id,
                se_version: UNVERSIONED.to_string(),
                flags: vec![],
                mcu_version: String::new(),
            });
        }
        let se_version = cursor.string(se_version_len, "firmware version")?;

        let flags_len = cursor.len_prefix("flags length")?;
        let flags = cursor.take(flags_len, "flags")?.to_vec();

        let mcu_version_len = cursor.len_prefix("MCU version length")?;
        let mut mcu_version = cursor.take(mcu_version_len, "MCU version")?;
        if let Some((&0, terminated)) = mcu_version.split_last() {
            mcu_version = terminated;
        }
        let mcu_version = String::from_utf8(mcu_version.to_vec())?;

        Ok(Self {
            target_id,
            se_version,
            flags,
            mcu_version,
        })
    }

    /// Firmware updates run in OSU mode
    fn is_osu(&self) -> bool {
        self.se_version.contains(OSU_MARKER)
    }

    fn version(&self) -> String {
        self.se_version.replacen(OSU_MARKER, "", 1)
    }

    /// Taken from the suffix of the version, e.g. `1.4.2-das`
    fn provider_id(&self) -> u32 {
        let name = self
            .se_version
            .split_once('-')
            .filter(|(number, _)| number.chars().any(|c| c.is_ascii_digit()))
            .map_or("", |(_, name)| name);
        PROVIDERS
            .iter()
            .find(|(provider, _)| *provider == name)
            .map_or(DEFAULT_PROVIDER, |(_, id)| *id)
    }

    fn is_bootloader(&self) -> bool {
        (self.target_id & 0xF000_0000) != 0x3000_0000
    }

    fn flag(&self) -> u8 {
        self.flags.first().copied().unwrap_or(0)
    }

    fn manager_allowed(&self) -> bool {
        self.flag() & MANAGER_ALLOWED_FLAG != 0
    }

    fn pin_validated(&self) -> bool {
        self.flag() & PIN_VALIDATED_FLAG != 0
    }

    fn metadata(&self) -> DeviceMetadata {
        tracing::debug!(
            target_id = %format!("{:#010x}", self.target_id),
            osu = self.is_osu(),
            provider = self.provider_id(),
            bootloader = self.is_bootloader(),
            manager_allowed = self.manager_allowed(),
            pin_validated = self.pin_validated(),
            "decoded device info"
        );

        let model = model_name(self.target_id);
        let version = self.version();
        let mut parts = components(&version);
        let (major, minor, patch) = (parts.next(), parts.next(), parts.next());
        let mut mcu_parts = components(&self.mcu_version);
        let (mcu_major, mcu_minor) = (mcu_parts.next(), mcu_parts.next());

        DeviceMetadata {
            spec: format!("{model} v{version} (MCU v{})", self.mcu_version),
            model: model.to_string(),
            version: Version {
                major,
                minor,
                patch,
                string: version.clone(),
            },
            mcu_version: McuVersion {
                major: mcu_major,
                minor: mcu_minor,
                string: self.mcu_version.clone(),
            },
        }
    }
}

/// Dot separated components, an empty string has a single empty component
fn components(version: &str) -> impl Iterator<Item = String> + '_ {
    version.split('.').map(str::to_string)
}

#[cfg(test)]
mod test {
    use super::*;

    fn response(target_id: u32, se_version: &str, flags: &[u8], mcu_version: &[u8]) -> Vec<u8> {
        let mut data = target_id.to_be_bytes().to_vec();
        data.push(se_version.len() as u8);
        data.extend_from_slice(se_version.as_bytes());
        data.push(flags.len() as u8);
        data.extend_from_slice(flags);
        data.push(mcu_version.len() as u8);
        data.extend_from_slice(mcu_version);
        data.extend_from_slice(&[0x90, 0x00]);
        data
    }

    #[test]
    fn decode_nano_s() {
        let raw = hex::decode("3110000405312e352e35048800000004312e37009000").unwrap();
        assert_eq!(raw, response(0x31100004, "1.5.5", &[0x88, 0, 0, 0], b"1.7\0"));

        let metadata = decode_metadata(&raw).unwrap();
        assert_eq!(metadata.spec, "Nano S v1.5.5 (MCU v1.7)");
        assert_eq!(metadata.model, "Nano S");
        assert_eq!(
            metadata.version,
            Version {
                major: Some("1".into()),
                minor: Some("5".into()),
                patch: Some("5".into()),
                string: "1.5.5".into(),
            }
        );
        assert_eq!(
            metadata.mcu_version,
            McuVersion {
                major: Some("1".into()),
                minor: Some("7".into()),
                string: "1.7".into(),
            }
        );

        // decoding has no hidden state
        assert_eq!(decode_metadata(&raw).unwrap(), metadata);
    }

    #[test]
    fn models() {
        assert_eq!(model_name(0x33000004), "Nano X");
        assert_eq!(model_name(0x33100000), "Nano X");
        assert_eq!(model_name(0x31100002), "Nano S");
        assert_eq!(model_name(0x31100004), "Nano S");
        // shadowed by Nano S
        assert_eq!(model_name(0x31000002), "MCU");
        assert_eq!(model_name(0x01000001), "MCU");
        assert_eq!(model_name(0x01000000), "Unknown");
        assert_eq!(model_name(0), "Unknown");
    }

    #[test]
    fn unversioned() {
        let raw = [0x31, 0x10, 0x00, 0x04, 0x00, 0xff, 0xff, 0x90, 0x00];
        let metadata = decode_metadata(&raw).unwrap();
        assert_eq!(metadata.spec, "Nano S v0.0.0 (MCU v)");
        assert_eq!(metadata.version.string, "0.0.0");
        assert_eq!(metadata.version.patch.as_deref(), Some("0"));
        assert_eq!(metadata.mcu_version.string, "");
        assert_eq!(metadata.mcu_version.major.as_deref(), Some(""));
        assert_eq!(metadata.mcu_version.minor, None);

        let raw = [0x31, 0x10, 0x00, 0x04, 0x00, 0x90, 0x00];
        let metadata = decode_metadata(&raw).unwrap();
        assert_eq!(metadata.mcu_version.major.as_deref(), Some(""));
        assert_eq!(metadata.mcu_version.minor, None);
    }

    #[test]
    fn empty_firmware_version() {
        let metadata = decode_metadata(&response(0x31100004, "-osu", &[], b"1.7")).unwrap();
        assert_eq!(metadata.version.string, "");
        assert_eq!(metadata.version.major.as_deref(), Some(""));
        assert_eq!(metadata.version.minor, None);
        assert_eq!(metadata.version.patch, None);
    }

    #[test]
    fn serialize_metadata() {
        let raw = response(0x31100004, "1.4.2", &[], b"1.7");
        let json = serde_json::to_value(decode_metadata(&raw).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "spec": "Nano S v1.4.2 (MCU v1.7)",
                "model": "Nano S",
                "version": {
                    "major": "1",
                    "minor": "4",
                    "patch": "2",
                    "string": "1.4.2",
                },
                "mcuVersion": {
                    "major": "1",
                    "minor": "7",
                    "string": "1.7",
                },
            })
        );
    }

    #[test]
    fn osu_and_provider() {
        let raw = response(0x31100004, "1.6.0-osu", &[], b"1.11");
        let metadata = decode_metadata(&raw).unwrap();
        assert_eq!(metadata.version.string, "1.6.0");
        assert_eq!(metadata.spec, "Nano S v1.6.0 (MCU v1.11)");
        let info = DeviceInfo::parse(&raw).unwrap();
        assert!(info.is_osu());
        assert_eq!(info.provider_id(), 1);

        let info = DeviceInfo::parse(&response(0x31100004, "1.4.2-das", &[], b"1.7")).unwrap();
        assert!(!info.is_osu());
        assert_eq!(info.provider_id(), 2);
        let info = DeviceInfo::parse(&response(0x31100004, "1.4.2-ee", &[], b"1.7")).unwrap();
        assert_eq!(info.provider_id(), 5);
        let info = DeviceInfo::parse(&response(0x31100004, "1.4.2", &[], b"1.7")).unwrap();
        assert_eq!(info.provider_id(), 1);
    }

    #[test]
    fn flags_and_bootloader() {
        let info = DeviceInfo::parse(&response(0x31100004, "1.5.5", &[0x88], b"1.7")).unwrap();
        assert!(info.manager_allowed());
        assert!(info.pin_validated());
        assert!(!info.is_bootloader());

        let info = DeviceInfo::parse(&response(0x01000001, "1.5.5", &[], b"1.7")).unwrap();
        assert!(!info.manager_allowed());
        assert!(!info.pin_validated());
        assert!(info.is_bootloader());
    }

    #[test]
    fn mcu_without_terminator() {
        let metadata = decode_metadata(&response(0x33000004, "1.2.4-1", &[], b"2.8")).unwrap();
        assert_eq!(metadata.model, "Nano X");
        assert_eq!(metadata.mcu_version.string, "2.8");
        assert_eq!(metadata.version.patch.as_deref(), Some("4-1"));
    }

    #[test]
    fn decode_failures() {
        let mut truncated = response(0x31100004, "1.5.5", &[0x88], b"1.7");
        truncated.truncate(truncated.len() - 4);
        truncated.extend_from_slice(&[0x90, 0x00]);

        let mut invalid_utf8 = response(0x31100004, "1.5.5", &[], b"1.7");
        invalid_utf8[5] = 0xff;

        for raw in [vec![], vec![0x90], vec![0x31, 0x10, 0x90, 0x00], truncated, invalid_utf8] {
            assert!(matches!(decode_metadata(&raw), Err(Error::MetadataDecode)));
        }
    }
}
