use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::DerivationPath;

use crate::Error;

/// A BIP32 derivation path like `m/45'/0'/0'/0`.
///
/// The string given by the caller is kept intact, since callers use it as an identifier, while
/// devices receive it without the root segment, see [`Bip32Path::device_path()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bip32Path {
    raw: String,
    path: DerivationPath,
}

impl Bip32Path {
    /// The path as given by the caller
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The path without the leading `m` segment, e.g. `45'/0'/0'/0`
    pub fn device_path(&self) -> String {
        self.raw.split('/').skip(1).collect::<Vec<_>>().join("/")
    }

    pub fn derivation_path(&self) -> &DerivationPath {
        &self.path
    }
}

impl FromStr for Bip32Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| Error::InvalidBip32Path {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        if s.split('/').next() != Some("m") {
            return Err(err("must start with 'm'"));
        }
        let path = DerivationPath::from_str(s).map_err(|e| err(&e.to_string()))?;
        Ok(Self {
            raw: s.to_string(),
            path,
        })
    }
}

impl fmt::Display for Bip32Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
