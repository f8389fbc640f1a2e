use core::convert::TryFrom;

use ledger_apdu::APDUCommand;

pub type APDUCmdVec = APDUCommand<Vec<u8>>;

/// Class of the commands understood by the dashboard and the legacy Bitcoin app.
pub const CLA: u8 = 0xE0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BtcCommandCode {
    /// Dashboard only, returns target id, firmware and MCU versions
    GetDeviceInfo = 0x01,
    GetWalletPublicKey = 0x40,
    UntrustedHashTransactionInputStart = 0x44,
    UntrustedHashSign = 0x48,
    UntrustedHashTransactionInputFinalizeFull = 0x4A,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum StatusWord {
    /// Device locked
    Locked = 0x5515,
    /// Wrong length
    WrongLength = 0x6700,
    /// Security status not satisfied, e.g. PIN not entered
    SecurityStatusNotSatisfied = 0x6982,
    /// Rejected by user
    Deny = 0x6985,
    /// Incorrect Data
    IncorrectData = 0x6A80,
    /// Not Supported
    NotSupported = 0x6A82,
    /// Wrong P1P2
    WrongP1P2 = 0x6A86,
    /// Ins not supported, e.g. the wrong app is open
    InsNotSupported = 0x6D00,
    /// Cla not supported, e.g. the wrong app is open
    ClaNotSupported = 0x6E00,
    /// Success
    OK = 0x9000,
    /// Unknown
    Unknown,
}

impl TryFrom<u16> for StatusWord {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x5515 => Ok(StatusWord::Locked),
            0x6700 => Ok(StatusWord::WrongLength),
            0x6982 => Ok(StatusWord::SecurityStatusNotSatisfied),
            0x6985 => Ok(StatusWord::Deny),
            0x6A80 => Ok(StatusWord::IncorrectData),
            0x6A82 => Ok(StatusWord::NotSupported),
            0x6A86 => Ok(StatusWord::WrongP1P2),
            0x6D00 => Ok(StatusWord::InsNotSupported),
            0x6E00 => Ok(StatusWord::ClaNotSupported),
            0x9000 => Ok(StatusWord::OK),
            _ => Err(()),
        }
    }
}

impl StatusWord {
    /// Map the return code of an answer, codes not listed become [`StatusWord::Unknown`]
    pub fn from_retcode(retcode: u16) -> Self {
        StatusWord::try_from(retcode).unwrap_or(StatusWord::Unknown)
    }
}

pub fn apdu(ins: BtcCommandCode, p1: u8, p2: u8, data: Vec<u8>) -> APDUCmdVec {
    APDUCmdVec {
        cla: CLA,
        ins: ins as u8,
        p1,
        p2,
        data,
    }
}

pub fn apdu_empty(ins: BtcCommandCode) -> APDUCmdVec {
    apdu(ins, 0x00, 0x00, Vec::new())
}
