//! Transport to the Speculos simulator, each APDU is framed with its length.
//!
//! Adapted from
//! https://github.com/LedgerHQ/app-bitcoin-new/blob/develop/bitcoin_client_rs/examples/ledger_hwi
use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpStream};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use ledger_apdu::APDUAnswer;

use crate::apdu::APDUCmdVec;
use crate::consts::TIMEOUT;
use crate::session::Connect;
use crate::{apdu::StatusWord, client::Transport, Error};

/// Transport to communicate with the Ledger Speculos simulator.
#[derive(Debug)]
pub struct TransportTcp {
    connection: Mutex<TcpStream>,
}

impl TransportTcp {
    pub fn new(port: u16) -> Result<Self, io::Error> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), port);
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(TIMEOUT))?;
        Ok(Self {
            connection: Mutex::new(stream),
        })
    }

    fn stream(&self) -> Result<MutexGuard<'_, TcpStream>, io::Error> {
        self.connection
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "unable to get lock"))
    }
}

impl Transport for TransportTcp {
    type Error = io::Error;

    fn exchange(&self, command: &APDUCmdVec) -> Result<(StatusWord, Vec<u8>), Self::Error> {
        let mut stream = self.stream()?;
        let command_bytes = command.serialize();

        let mut req = vec![0u8; command_bytes.len() + 4];
        req[..4].copy_from_slice(&(command_bytes.len() as u32).to_be_bytes());
        req[4..].copy_from_slice(&command_bytes);
        stream.write_all(&req)?;

        let mut buff = [0u8; 4];
        stream.read_exact(&mut buff)?;
        let len = u32::from_be_bytes(buff);

        let mut resp = vec![0u8; len as usize + 2];
        stream.read_exact(&mut resp)?;
        let answer = APDUAnswer::from_answer(resp)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Invalid Answer"))?;
        Ok((
            StatusWord::from_retcode(answer.retcode()),
            answer.data().to_vec(),
        ))
    }

    /// A zero `timeout` waits forever
    fn set_exchange_timeout(&self, timeout: Duration) -> Result<(), Self::Error> {
        let timeout = (!timeout.is_zero()).then_some(timeout);
        self.stream()?.set_read_timeout(timeout)
    }

    fn close(&self) -> Result<(), Self::Error> {
        self.stream()?.shutdown(Shutdown::Both)
    }
}

/// Opens a [`TransportTcp`] to a simulator listening on localhost.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnector {
    port: u16,
}

impl TcpConnector {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Connect for TcpConnector {
    type Transport = TransportTcp;

    fn connect(&self) -> Result<TransportTcp, Error> {
        TransportTcp::new(self.port).map_err(Error::transport)
    }
}
