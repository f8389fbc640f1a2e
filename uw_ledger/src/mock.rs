//! An in-memory device answering with scripted responses and recording what it receives.
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, Once};
use std::time::Duration;

use crate::apdu::{APDUCmdVec, StatusWord};
use crate::client::Transport;
use crate::session::{Connect, Ledger};
use crate::Error;

static INIT_LOGGING: Once = Once::new();

pub(crate) fn init_logging() {
    use tracing_subscriber::prelude::*;

    INIT_LOGGING.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .init();

        tracing::info!("logging initialized");
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Sent {
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    responses: HashMap<u8, VecDeque<(StatusWord, Vec<u8>)>>,
    sent: Vec<Sent>,
    timeout: Option<Duration>,
    scramble_key: Option<String>,
    connects: usize,
    closes: usize,
    fail_connect: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockDevice(Arc<Mutex<State>>);

impl MockDevice {
    pub fn new() -> Self {
        init_logging();
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    /// Queue an answer to the next command `ins`, commands without queued answers get an empty OK
    pub fn respond(&self, ins: u8, status: StatusWord, data: Vec<u8>) {
        self.state()
            .responses
            .entry(ins)
            .or_default()
            .push_back((status, data));
    }

    pub fn fail_connect(&self) {
        self.state().fail_connect = true;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state().sent.clone()
    }

    pub fn sent_ins(&self, ins: u8) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.ins == ins).collect()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.state().timeout
    }

    pub fn scramble_key(&self) -> Option<String> {
        self.state().scramble_key.clone()
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    pub fn ledger(&self) -> Ledger<MockDevice> {
        Ledger::new(self.clone())
    }
}

pub(crate) struct MockTransport(MockDevice);

impl Transport for MockTransport {
    type Error = io::Error;

    fn exchange(&self, command: &APDUCmdVec) -> Result<(StatusWord, Vec<u8>), Self::Error> {
        let mut state = self.0.state();
        state.sent.push(Sent {
            ins: command.ins,
            p1: command.p1,
            p2: command.p2,
            data: command.data.clone(),
        });
        Ok(state
            .responses
            .get_mut(&command.ins)
            .and_then(VecDeque::pop_front)
            .unwrap_or((StatusWord::OK, vec![])))
    }

    fn set_scramble_key(&self, key: &str) {
        self.0.state().scramble_key = Some(key.to_string());
    }

    fn set_exchange_timeout(&self, timeout: Duration) -> Result<(), Self::Error> {
        self.0.state().timeout = Some(timeout);
        Ok(())
    }

    fn close(&self) -> Result<(), Self::Error> {
        self.0.state().closes += 1;
        Ok(())
    }
}

impl Connect for MockDevice {
    type Transport = MockTransport;

    fn connect(&self) -> Result<MockTransport, Error> {
        let mut state = self.state();
        state.connects += 1;
        if state.fail_connect {
            return Err(Error::transport(io::Error::new(
                io::ErrorKind::NotFound,
                "no Ledger device found",
            )));
        }
        Ok(MockTransport(self.clone()))
    }
}
