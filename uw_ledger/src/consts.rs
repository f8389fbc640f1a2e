use std::time::Duration;

/// Exchange timeout used until a flow sets its own
pub const TIMEOUT: Duration = Duration::from_secs(30);

/// Time given to the user to review one output on the device screen
pub const OUTPUT_REVIEW_TIMEOUT: Duration = Duration::from_secs(20);

/// Scramble key selected before talking to the dashboard
pub const DASHBOARD_SCRAMBLE_KEY: &str = "B0L0S";

pub const SIGHASH_ALL: u8 = 0x01;
pub const TX_VERSION: u32 = 1;
pub const LOCK_TIME: u32 = 0;
pub const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

/// Scripts and outputs are streamed to the device in blocks of this size
pub const MAX_SCRIPT_BLOCK: usize = 50;

/// Image assets are looked up under this keystore name
pub const LEDGER: &str = "ledger";
