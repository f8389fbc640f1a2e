//! Messages guiding the user through Ledger interactions.
//!
//! Every set extends the more general one it builds on: [`ledger_messages()`] extends the
//! keystore set, [`dashboard_messages()`] and [`bitcoin_messages()`] extend the Ledger set.
use uw_common::{keystore_messages, Bip32Path, Level, Message, State, Step};

use crate::consts::LEDGER;

const PATH_WARNING_IMAGES: &str = "bip32PathWarningV1";

fn path_warning_image(index: usize) -> String {
    format!("{LEDGER}/{PATH_WARNING_IMAGES}/{index}")
}

/// Messages of any interaction with a Ledger device
pub fn ledger_messages() -> Vec<Message> {
    let mut messages = keystore_messages();
    messages.push(Message::new(
        State::Pending,
        Level::Info,
        "device.connect",
        "Make sure your Ledger device is plugged in.",
    ));
    messages.push(Message::new(
        State::Pending,
        Level::Info,
        "device.unlock",
        "Make sure you have unlocked your Ledger device.",
    ));
    messages.push(Message::new(
        State::Active,
        Level::Info,
        "device.active",
        "Communicating with Ledger device...",
    ));
    messages
}

/// Messages of interactions requiring the dashboard, rather than an app, to be open
pub fn dashboard_messages() -> Vec<Message> {
    let text = "Make sure you have the main Ledger dashboard open, NOT the Bitcoin app.";
    let mut messages = ledger_messages();
    messages.push(Message::new(
        State::Pending,
        Level::Info,
        "ledger.app.dashboard",
        text,
    ));
    messages.push(Message::new(
        State::Active,
        Level::Info,
        "ledger.app.dashboard",
        text,
    ));
    messages
}

/// Messages of interactions requiring the Bitcoin app to be open
pub fn bitcoin_messages() -> Vec<Message> {
    let text = "Make sure you have the Bitcoin app open.";
    let mut messages = ledger_messages();
    messages.push(Message::new(
        State::Pending,
        Level::Info,
        "ledger.app.bitcoin",
        text,
    ));
    messages.push(Message::new(
        State::Active,
        Level::Info,
        "ledger.app.bitcoin",
        text,
    ));
    messages
}

/// The warnings shown by the device when asked for keys on unusual paths, such as multisig ones.
///
/// Firmware before 1.6.0 and later firmware show different screens.
pub fn path_warning_messages(bip32_path: &Bip32Path) -> Vec<Message> {
    let path = bip32_path.as_str();
    let before_1_6 = Message::new(
        State::Active,
        Level::Warning,
        "ledger.path.warning",
        "Your Ledger will display a 'WARNING!' message because it doesn't understand standards for multisig addresses.  It is safe to continue.",
    )
    .with_version("<1.6.0")
    .with_steps(vec![
        Step::new(
            path_warning_image(0),
            "Your Ledger will display a WARNING message.  Click BOTH buttons to continue.",
        ),
        Step::new(
            path_warning_image(1),
            "Your Ledger will display a message about an unusual derivation path.  Click BOTH buttons to continue.",
        ),
        Step::new(
            path_warning_image(2),
            format!("Your Ledger will display the derivation path \"{path}\" .  Click BOTH buttons to continue."),
        ),
        Step::new(
            path_warning_image(3),
            "Your Ledger will ask if you're sure.  Click the RIGHT button to continue.",
        ),
        Step::new(
            path_warning_image(4),
            "Your Ledger will display a bitcoin address.  Click the RIGHT button to continue.",
        ),
    ]);

    // no dedicated images for these screens yet, the closest older ones are used
    let since_1_6 = Message::new(
        State::Active,
        Level::Warning,
        "ledger.path.warning",
        "Your Ledger will display a message stating the BIP32 path is unusual.  It is safe to continue.",
    )
    .with_version(">=1.6.0")
    .with_steps(vec![
        Step::new(
            path_warning_image(1),
            "Your Ledger will display a message about an unusual derivation path.  Click the RIGHT button to continue.",
        ),
        Step::new(
            path_warning_image(2),
            format!("Your Ledger will display the derivation path \"{path}\".  Click the RIGHT button to continue."),
        ),
        Step::new(
            path_warning_image(3),
            "Your Ledger will ask if you want to reject this request.  Click the RIGHT button to continue.",
        ),
        Step::new(
            path_warning_image(3),
            "Your Ledger will ask if you want to approve this request.  Click BOTH buttons to do so.",
        ),
        Step::new(
            path_warning_image(4),
            "Your Ledger will display a bitcoin address.  Click the RIGHT button until you scroll past the entire address text.",
        ),
        Step::new(
            path_warning_image(3),
            "Your Ledger will ask you to approve this request.  Click BOTH buttons to do so.",
        ),
    ]);

    vec![before_1_6, since_1_6]
}
