//! # Controller Detection Module
//!
//! Name-based heuristics for controller family and connection medium.
//!
//! ## Family
//!
//! The lowercased device name is tested against three keyword sets in
//! priority order: Xbox, then PlayStation, then Nintendo Switch. The first
//! match wins; anything else is [`ControllerType::Generic`].
//!
//! ## Connection
//!
//! Operating systems do not expose the transport in a portable way, so the
//! medium is guessed from the name as well. The guess is wrong for some
//! devices (a DualSense on a cable still calls itself "Wireless Controller"),
//! treat it as a hint.

use super::types::{ConnectionType, ControllerType};

const XBOX_KEYWORDS: &[&str] = &["xbox", "x-box", "microsoft", "xinput"];

const PLAYSTATION_KEYWORDS: &[&str] = &[
    "playstation",
    "ps4",
    "ps5",
    "sony",
    "dualshock",
    "dualsense",
    "wireless controller",
];

const NINTENDO_KEYWORDS: &[&str] = &["nintendo", "switch", "pro controller"];

const WIRELESS_KEYWORDS: &[&str] = &["bluetooth", "bt", "wireless"];

const WIRED_KEYWORDS: &[&str] = &["usb", "wired", "cable"];

/// Sony's short Bluetooth names ("Wireless Controller") have at most this many words.
const SONY_SHORT_NAME_WORDS: usize = 3;

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

/// Detects the controller family from the device name.
///
/// # Examples
///
/// ```
/// use joyhub::controller::detect::detect_type;
/// use joyhub::controller::types::ControllerType;
///
/// assert_eq!(detect_type("Xbox Wireless Controller"), ControllerType::Xbox);
/// assert_eq!(detect_type("DualSense Wireless Controller"), ControllerType::PlayStation);
/// assert_eq!(detect_type("Pro Controller"), ControllerType::NintendoSwitch);
/// assert_eq!(detect_type("Logitech Dual Action"), ControllerType::Generic);
/// ```
#[must_use]
pub fn detect_type(name: &str) -> ControllerType {
    let name = name.to_lowercase();

    if contains_any(&name, XBOX_KEYWORDS) {
        ControllerType::Xbox
    } else if contains_any(&name, PLAYSTATION_KEYWORDS) {
        ControllerType::PlayStation
    } else if contains_any(&name, NINTENDO_KEYWORDS) {
        ControllerType::NintendoSwitch
    } else {
        ControllerType::Generic
    }
}

/// Guesses how the controller is attached from its name.
///
/// Precedence:
///
/// 1. Names mentioning "bluetooth", "bt" or "wireless":
///    - Sony-style short names (PlayStation family, "wireless", at most three
///      words) are Bluetooth
///    - Xbox names are Bluetooth if they say so, otherwise a wireless dongle
///    - other "wireless" names are a wireless dongle
///    - everything else is Bluetooth
/// 2. Names mentioning "usb", "wired" or "cable" are USB
/// 3. Otherwise unknown
///
/// # Examples
///
/// ```
/// use joyhub::controller::detect::guess_connection;
/// use joyhub::controller::types::ConnectionType;
///
/// assert_eq!(guess_connection("Wireless Controller"), ConnectionType::Bluetooth);
/// assert_eq!(guess_connection("Xbox Wireless Controller"), ConnectionType::WirelessDongle);
/// assert_eq!(guess_connection("Generic USB Gamepad"), ConnectionType::Usb);
/// ```
#[must_use]
pub fn guess_connection(name: &str) -> ConnectionType {
    let lower = name.to_lowercase();

    if contains_any(&lower, WIRELESS_KEYWORDS) {
        let wireless = lower.contains("wireless");

        if wireless
            && detect_type(name) == ControllerType::PlayStation
            && name.split_whitespace().count() <= SONY_SHORT_NAME_WORDS
        {
            return ConnectionType::Bluetooth;
        }

        if lower.contains("xbox") {
            if lower.contains("bluetooth") {
                return ConnectionType::Bluetooth;
            }
            if wireless {
                return ConnectionType::WirelessDongle;
            }
        }

        if wireless {
            return ConnectionType::WirelessDongle;
        }

        return ConnectionType::Bluetooth;
    }

    if contains_any(&lower, WIRED_KEYWORDS) {
        return ConnectionType::Usb;
    }

    ConnectionType::Unknown
}
