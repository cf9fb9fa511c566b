//! Transaction codes and field tags for the circulation wire format.

/// Two-character transaction codes.
pub mod codes {
    pub const LOGIN_REQUEST: &str = "93";
    pub const LOGIN_RESPONSE: &str = "94";
    pub const CHECKOUT_REQUEST: &str = "11";
    pub const CHECKOUT_RESPONSE: &str = "12";
    pub const CHECKIN_REQUEST: &str = "09";
    pub const CHECKIN_RESPONSE: &str = "10";
    pub const PATRON_STATUS_REQUEST: &str = "23";
    pub const PATRON_STATUS_RESPONSE: &str = "24";
}

/// Two-character field tags used in `XY<value>|` groups.
pub mod tags {
    pub const PATRON_IDENTIFIER: &str = "AA";
    pub const ITEM_IDENTIFIER: &str = "AB";
    pub const LOGIN_USER_ID: &str = "BN";
    pub const LOGIN_PASSWORD: &str = "CO";
    pub const PERSONAL_NAME: &str = "NI";
}

/// The supported transaction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transaction {
    Login,
    Checkout,
    Checkin,
    PatronStatus,
}

impl Transaction {
    pub const ALL: [Transaction; 4] = [
        Transaction::Login,
        Transaction::Checkout,
        Transaction::Checkin,
        Transaction::PatronStatus,
    ];

    /// Resolve an inbound request code; unknown codes are unsupported.
    pub fn from_request_code(code: &str) -> Option<Self> {
        match code {
            codes::LOGIN_REQUEST => Some(Transaction::Login),
            codes::CHECKOUT_REQUEST => Some(Transaction::Checkout),
            codes::CHECKIN_REQUEST => Some(Transaction::Checkin),
            codes::PATRON_STATUS_REQUEST => Some(Transaction::PatronStatus),
            _ => None,
        }
    }

    pub fn request_code(self) -> &'static str {
        match self {
            Transaction::Login => codes::LOGIN_REQUEST,
            Transaction::Checkout => codes::CHECKOUT_REQUEST,
            Transaction::Checkin => codes::CHECKIN_REQUEST,
            Transaction::PatronStatus => codes::PATRON_STATUS_REQUEST,
        }
    }

    pub fn response_code(self) -> &'static str {
        match self {
            Transaction::Login => codes::LOGIN_RESPONSE,
            Transaction::Checkout => codes::CHECKOUT_RESPONSE,
            Transaction::Checkin => codes::CHECKIN_RESPONSE,
            Transaction::PatronStatus => codes::PATRON_STATUS_RESPONSE,
        }
    }

    /// Human-readable name for logging.
    pub fn name(self) -> &'static str {
        match self {
            Transaction::Login => "login",
            Transaction::Checkout => "checkout",
            Transaction::Checkin => "checkin",
            Transaction::PatronStatus => "patron-status",
        }
    }
}
