//! Wire protocol definitions shared by the hub and the proxy

mod close_codes;

pub use close_codes::CloseCode;
