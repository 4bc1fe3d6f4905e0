/// Error type for inventory operations.
#[derive(Debug)]
pub enum InventoryError {
    /// Missing or rejected credentials
    Auth(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// File I/O error
    Io(String),
    /// Settings problem (no snapshot and no API endpoint, etc.)
    Settings(String),
}

impl std::fmt::Display for InventoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InventoryError::Auth(msg) => write!(f, "Authentication failed: {}", msg),
            InventoryError::Network(msg) => write!(f, "Network error: {}", msg),
            InventoryError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            InventoryError::Parse(msg) => write!(f, "Parse error: {}", msg),
            InventoryError::Io(msg) => write!(f, "I/O error: {}", msg),
            InventoryError::Settings(msg) => write!(f, "Settings error: {}", msg),
        }
    }
}

impl std::error::Error for InventoryError {}
