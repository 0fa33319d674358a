/// Maximum connections.
pub const MAX_CONN: usize = 10;

/// A server.
#[derive(Debug)]
pub struct Server {
    port: u16,
}

impl Server {
    /// Create a server.
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

pub trait Handler {
    fn handle(&self, req: &str) -> String;
}
