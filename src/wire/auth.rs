//! Pluggable per-connection authentication/encryption contexts (§4.A).
//!
//! The method implementation (munge, GSS, TLS…) lives outside this crate's
//! scope (§1: "TLS/munge/GSS authentication libraries" are external
//! collaborators); this module only fixes the trait boundary and the
//! handshake state machine that drives it.

use crate::error::SchedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeMode {
    Client,
    Server,
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnType {
    User,
    Service,
}

/// One half of a completed or in-progress handshake exchange.
pub struct HandshakeOutput {
    pub out_bytes: Option<Vec<u8>>,
    pub done: bool,
}

/// Identity learned from a completed auth handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub user: String,
    pub host: String,
    pub realm: String,
}

/// An authentication or encryption method. A single method may be used for
/// both roles (`create_ctx` is called once per role; the two contexts on a
/// channel may be the literal same value when the configured method is
/// identical for both).
pub trait AuthMethod: Send + Sync {
    fn name(&self) -> &str;

    fn create_ctx(
        &self,
        mode: HandshakeMode,
        conn_type: ConnType,
        peer_hostname: &str,
    ) -> Result<Box<dyn AuthContext>, SchedError>;
}

pub trait AuthContext: Send + Sync {
    /// Advance the handshake with `in_bytes` (absent on the first call);
    /// returns outbound bytes to send (if any) and whether the handshake
    /// has completed on this side.
    fn process_handshake_data(
        &mut self,
        in_bytes: Option<&[u8]>,
    ) -> Result<HandshakeOutput, SchedError>;

    fn get_userinfo(&self) -> Result<PeerInfo, SchedError>;

    fn encrypt_data(&mut self, clear: &[u8]) -> Result<Vec<u8>, SchedError>;

    fn decrypt_data(&mut self, cipher: &[u8]) -> Result<Vec<u8>, SchedError>;
}

/// A context that performs no handshake and passes data through unchanged;
/// used when a connection is configured for cleartext/no-auth.
pub struct NullAuthContext;

impl AuthContext for NullAuthContext {
    fn process_handshake_data(
        &mut self,
        _in_bytes: Option<&[u8]>,
    ) -> Result<HandshakeOutput, SchedError> {
        Ok(HandshakeOutput { out_bytes: None, done: true })
    }

    fn get_userinfo(&self) -> Result<PeerInfo, SchedError> {
        Ok(PeerInfo { user: String::new(), host: String::new(), realm: String::new() })
    }

    fn encrypt_data(&mut self, clear: &[u8]) -> Result<Vec<u8>, SchedError> {
        Ok(clear.to_vec())
    }

    fn decrypt_data(&mut self, cipher: &[u8]) -> Result<Vec<u8>, SchedError> {
        Ok(cipher.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_context_is_transparent() {
        let mut ctx = NullAuthContext;
        let cipher = ctx.encrypt_data(b"hello").unwrap();
        assert_eq!(ctx.decrypt_data(&cipher).unwrap(), b"hello");
        assert!(ctx.process_handshake_data(None).unwrap().done);
    }
}
