//! Per-connection channel: two direction-tagged auth contexts, read/write
//! buffers, and the handshake state machine (§4.A).

use crate::error::SchedError;
use crate::wire::auth::{AuthContext, HandshakeMode, NullAuthContext, PeerInfo};
use crate::wire::framing::{Packet, PacketType};

/// Cached transport state, refreshed by the caller after each I/O attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportState {
    pub ok: bool,
    pub peer_closed: bool,
    pub net_closed: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        TransportState { ok: true, peer_closed: false, net_closed: false }
    }
}

enum Phase {
    /// Encryption handshake not yet started/completed (if configured).
    Encrypting,
    /// Authentication handshake not yet started/completed (if it differs
    /// from encryption).
    Authenticating,
    /// Both handshakes done; application packets are auto-wrapped.
    Ready,
    Closed,
}

/// A channel over one file descriptor/socket. I/O itself (the actual
/// socket read/write) is left to the caller — this type only owns framing,
/// buffering, and the handshake state machine, matching §4.A/§5's "the
/// channel is single-threaded on the application side".
pub struct Channel {
    legacy_peer: bool,
    read_buf: Vec<u8>,
    write_buf: Vec<u8>,
    transport: TransportState,
    phase: Phase,
    encrypt_differs_from_auth: bool,
    auth_ctx: Box<dyn AuthContext>,
    encrypt_ctx: Option<Box<dyn AuthContext>>,
}

impl Channel {
    /// `encrypt_ctx = None` means cleartext; when `Some` and distinct from
    /// `auth_ctx`, both handshakes run in sequence (encryption first).
    pub fn new(
        auth_ctx: Box<dyn AuthContext>,
        encrypt_ctx: Option<Box<dyn AuthContext>>,
        legacy_peer: bool,
    ) -> Channel {
        let encrypt_differs_from_auth = encrypt_ctx.is_some();
        Channel {
            legacy_peer,
            read_buf: Vec::new(),
            write_buf: Vec::new(),
            transport: TransportState::default(),
            phase: if encrypt_ctx.is_some() { Phase::Encrypting } else { Phase::Authenticating },
            encrypt_differs_from_auth,
            auth_ctx,
            encrypt_ctx,
        }
    }

    pub fn cleartext(legacy_peer: bool) -> Channel {
        Channel::new(Box::new(NullAuthContext), None, legacy_peer)
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport
    }

    pub fn set_transport_state(&mut self, state: TransportState) {
        self.transport = state;
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready)
    }

    /// Queue raw bytes read off the socket for framing.
    pub fn feed_read(&mut self, bytes: &[u8]) {
        self.read_buf.extend_from_slice(bytes);
    }

    /// Drain whatever has been queued for the socket write side.
    pub fn take_write(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.write_buf)
    }

    fn queue_packet(&mut self, pkt: Packet) {
        self.write_buf.extend_from_slice(&pkt.encode());
    }

    /// Client-side handshake driver (§4.A): runs the encryption handshake
    /// to completion (if configured), then the auth handshake (if
    /// different), queuing outbound packets as it goes. Call repeatedly as
    /// inbound packets arrive; returns once both handshakes (or neither)
    /// have completed for this call's available input.
    pub fn drive_handshake(&mut self, mode: HandshakeMode) -> Result<(), SchedError> {
        loop {
            match self.phase {
                Phase::Closed => return Ok(()),
                Phase::Ready => return Ok(()),
                Phase::Encrypting => {
                    let in_bytes = self.next_ctx_payload(PacketType::AuthCtxData)?;
                    let ctx = self
                        .encrypt_ctx
                        .as_mut()
                        .ok_or_else(|| SchedError::Internal("encrypting phase with no encrypt_ctx".into()))?;
                    let out = ctx.process_handshake_data(in_bytes.as_deref())?;
                    if let Some(bytes) = out.out_bytes {
                        self.write_buf.extend_from_slice(&Packet::new(PacketType::AuthCtxData, bytes).encode());
                    }
                    if out.done {
                        self.phase = if self.encrypt_differs_from_auth {
                            Phase::Authenticating
                        } else {
                            Phase::Ready
                        };
                        if matches!(self.phase, Phase::Ready) {
                            self.write_buf.extend_from_slice(
                                &Packet::new(PacketType::AuthCtxOk, Vec::new()).encode(),
                            );
                        }
                    } else if in_bytes.is_none() {
                        // Nothing more to feed right now; wait for the peer.
                        return Ok(());
                    }
                    let _ = mode;
                }
                Phase::Authenticating => {
                    let in_bytes = self.next_ctx_payload(PacketType::AuthCtxData)?;
                    let out = self.auth_ctx.process_handshake_data(in_bytes.as_deref())?;
                    if let Some(bytes) = out.out_bytes {
                        self.write_buf.extend_from_slice(&Packet::new(PacketType::AuthCtxData, bytes).encode());
                    }
                    if out.done {
                        self.phase = Phase::Ready;
                        self.write_buf
                            .extend_from_slice(&Packet::new(PacketType::AuthCtxOk, Vec::new()).encode());
                    } else if in_bytes.is_none() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Pop one handshake-shaped packet's payload off the read buffer, if a
    /// complete one is queued. Propagates `AUTH_ERR_DATA` as a fatal auth
    /// error and closes the connection per §4.A.
    fn next_ctx_payload(&mut self, expect: PacketType) -> Result<Option<Vec<u8>>, SchedError> {
        let Some((pkt, consumed)) = Packet::decode(&self.read_buf)? else {
            return Ok(None);
        };
        match pkt.ty {
            PacketType::AuthErrData => {
                self.phase = Phase::Closed;
                let msg = String::from_utf8_lossy(&pkt.payload).to_string();
                self.read_buf.drain(..consumed);
                Err(SchedError::Auth(msg))
            }
            t if t == expect => {
                self.read_buf.drain(..consumed);
                Ok(Some(pkt.payload))
            }
            PacketType::AuthCtxOk => {
                self.read_buf.drain(..consumed);
                Ok(None)
            }
            other => Err(SchedError::Framing(format!("unexpected packet {other:?} during handshake"))),
        }
    }

    pub fn peer_info(&self) -> Result<PeerInfo, SchedError> {
        self.auth_ctx.get_userinfo()
    }

    /// Send one application payload, auto-wrapping it in
    /// `AUTH_ENCRYPTED_DATA` once the channel is ready and encryption is
    /// configured.
    pub fn send_app(&mut self, payload: Vec<u8>) -> Result<(), SchedError> {
        if !self.is_ready() {
            return Err(SchedError::Framing("channel not ready for application data".into()));
        }
        let inner = Packet::new(PacketType::App, payload).encode();
        match self.encrypt_ctx.as_mut() {
            Some(ctx) => {
                let cipher = ctx.encrypt_data(&inner)?;
                self.queue_packet(Packet::new(PacketType::AuthEncryptedData, cipher));
            }
            None => self.write_buf.extend_from_slice(&inner),
        }
        Ok(())
    }

    /// Receive one application payload from the read buffer, unwrapping
    /// encryption if present. Returns `Ok(None)` if no complete packet is
    /// buffered yet.
    pub fn recv_app(&mut self) -> Result<Option<Vec<u8>>, SchedError> {
        let Some((pkt, consumed)) = Packet::decode(&self.read_buf)? else {
            return Ok(None);
        };
        self.read_buf.drain(..consumed);
        match pkt.ty {
            PacketType::App => Ok(Some(pkt.payload)),
            PacketType::AuthEncryptedData => {
                let ctx = self
                    .encrypt_ctx
                    .as_mut()
                    .ok_or_else(|| SchedError::Framing("received encrypted data on cleartext channel".into()))?;
                let clear = ctx.decrypt_data(&pkt.payload)?;
                let (inner, _) = Packet::decode(&clear)?
                    .ok_or_else(|| SchedError::Framing("truncated inner packet".into()))?;
                Ok(Some(inner.payload))
            }
            other => Err(SchedError::Framing(format!("unexpected packet {other:?} as application data"))),
        }
    }

    pub fn is_legacy_peer(&self) -> bool {
        self.legacy_peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleartext_round_trip() {
        let mut client = Channel::cleartext(false);
        let mut server = Channel::cleartext(false);
        // Both channels start in Authenticating with a NullAuthContext,
        // which completes with no data exchanged.
        client.drive_handshake(HandshakeMode::Client).unwrap();
        server.drive_handshake(HandshakeMode::Server).unwrap();
        assert!(client.is_ready());
        assert!(server.is_ready());
        // Handshake packets would already be on the wire by now; drop them
        // so this test can focus on the application-data path.
        client.take_write();
        server.take_write();

        client.send_app(b"run-job 123".to_vec()).unwrap();
        let wire_bytes = client.take_write();
        server.feed_read(&wire_bytes);
        let received = server.recv_app().unwrap().unwrap();
        assert_eq!(received, b"run-job 123");
    }
}
