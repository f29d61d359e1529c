//! `PKTV1` packet framing.

use crate::error::SchedError;

pub const MAGIC: &[u8; 5] = b"PKTV1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    AuthCtxData,
    AuthErrData,
    AuthCtxOk,
    AuthEncryptedData,
    AuthLastMsg,
    /// Anything above the reserved auth range is an application payload
    /// (JOIN and the upper-layer request/response bodies of §6).
    App,
}

impl PacketType {
    fn to_byte(self) -> u8 {
        match self {
            PacketType::AuthCtxData => 0,
            PacketType::AuthErrData => 1,
            PacketType::AuthCtxOk => 2,
            PacketType::AuthEncryptedData => 3,
            PacketType::AuthLastMsg => 4,
            PacketType::App => 5,
        }
    }

    fn from_byte(b: u8) -> Option<PacketType> {
        Some(match b {
            0 => PacketType::AuthCtxData,
            1 => PacketType::AuthErrData,
            2 => PacketType::AuthCtxOk,
            3 => PacketType::AuthEncryptedData,
            4 => PacketType::AuthLastMsg,
            5 => PacketType::App,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub ty: PacketType,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(ty: PacketType, payload: Vec<u8>) -> Packet {
        Packet { ty, payload }
    }

    /// Serialize to the wire form. A negative/oversized length never
    /// arises here since `payload.len()` is always representable, but the
    /// u32 cast is the boundary the C original calls out as a fatal framing
    /// condition on the decode side.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MAGIC.len() + 1 + 4 + self.payload.len());
        out.extend_from_slice(MAGIC);
        out.push(self.ty.to_byte());
        out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decode exactly one packet from the front of `buf`, returning the
    /// packet and the number of bytes consumed, or `Ok(None)` if `buf`
    /// doesn't yet hold a complete packet (the caller should read more).
    /// Any malformed header (bad magic) is fatal per §4.A/§7.
    pub fn decode(buf: &[u8]) -> Result<Option<(Packet, usize)>, SchedError> {
        let header_len = MAGIC.len() + 1 + 4;
        if buf.len() < header_len {
            return Ok(None);
        }
        if &buf[..MAGIC.len()] != MAGIC {
            return Err(SchedError::Framing("bad magic".into()));
        }
        let ty_byte = buf[MAGIC.len()];
        let ty = PacketType::from_byte(ty_byte)
            .ok_or_else(|| SchedError::Framing(format!("unknown packet type {ty_byte}")))?;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&buf[MAGIC.len() + 1..header_len]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        let total = header_len + len;
        if buf.len() < total {
            return Ok(None);
        }
        let payload = buf[header_len..total].to_vec();
        Ok(Some((Packet::new(ty, payload), total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let pkt = Packet::new(PacketType::App, b"hello world".to_vec());
        let bytes = pkt.encode();
        let (decoded, consumed) = Packet::decode(&bytes).unwrap().unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn partial_buffer_returns_none() {
        let pkt = Packet::new(PacketType::App, b"hello".to_vec());
        let bytes = pkt.encode();
        let partial = &bytes[..bytes.len() - 1];
        assert!(Packet::decode(partial).unwrap().is_none());
    }

    #[test]
    fn bad_magic_is_fatal() {
        let bytes = b"NOPE1\x05\x00\x00\x00\x00".to_vec();
        assert!(Packet::decode(&bytes).is_err());
    }

    #[test]
    fn two_packets_back_to_back() {
        let a = Packet::new(PacketType::AuthCtxData, b"a".to_vec());
        let b = Packet::new(PacketType::App, b"bb".to_vec());
        let mut bytes = a.encode();
        bytes.extend(b.encode());
        let (first, n1) = Packet::decode(&bytes).unwrap().unwrap();
        assert_eq!(first, a);
        let (second, n2) = Packet::decode(&bytes[n1..]).unwrap().unwrap();
        assert_eq!(second, b);
        assert_eq!(n1 + n2, bytes.len());
    }
}
