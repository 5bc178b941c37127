//! DNS message header (RFC 1035 §4.1.1).

use stubdns_domain::UpstreamError;

pub const HEADER_LEN: usize = 12;

pub const FLAG_QR: u16 = 0x8000;
pub const OPCODE_MASK: u16 = 0x7800;
pub const FLAG_AA: u16 = 0x0400;
pub const FLAG_TC: u16 = 0x0200;
pub const FLAG_RD: u16 = 0x0100;
pub const FLAG_RA: u16 = 0x0080;
pub const FLAG_AD: u16 = 0x0020;
pub const FLAG_CD: u16 = 0x0010;
pub const RCODE_MASK: u16 = 0x000F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// Reads the fixed 12-byte header. Returns `None` when `buf` is shorter.
    pub fn read(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        let word = |i: usize| u16::from_be_bytes([buf[i], buf[i + 1]]);
        Some(Self {
            id: word(0),
            flags: word(2),
            qdcount: word(4),
            ancount: word(6),
            nscount: word(8),
            arcount: word(10),
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        for word in [
            self.id,
            self.flags,
            self.qdcount,
            self.ancount,
            self.nscount,
            self.arcount,
        ] {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    #[inline]
    pub fn opcode(&self) -> u8 {
        ((self.flags & OPCODE_MASK) >> 11) as u8
    }

    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.flags & FLAG_AA != 0
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.flags & FLAG_TC != 0
    }

    #[inline]
    pub fn recursion_desired(&self) -> bool {
        self.flags & FLAG_RD != 0
    }

    #[inline]
    pub fn recursion_available(&self) -> bool {
        self.flags & FLAG_RA != 0
    }

    #[inline]
    pub fn authentic_data(&self) -> bool {
        self.flags & FLAG_AD != 0
    }

    #[inline]
    pub fn checking_disabled(&self) -> bool {
        self.flags & FLAG_CD != 0
    }

    #[inline]
    pub fn rcode(&self) -> ResponseCode {
        ResponseCode::from_u8((self.flags & RCODE_MASK) as u8)
    }

    pub fn set_flag(&mut self, flag: u16, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.flags = (self.flags & !RCODE_MASK) | (rcode.to_u8() as u16 & RCODE_MASK);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl ResponseCode {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => Self::NoError,
            1 => Self::FormErr,
            2 => Self::ServFail,
            3 => Self::NxDomain,
            4 => Self::NotImp,
            5 => Self::Refused,
            other => Self::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::FormErr => 1,
            Self::ServFail => 2,
            Self::NxDomain => 3,
            Self::NotImp => 4,
            Self::Refused => 5,
            Self::Other(code) => code,
        }
    }

    /// The upstream failure this code signals, or `None` for NOERROR.
    pub fn to_error(self) -> Option<UpstreamError> {
        UpstreamError::from_rcode(self.to_u8())
    }
}
