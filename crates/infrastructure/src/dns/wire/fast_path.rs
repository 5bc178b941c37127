use super::header::{FLAG_QR, HEADER_LEN};

/// Header id plus the raw question of a single-question message.
pub struct QuestionView<'a> {
    pub id: u16,
    pub is_response: bool,
    /// QNAME, QTYPE and QCLASS exactly as they appear on the wire.
    pub question: &'a [u8],
}

/// Reads the header and the one question of `buf` without decoding
/// anything else.
///
/// Returns `None` when QDCOUNT is not 1, when the name uses a compression
/// pointer or an extended label type, or when the buffer ends early.
pub fn parse_question(buf: &[u8]) -> Option<QuestionView<'_>> {
    if buf.len() < HEADER_LEN + 5 {
        return None;
    }

    let id = u16::from_be_bytes([buf[0], buf[1]]);
    let flags = u16::from_be_bytes([buf[2], buf[3]]);
    let qdcount = u16::from_be_bytes([buf[4], buf[5]]);
    if qdcount != 1 {
        return None;
    }

    let mut pos = HEADER_LEN;
    loop {
        let label_len = *buf.get(pos)? as usize;
        if label_len == 0 {
            pos += 1;
            break;
        }
        if label_len & 0xC0 != 0 {
            return None;
        }
        pos += 1 + label_len;
    }

    let question_end = pos + 4;
    Some(QuestionView {
        id,
        is_response: flags & FLAG_QR != 0,
        question: buf.get(HEADER_LEN..question_end)?,
    })
}

/// Whether `received` answers `sent`: same transaction id, QR set and an
/// identical question.
///
/// Names compare case-insensitively. Label length octets are at most 63, so
/// ASCII case folding leaves them untouched. Anything the fast parse rejects
/// does not match.
pub fn response_matches(sent: &[u8], received: &[u8]) -> bool {
    let (Some(sent), Some(received)) = (parse_question(sent), parse_question(received)) else {
        return false;
    };

    received.id == sent.id
        && received.is_response
        && received.question.eq_ignore_ascii_case(sent.question)
}
