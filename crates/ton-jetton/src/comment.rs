//! Text comment forward payloads.
//!
//! A comment is `text_comment#00000000 text:(bytes)` kept in a single cell.
//! No comment at all is an empty payload, not a tagged empty string.

use ton_cell::{Cell, CellBuilder, MAX_CELL_BITS};
use tracing::trace;

use crate::error::{JettonError, JettonResult};

/// Opcode of a plain text comment.
pub const OP_COMMENT: u32 = 0x0000_0000;

/// Longest comment, in UTF-8 bytes, that fits next to the opcode.
pub const MAX_COMMENT_BYTES: usize = (MAX_CELL_BITS - 32) / 8;

/// Encode an optional comment as a forward payload cell.
///
/// `None` and `""` both give a cell with zero bits.
pub fn encode_comment(comment: Option<&str>) -> JettonResult<Cell> {
    let text = match comment {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(Cell::empty()),
    };

    let bits = 32 + text.len() * 8;
    if bits > MAX_CELL_BITS {
        return Err(JettonError::PayloadTooLarge {
            field: "comment",
            bits,
            available: MAX_CELL_BITS,
        });
    }
    trace!(bytes = text.len(), "encoding comment payload");

    let mut builder = CellBuilder::new();
    builder.store_u32(OP_COMMENT)?;
    builder.store_bytes(text.as_bytes())?;
    Ok(builder.build()?)
}
