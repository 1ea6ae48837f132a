//! Layout compilation: turns an ordered field list into a flat slot layout.
//!
//! Every field starts at an offset that is a multiple of its own alignment.
//! Implicit padding is inserted where needed; it carries no value. The record
//! takes the largest alignment of its fields and its size is rounded up to
//! that alignment, so arrays of records stay aligned.

use tracing::trace;

use crate::{
    field::{Node, fits_in_buffer},
    slot::SlotKind,
};

/// Bytes needed to move `position` up to a multiple of `alignment`.
#[inline]
pub fn align_padding(position: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    match position % alignment {
        0 => 0,
        rem => alignment - rem,
    }
}

/// Compiled layout of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLayout {
    /// Flat slot layout including implicit padding.
    pub format: Vec<SlotKind>,
    /// Byte offset of each field, in field order.
    pub offsets: Vec<usize>,
    /// Total size including trailing padding.
    pub size: usize,
    /// Largest alignment of any field, at least 1.
    pub alignment: usize,
}

impl CompiledLayout {
    /// Size [CompiledLayout::compile] would produce for `nodes`, or `None` if
    /// it does not fit in a buffer.
    pub fn checked_size<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Option<usize> {
        let mut offset = 0usize;
        let mut alignment = 1usize;

        for node in nodes {
            let field_alignment = node.alignment();
            offset = offset
                .checked_add(align_padding(offset, field_alignment))?
                .checked_add(node.checked_size()?)?;
            alignment = alignment.max(field_alignment);
        }

        fits_in_buffer(offset.checked_add(align_padding(offset, alignment))?)
    }

    pub fn compile<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut format = Vec::new();
        let mut offsets = Vec::new();
        let mut offset = 0usize;
        let mut alignment = 1usize;

        for node in nodes {
            let field_alignment = node.alignment();
            let pad = align_padding(offset, field_alignment);
            if pad > 0 {
                trace!(offset, pad, "inserting alignment padding");
                format.push(SlotKind::Pad(pad));
                offset += pad;
            }

            offsets.push(offset);
            node.append_format(&mut format);
            offset += node.size();
            alignment = alignment.max(field_alignment);
        }

        let tail = align_padding(offset, alignment);
        if tail > 0 {
            format.push(SlotKind::Pad(tail));
            offset += tail;
        }

        CompiledLayout {
            format,
            offsets,
            size: offset,
            alignment,
        }
    }
}
