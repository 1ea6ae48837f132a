//! Records: ordered, named aggregations of nodes.
//!
//! A record is assembled with a [RecordBuilder] and compiled once by
//! [RecordBuilder::build]. The built [Record] is immutable; to embed it in
//! other records convert it into a [Node], which shares it behind an `Arc`.

use tracing::debug;

use crate::{
    compiled::CompiledLayout, errors::CompileError, field::Node, slot::SlotKind,
};

/// A named field of a built record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub node: Node,
    /// Byte offset from the start of the record.
    pub offset: usize,
}

/// A compiled record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<RecordField>,
    layout: CompiledLayout,
}

impl Record {
    pub fn builder() -> RecordBuilder {
        RecordBuilder::new()
    }

    /// Fields in definition order.
    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.field(name).map(|f| f.offset)
    }

    pub fn size(&self) -> usize {
        self.layout.size
    }

    pub fn alignment(&self) -> usize {
        self.layout.alignment
    }

    /// Flat slot layout, implicit padding included.
    pub fn format(&self) -> &[SlotKind] {
        &self.layout.format
    }

    pub fn layout(&self) -> &CompiledLayout {
        &self.layout
    }
}

/// Collects fields in order, then compiles them into a [Record].
///
/// Fields can be chained with [RecordBuilder::field] or added one at a time
/// with [RecordBuilder::define].
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    fields: Vec<(String, Node)>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.define(name, node);
        self
    }

    pub fn define(&mut self, name: impl Into<String>, node: impl Into<Node>) -> &mut Self {
        self.fields.push((name.into(), node.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates the fields and compiles the layout.
    pub fn build(self) -> Result<Record, CompileError> {
        for (i, (name, node)) in self.fields.iter().enumerate() {
            if name.is_empty() {
                return Err(CompileError::InvalidFieldName);
            }
            if self.fields[..i].iter().any(|(n, _)| n == name) {
                return Err(CompileError::DuplicateFieldName(name.clone()));
            }
            node.validate()?;
        }

        if CompiledLayout::checked_size(self.fields.iter().map(|(_, node)| node)).is_none() {
            return Err(CompileError::LayoutTooLarge);
        }

        Ok(self.build_unchecked())
    }

    /// Compiles without validation, for definitions known to be valid.
    pub(crate) fn build_unchecked(self) -> Record {
        let layout = CompiledLayout::compile(self.fields.iter().map(|(_, node)| node));
        debug!(
            fields = self.fields.len(),
            size = layout.size,
            alignment = layout.alignment,
            "compiled record layout"
        );

        let fields = self
            .fields
            .into_iter()
            .zip(&layout.offsets)
            .map(|((name, node), &offset)| RecordField { name, node, offset })
            .collect();

        Record { fields, layout }
    }
}
