use std::ops::Range;

use crate::{MlErr, Result};

/// Maps the network's flat parameter buffer into one contiguous slice per layer.
///
/// Slices follow layer insertion order and parameterless layers get an empty range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLayout {
    ranges: Vec<Range<usize>>,
}

impl ParameterLayout {
    /// Builds the layout from the size of every layer, in order.
    pub fn new<I>(sizes: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut offset = 0;
        let ranges = sizes
            .into_iter()
            .map(|size| {
                let range = offset..offset + size;
                offset += size;
                range
            })
            .collect();

        Self { ranges }
    }

    /// The total amount of parameters.
    pub fn size(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.end)
    }

    /// The amount of layers.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn range(&self, layer: usize) -> Option<Range<usize>> {
        self.ranges.get(layer).cloned()
    }

    /// Checks that a buffer can hold exactly this layout.
    ///
    /// # Arguments
    /// * `what` - What the buffer is, for the error message.
    /// * `len` - The buffer's length.
    pub fn validate(&self, what: &'static str, len: usize) -> Result<()> {
        let expected = self.size();
        if len != expected {
            return Err(MlErr::SizeMismatch {
                what,
                got: len,
                expected,
            });
        }

        Ok(())
    }

    /// Splits `buf` into one slice per layer.
    pub fn split<'a>(&self, buf: &'a [f32]) -> Result<Vec<&'a [f32]>> {
        self.validate("parameters", buf.len())?;
        Ok(self.ranges.iter().map(|r| &buf[r.clone()]).collect())
    }

    /// Splits `buf` into one mutable slice per layer.
    pub fn split_mut<'a>(&self, buf: &'a mut [f32]) -> Result<Vec<&'a mut [f32]>> {
        self.validate("gradient", buf.len())?;

        let mut rest = buf;
        let mut chunks = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            let (head, tail) = rest.split_at_mut(range.len());
            chunks.push(head);
            rest = tail;
        }

        Ok(chunks)
    }
}
