//! Typed array content storage.
//!
//! Each record owns exactly one serialized numeric array with an explicit
//! element type. The array is stored as a bincode-encoded [`ArraySlab`]: an
//! element type tag, a shape, and the flat payload in row-major order.
//! Writes always replace the whole file; there are no partial or append
//! writes.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};

/// Element type of a stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    F32,
    F64,
    I16,
    I32,
    I64,
    U8,
}

impl ElementType {
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        match s {
            "f32" | "float32" => Ok(ElementType::F32),
            "f64" | "float64" => Ok(ElementType::F64),
            "i16" | "int16" => Ok(ElementType::I16),
            "i32" | "int32" => Ok(ElementType::I32),
            "i64" | "int64" => Ok(ElementType::I64),
            "u8" | "uint8" => Ok(ElementType::U8),
            other => Err(CatalogError::InvalidInput(format!(
                "unknown element type: {other}"
            ))),
        }
    }
}

/// Flat payload, one vector per element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Payload {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
}

impl Payload {
    fn len(&self) -> usize {
        match self {
            Payload::F32(v) => v.len(),
            Payload::F64(v) => v.len(),
            Payload::I16(v) => v.len(),
            Payload::I32(v) => v.len(),
            Payload::I64(v) => v.len(),
            Payload::U8(v) => v.len(),
        }
    }

    fn from_f64(values: &[f64], dtype: ElementType) -> Payload {
        match dtype {
            ElementType::F32 => Payload::F32(values.iter().map(|v| *v as f32).collect()),
            ElementType::F64 => Payload::F64(values.to_vec()),
            ElementType::I16 => Payload::I16(values.iter().map(|v| *v as i16).collect()),
            ElementType::I32 => Payload::I32(values.iter().map(|v| *v as i32).collect()),
            ElementType::I64 => Payload::I64(values.iter().map(|v| *v as i64).collect()),
            ElementType::U8 => Payload::U8(values.iter().map(|v| *v as u8).collect()),
        }
    }

    fn to_f64(&self) -> Vec<f64> {
        match self {
            Payload::F32(v) => v.iter().map(|x| *x as f64).collect(),
            Payload::F64(v) => v.clone(),
            Payload::I16(v) => v.iter().map(|x| *x as f64).collect(),
            Payload::I32(v) => v.iter().map(|x| *x as f64).collect(),
            Payload::I64(v) => v.iter().map(|x| *x as f64).collect(),
            Payload::U8(v) => v.iter().map(|x| *x as f64).collect(),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Payload {
        match self {
            Payload::F32(v) => Payload::F32(v[start..end].to_vec()),
            Payload::F64(v) => Payload::F64(v[start..end].to_vec()),
            Payload::I16(v) => Payload::I16(v[start..end].to_vec()),
            Payload::I32(v) => Payload::I32(v[start..end].to_vec()),
            Payload::I64(v) => Payload::I64(v[start..end].to_vec()),
            Payload::U8(v) => Payload::U8(v[start..end].to_vec()),
        }
    }
}

/// A typed numeric array with a shape.
///
/// The first axis is the record axis: ranged reads slice along it. A 1-D
/// array has shape `[len]`; a matrix of n traces with m samples each has
/// shape `[n, m]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySlab {
    dtype: ElementType,
    shape: Vec<usize>,
    payload: Payload,
}

impl ArraySlab {
    /// Build a 1-D slab, casting the input to `dtype`.
    pub fn from_slice(values: &[f64], dtype: ElementType) -> ArraySlab {
        ArraySlab {
            dtype,
            shape: vec![values.len()],
            payload: Payload::from_f64(values, dtype),
        }
    }

    /// Build a 2-D slab from rows, casting to `dtype`. Rows must be equal
    /// length.
    pub fn from_rows(rows: &[Vec<f64>], dtype: ElementType) -> Result<ArraySlab, CatalogError> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(CatalogError::InvalidInput(
                "rows must all have the same length".to_string(),
            ));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Ok(ArraySlab {
            dtype,
            shape: vec![rows.len(), cols],
            payload: Payload::from_f64(&flat, dtype),
        })
    }

    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Length along the first axis.
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn row_len(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// Slice `[start, end)` along the first axis with slice-style clamping:
    /// bounds past the end are clamped, `start >= len` yields an empty slab.
    pub fn row_slice(&self, start: usize, end: usize) -> ArraySlab {
        let n = self.len();
        let start = start.min(n);
        let end = end.min(n).max(start);
        let row_len = self.row_len();
        let mut shape = self.shape.clone();
        if let Some(first) = shape.first_mut() {
            *first = end - start;
        }
        ArraySlab {
            dtype: self.dtype,
            shape,
            payload: self.payload.slice(start * row_len, end * row_len),
        }
    }

    /// Flatten to f64, row-major.
    pub fn to_f64(&self) -> Vec<f64> {
        self.payload.to_f64()
    }

    /// Re-cast to another element type, through f64.
    pub fn cast(&self, dtype: ElementType) -> ArraySlab {
        ArraySlab {
            dtype,
            shape: self.shape.clone(),
            payload: Payload::from_f64(&self.payload.to_f64(), dtype),
        }
    }

    /// Encode for the content file.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CatalogError> {
        bincode::serialize(self).map_err(|e| CatalogError::Serialization(e.to_string()))
    }

    /// Decode from a content file.
    pub fn from_bytes(bytes: &[u8]) -> Result<ArraySlab, CatalogError> {
        let slab: ArraySlab =
            bincode::deserialize(bytes).map_err(|e| CatalogError::Serialization(e.to_string()))?;
        if slab.shape.is_empty() {
            return Err(CatalogError::Serialization(
                "array shape must have at least one dimension".to_string(),
            ));
        }
        let expected: usize = slab.shape.iter().product();
        if slab.payload.len() != expected {
            return Err(CatalogError::Serialization(format!(
                "payload length {} does not match shape {:?}",
                slab.payload.len(),
                slab.shape
            )));
        }
        Ok(slab)
    }
}
