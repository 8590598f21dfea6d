use anyhow::{ensure, Result};
use bytes::Bytes;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::I64 => 8,
            DType::I32 => 4,
            DType::U8 => 1,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::F16 => "f16",
            DType::I64 => "i64",
            DType::I32 => "i32",
            DType::U8 => "u8",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }
    pub fn dims(&self) -> &[usize] {
        &self.0
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Element type, dimensions, flat little-endian buffer.
/// Immutable once constructed; all interpretation belongs to the runtime.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub dtype: DType,
    pub shape: Shape,
    pub data: Bytes,
}

impl Tensor {
    pub fn from_bytes(dtype: DType, shape: Shape, data: Bytes) -> Self {
        Self { dtype, shape, data }
    }

    pub fn from_f32(shape: &[usize], values: &[f32]) -> Self {
        Self {
            dtype: DType::F32,
            shape: Shape::from_slice(shape),
            data: bytes_from_slice(values),
        }
    }

    pub fn from_i64(shape: &[usize], values: &[i64]) -> Self {
        Self {
            dtype: DType::I64,
            shape: Shape::from_slice(shape),
            data: bytes_from_slice(values),
        }
    }

    pub fn from_i32(shape: &[usize], values: &[i32]) -> Self {
        Self {
            dtype: DType::I32,
            shape: Shape::from_slice(shape),
            data: bytes_from_slice(values),
        }
    }

    pub fn from_u8(shape: &[usize], values: &[u8]) -> Self {
        Self {
            dtype: DType::U8,
            shape: Shape::from_slice(shape),
            data: Bytes::copy_from_slice(values),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn to_f32(&self) -> Result<Vec<f32>> {
        ensure!(self.dtype == DType::F32, "tensor is {}, not f32", self.dtype);
        ensure!(
            self.data.len() % 4 == 0,
            "f32 tensor has invalid byte length {}",
            self.data.len()
        );
        Ok(self
            .data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    pub fn to_i64(&self) -> Result<Vec<i64>> {
        ensure!(self.dtype == DType::I64, "tensor is {}, not i64", self.dtype);
        ensure!(
            self.data.len() % 8 == 0,
            "i64 tensor has invalid byte length {}",
            self.data.len()
        );
        Ok(self
            .data
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect())
    }

    pub fn to_i32(&self) -> Result<Vec<i32>> {
        ensure!(self.dtype == DType::I32, "tensor is {}, not i32", self.dtype);
        ensure!(
            self.data.len() % 4 == 0,
            "i32 tensor has invalid byte length {}",
            self.data.len()
        );
        Ok(self
            .data
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

pub fn bytes_from_slice<T>(slice: &[T]) -> Bytes {
    let byte_len = std::mem::size_of_val(slice);
    let ptr = slice.as_ptr().cast::<u8>();
    let bytes = unsafe { std::slice::from_raw_parts(ptr, byte_len) };
    Bytes::copy_from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_numel_and_rank() {
        let s = Shape::from_slice(&[3, 4]);
        assert_eq!(s.rank(), 2);
        assert_eq!(s.numel(), 12);
        assert_eq!(Shape::from_slice(&[]).numel(), 1);
    }

    #[test]
    fn f32_round_trip() {
        let t = Tensor::from_f32(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t.byte_len(), 16);
        assert_eq!(t.to_f32().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn typed_extraction_rejects_wrong_dtype() {
        let t = Tensor::from_i64(&[2], &[1, 2]);
        assert!(t.to_f32().is_err());
        assert_eq!(t.to_i64().unwrap(), vec![1, 2]);
    }
}
