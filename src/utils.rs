use crate::parse::ScalarType;
use crate::write_vtk::HeaderType;

use num_traits::ToPrimitive;

/// read the block length prefix at the front of `bytes`
pub(crate) fn read_length(header: HeaderType, bytes: &[u8]) -> Option<u64> {
    match header {
        HeaderType::UInt32 => {
            let prefix: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
            Some(u64::from(u32::from_le_bytes(prefix)))
        }
        HeaderType::UInt64 => {
            let prefix: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
            Some(u64::from_le_bytes(prefix))
        }
    }
}

/// little endian values of type `scalar`, widened to `f64`
///
/// trailing bytes that do not fill a whole value are ignored
pub(crate) fn decode_le(scalar: ScalarType, bytes: &[u8]) -> Vec<f64> {
    match scalar {
        ScalarType::Float64 => decode(bytes, f64::from_le_bytes),
        ScalarType::Float32 => decode(bytes, f32::from_le_bytes),
        ScalarType::Int64 => decode(bytes, i64::from_le_bytes),
        ScalarType::Int32 => decode(bytes, i32::from_le_bytes),
        ScalarType::Int8 => decode(bytes, i8::from_le_bytes),
        ScalarType::UInt64 => decode(bytes, u64::from_le_bytes),
        ScalarType::UInt32 => decode(bytes, u32::from_le_bytes),
        ScalarType::UInt8 => bytes.iter().map(|b| f64::from(*b)).collect(),
    }
}

fn decode<T, F, const N: usize>(bytes: &[u8], from_le_bytes: F) -> Vec<f64>
where
    T: ToPrimitive,
    F: Fn([u8; N]) -> T,
{
    bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut arr = [0; N];
            arr.copy_from_slice(chunk);
            from_le_bytes(arr).to_f64().unwrap_or(f64::NAN)
        })
        .collect()
}
