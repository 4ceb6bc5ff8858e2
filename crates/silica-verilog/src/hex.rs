//! Hex interchange files
//!
//! Buffers cross the host/simulator boundary as plain text: one value per
//! line, each line the 16-hex-digit bit pattern of an IEEE-754 double.
//! Host buffers hold f32; values are widened to f64 on the way out (the
//! simulator computes on 64-bit `real`) and narrowed back on the way in.

use std::fs;
use std::io;
use std::path::Path;

/// Output interchange file written by the simulation
pub const OUTPUT_FILE: &str = "output_0.hex";

/// Interchange file name for input buffer `id`
pub fn input_file_name(id: i64) -> String {
    format!("input_{id}.hex")
}

/// Encode one f32 as the hex bit pattern of its widened f64
pub fn encode_f32(value: f32) -> String {
    format!("{:016x}", f64::from(value).to_bits())
}

/// Decode one interchange line back to f32
///
/// Returns `None` for blank lines, `//` comments, `x`-prefixed unresolved
/// 4-state values, and anything that does not parse as hex. Malformed
/// lines are skipped, never fatal.
pub fn decode_f32(line: &str) -> Option<f32> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") || line.starts_with('x') || line.starts_with('X') {
        return None;
    }
    let bits = u64::from_str_radix(line, 16).ok()?;
    Some(f64::from_bits(bits) as f32)
}

/// Write a host buffer to an interchange file
///
/// The buffer's raw bytes are reinterpreted as f32 values; a trailing
/// partial element, if any, is ignored.
pub fn write_hex_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut text = String::with_capacity((bytes.len() / 4) * 17);
    for chunk in bytes.chunks_exact(4) {
        let value: f32 = bytemuck::pod_read_unaligned(chunk);
        text.push_str(&encode_f32(value));
        text.push('\n');
    }
    fs::write(path, text)
}

/// Read an interchange file back into a host buffer
///
/// Fills `dest` front-to-back with narrowed f32 values, stopping at the
/// lesser of values read and buffer capacity. The unwritten tail is left
/// unchanged. Returns the number of values written.
pub fn read_hex_file(path: &Path, dest: &mut [u8]) -> io::Result<usize> {
    let text = fs::read_to_string(path)?;
    let capacity = dest.len() / 4;
    let mut written = 0;
    for line in text.lines() {
        if written == capacity {
            break;
        }
        if let Some(value) = decode_f32(line) {
            dest[written * 4..written * 4 + 4].copy_from_slice(&value.to_ne_bytes());
            written += 1;
        }
    }
    Ok(written)
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: f32) -> f32 {
        decode_f32(&encode_f32(value)).unwrap()
    }

    #[test]
    fn test_round_trip_finite_values() {
        for v in [0.0f32, 1.0, -1.0, 5.5, 1e30, -1e-30, f32::MAX, f32::MIN_POSITIVE] {
            assert_eq!(round_trip(v), v);
        }
    }

    #[test]
    fn test_round_trip_negative_zero() {
        let v = round_trip(-0.0);
        assert_eq!(v, 0.0);
        assert!(v.is_sign_negative());
    }

    #[test]
    fn test_round_trip_subnormals() {
        let tiny = f32::from_bits(1); // smallest positive subnormal
        assert_eq!(round_trip(tiny), tiny);
        assert_eq!(round_trip(-tiny), -tiny);
    }

    #[test]
    fn test_encode_is_sixteen_digits() {
        assert_eq!(encode_f32(0.0), "0000000000000000");
        assert_eq!(encode_f32(1.0), "3ff0000000000000");
        assert_eq!(encode_f32(6.0).len(), 16);
    }

    #[test]
    fn test_decode_skips_junk_lines() {
        assert_eq!(decode_f32(""), None);
        assert_eq!(decode_f32("   "), None);
        assert_eq!(decode_f32("// comment"), None);
        assert_eq!(decode_f32("xxxxxxxxxxxxxxxx"), None);
        assert_eq!(decode_f32("not-hex"), None);
        assert_eq!(decode_f32("3ff0000000000000"), Some(1.0));
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = std::env::temp_dir().join("silica-hex-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(input_file_name(1));

        let values = [1.0f32, 2.0, 3.0, 4.0];
        let mut bytes = Vec::new();
        for v in values {
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
        write_hex_file(&path, &bytes).unwrap();

        let mut out = vec![0u8; 16];
        let n = read_hex_file(&path, &mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(bytemuck::cast_slice::<u8, f32>(&out), &values);
    }

    #[test]
    fn test_truncated_file_leaves_tail_unchanged() {
        let dir = std::env::temp_dir().join("silica-hex-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("truncated.hex");
        // two valid lines, one comment, one malformed
        std::fs::write(&path, "3ff0000000000000\n// note\nbogus\n4000000000000000\n").unwrap();

        let mut out = Vec::new();
        for v in [9.0f32, 9.0, 9.0, 9.0] {
            out.extend_from_slice(&v.to_ne_bytes());
        }
        let n = read_hex_file(&path, &mut out).unwrap();
        assert_eq!(n, 2);
        let floats: &[f32] = bytemuck::cast_slice(&out);
        assert_eq!(floats, &[1.0, 2.0, 9.0, 9.0]);
    }

    #[test]
    fn test_read_bounded_by_capacity() {
        let dir = std::env::temp_dir().join("silica-hex-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("overlong.hex");
        let mut text = String::new();
        for _ in 0..10 {
            text.push_str("3ff0000000000000\n");
        }
        std::fs::write(&path, text).unwrap();

        let mut out = vec![0u8; 8]; // room for two f32s
        let n = read_hex_file(&path, &mut out).unwrap();
        assert_eq!(n, 2);
    }
}
