//! Decimal floating-point packing for amounts and fees.
//!
//! The network stores transfer amounts and fees as `mantissa × 10^exponent`
//! with fixed bit widths. This module converts between full integers and
//! that compact byte form, bit for bit as the circuit expects it.
//!
//! Packing is lossy by construction: [`pack`] silently drops the digits that
//! do not fit the mantissa. Everything that ends up in a signing payload goes
//! through [`pack_amount_checked`] or [`pack_fee_checked`] instead, which
//! refuse any value that does not survive a round trip.

use alloy_primitives::U256;

use crate::error::EncodingError;

/// Exponent base of the packed representation.
pub const PACKING_BASE: u64 = 10;

/// Bit widths of a packed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedWidths {
    /// Number of exponent bits.
    pub exponent_bits: usize,
    /// Number of mantissa bits.
    pub mantissa_bits: usize,
}

impl PackedWidths {
    /// Widths used for token amounts (5-bit exponent, 35-bit mantissa).
    pub const AMOUNT: Self = Self::new(5, 35);

    /// Widths used for fees (5-bit exponent, 11-bit mantissa).
    pub const FEE: Self = Self::new(5, 11);

    /// Creates a new width pair.
    #[must_use]
    pub const fn new(exponent_bits: usize, mantissa_bits: usize) -> Self {
        Self {
            exponent_bits,
            mantissa_bits,
        }
    }

    /// Total number of bits.
    #[must_use]
    pub const fn total_bits(&self) -> usize {
        self.exponent_bits + self.mantissa_bits
    }

    /// Length in bytes of a packed value.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.total_bits() / 8
    }

    const fn too_wide(&self) -> PackError {
        PackError::WidthsTooWide {
            exponent_bits: self.exponent_bits,
            mantissa_bits: self.mantissa_bits,
        }
    }

    /// Largest mantissa, `2^mantissa_bits - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::WidthsTooWide`] if the mantissa exceeds 256 bits.
    pub fn max_mantissa(&self) -> Result<U256, PackError> {
        U256::from(1u8)
            .checked_shl(self.mantissa_bits)
            .map(|bound| bound - U256::from(1u8))
            .ok_or_else(|| self.too_wide())
    }

    /// Largest exponent multiplier, `10^(2^exponent_bits - 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::WidthsTooWide`] if the multiplier does not fit in
    /// 256 bits.
    pub fn max_exponent(&self) -> Result<U256, PackError> {
        u32::try_from(self.exponent_bits)
            .ok()
            .and_then(|bits| 1u64.checked_shl(bits))
            .map(|bound| bound - 1)
            .and_then(|exponent| U256::from(PACKING_BASE).checked_pow(U256::from(exponent)))
            .ok_or_else(|| self.too_wide())
    }

    /// Largest value the widths can represent.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::WidthsTooWide`] if the value does not fit in 256
    /// bits.
    pub fn max_value(&self) -> Result<U256, PackError> {
        self.max_mantissa()?
            .checked_mul(self.max_exponent()?)
            .ok_or_else(|| self.too_wide())
    }
}

/// Which kind of number was being packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedKind {
    /// A token amount.
    Amount,
    /// A fee.
    Fee,
}

impl std::fmt::Display for PackedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amount => f.write_str("amount"),
            Self::Fee => f.write_str("fee"),
        }
    }
}

/// Errors from packing and unpacking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    /// The value exceeds `max_mantissa × max_exponent`.
    #[error("value {value} is too large to pack, maximum is {max}")]
    ValueTooLarge {
        /// The rejected value.
        value: U256,
        /// The largest representable value.
        max: U256,
    },
    /// Packing the value would lose precision.
    #[error("{kind} {value} is not packable")]
    ValueNotPackable {
        /// What was being packed.
        kind: PackedKind,
        /// The rejected value.
        value: U256,
    },
    /// The packed input does not have the expected length.
    #[error("packed value must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        actual: usize,
    },
    /// The widths do not describe a whole number of bytes.
    #[error("bit widths {exponent_bits}+{mantissa_bits} are not byte aligned")]
    UnalignedWidths {
        /// Exponent bits.
        exponent_bits: usize,
        /// Mantissa bits.
        mantissa_bits: usize,
    },
    /// The widths describe numbers that do not fit in 256 bits.
    #[error("bit widths {exponent_bits}+{mantissa_bits} overflow 256-bit values")]
    WidthsTooWide {
        /// Exponent bits.
        exponent_bits: usize,
        /// Mantissa bits.
        mantissa_bits: usize,
    },
}

/// Validates `widths` and returns the largest mantissa and value.
fn limits(widths: PackedWidths) -> Result<(U256, U256), PackError> {
    if widths.total_bits() % 8 != 0 || widths.total_bits() == 0 {
        return Err(PackError::UnalignedWidths {
            exponent_bits: widths.exponent_bits,
            mantissa_bits: widths.mantissa_bits,
        });
    }
    Ok((widths.max_mantissa()?, widths.max_value()?))
}

/// Packs bits into bytes, the first bit becoming the top bit of the first byte.
fn bits_into_bytes_be(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, bit)| byte | (u8::from(*bit) << (7 - i)))
        })
        .collect()
}

/// Unpacks bytes into bits, the top bit of the first byte first.
fn bytes_into_bits_be(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |i| byte & (1 << (7 - i)) != 0))
        .collect()
}

/// Reverses the byte order and the bit order inside every byte.
fn reverse_bits(bytes: &mut [u8]) {
    bytes.reverse();
    for byte in bytes.iter_mut() {
        *byte = byte.reverse_bits();
    }
}

/// Packs `value` into `mantissa × 10^exponent` with the given widths.
///
/// This is the raw, lossy encoder: low-order digits that do not fit the
/// mantissa are truncated. Use [`pack_amount_checked`] or
/// [`pack_fee_checked`] for anything that is signed.
///
/// # Errors
///
/// Returns [`PackError::ValueTooLarge`] when the value exceeds the largest
/// representable number, [`PackError::UnalignedWidths`] for widths that
/// are not a whole number of bytes and [`PackError::WidthsTooWide`] for
/// widths whose range exceeds 256 bits.
pub fn pack(value: U256, widths: PackedWidths) -> Result<Vec<u8>, PackError> {
    let (max_mantissa, max) = limits(widths)?;
    if value > max {
        return Err(PackError::ValueTooLarge { value, max });
    }

    let base = U256::from(PACKING_BASE);
    let mut exponent = 0usize;
    let mut mantissa = value;
    while mantissa > max_mantissa {
        mantissa /= base;
        exponent += 1;
    }

    // Exponent then mantissa, each least significant bit first.
    let mut encoding = Vec::with_capacity(widths.total_bits());
    encoding.extend((0..widths.exponent_bits).map(|i| exponent & (1 << i) != 0));
    encoding.extend((0..widths.mantissa_bits).map(|i| mantissa.bit(i)));
    encoding.reverse();

    let mut bytes = bits_into_bytes_be(&encoding);
    reverse_bits(&mut bytes);
    Ok(bytes)
}

/// Decodes bytes produced by [`pack`].
///
/// # Errors
///
/// Returns [`PackError::InvalidLength`] when `bytes` is not exactly
/// `widths.byte_len()` long, or the width errors of [`pack`].
pub fn unpack(bytes: &[u8], widths: PackedWidths) -> Result<U256, PackError> {
    limits(widths)?;
    if bytes.len() != widths.byte_len() {
        return Err(PackError::InvalidLength {
            expected: widths.byte_len(),
            actual: bytes.len(),
        });
    }
    let mut bytes = bytes.to_vec();
    reverse_bits(&mut bytes);
    let mut bits = bytes_into_bits_be(&bytes);
    bits.reverse();

    let (exponent_bits, mantissa_bits) = bits.split_at(widths.exponent_bits);
    let exponent = exponent_bits
        .iter()
        .enumerate()
        .filter(|(_, bit)| **bit)
        .fold(0u64, |acc, (i, _)| acc | (1 << i));
    let mantissa = mantissa_bits
        .iter()
        .enumerate()
        .filter(|(_, bit)| **bit)
        .fold(U256::ZERO, |acc, (i, _)| acc | (U256::from(1u8) << i));

    Ok(mantissa * U256::from(PACKING_BASE).pow(U256::from(exponent)))
}

fn pack_checked(value: U256, widths: PackedWidths, kind: PackedKind) -> Result<Vec<u8>, PackError> {
    let packed = pack(value, widths)?;
    if unpack(&packed, widths)? != value {
        return Err(PackError::ValueNotPackable { kind, value });
    }
    Ok(packed)
}

/// Packs a token amount, failing if any precision would be lost.
///
/// # Errors
///
/// Returns [`PackError::ValueNotPackable`] or [`PackError::ValueTooLarge`].
pub fn pack_amount_checked(amount: U256) -> Result<Vec<u8>, PackError> {
    pack_checked(amount, PackedWidths::AMOUNT, PackedKind::Amount)
}

/// Packs a fee, failing if any precision would be lost.
///
/// # Errors
///
/// Returns [`PackError::ValueNotPackable`] or [`PackError::ValueTooLarge`].
pub fn pack_fee_checked(fee: U256) -> Result<Vec<u8>, PackError> {
    pack_checked(fee, PackedWidths::FEE, PackedKind::Fee)
}

/// Decodes a packed token amount.
///
/// # Errors
///
/// Returns [`PackError::InvalidLength`] for input that is not 5 bytes.
pub fn unpack_amount(bytes: &[u8]) -> Result<U256, PackError> {
    unpack(bytes, PackedWidths::AMOUNT)
}

/// Decodes a packed fee.
///
/// # Errors
///
/// Returns [`PackError::InvalidLength`] for input that is not 2 bytes.
pub fn unpack_fee(bytes: &[u8]) -> Result<U256, PackError> {
    unpack(bytes, PackedWidths::FEE)
}

/// Returns `true` if the amount packs without precision loss.
#[must_use]
pub fn is_amount_packable(amount: U256) -> bool {
    pack_amount_checked(amount).is_ok()
}

/// Returns `true` if the fee packs without precision loss.
#[must_use]
pub fn is_fee_amount_packable(fee: U256) -> bool {
    pack_fee_checked(fee).is_ok()
}

/// Rounds `amount` down to the nearest packable token amount.
///
/// # Errors
///
/// Returns [`PackError::ValueTooLarge`] if the amount is out of range.
pub fn closest_packable_amount(amount: U256) -> Result<U256, PackError> {
    unpack(&pack(amount, PackedWidths::AMOUNT)?, PackedWidths::AMOUNT)
}

/// Rounds `fee` down to the nearest packable fee.
///
/// # Errors
///
/// Returns [`PackError::ValueTooLarge`] if the fee is out of range.
pub fn closest_packable_fee_amount(fee: U256) -> Result<U256, PackError> {
    unpack(&pack(fee, PackedWidths::FEE)?, PackedWidths::FEE)
}

/// Width of the unpacked amount field.
pub const FULL_AMOUNT_BYTES: usize = 16;

/// Encodes an amount at full precision: 16 bytes, big-endian, zero-padded.
///
/// # Errors
///
/// Returns [`EncodingError::FieldTooLarge`] if the amount does not fit in
/// 128 bits.
pub fn full_amount_bytes(amount: U256) -> Result<[u8; FULL_AMOUNT_BYTES], EncodingError> {
    let value = u128::try_from(amount).map_err(|_| EncodingError::FieldTooLarge {
        field: "amount",
        width: FULL_AMOUNT_BYTES,
    })?;
    Ok(value.to_be_bytes())
}
