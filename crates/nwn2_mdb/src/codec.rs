//! Fixed width primitives shared by every packet.
//!
//! Strings in an MDB archive are never length prefixed, they occupy a fixed
//! number of bytes and are padded with `\0`.

use std::fmt;
use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinResult, BinWrite, Endian};
use derive_more::derive::Constructor;

/// A null padded ASCII field of exactly `N` bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedString<const N: usize>([u8; N]);

impl<const N: usize> FixedString<N> {
    /// Width of the field in bytes
    pub const SIZE: usize = N;

    /// Build a field from `value`, truncating anything past `N` bytes
    pub fn new(value: &str) -> Self {
        let mut buffer = [0u8; N];
        let bytes = value.as_bytes();
        let len = bytes.len().min(N);
        buffer[..len].copy_from_slice(&bytes[..len]);
        Self(buffer)
    }

    /// The bytes up to the first `\0`
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(N);
        &self.0[..end]
    }

    /// The whole field including padding
    pub fn raw(&self) -> &[u8; N] {
        &self.0
    }

    /// The content as text, replacing invalid UTF-8
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> From<&str> for FixedString<N> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> PartialEq<str> for FixedString<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> PartialEq<&str> for FixedString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl<const N: usize> BinRead for FixedString<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut buffer = [0u8; N];
        reader.read_exact(&mut buffer)?;
        Ok(Self(buffer))
    }
}

impl<const N: usize> BinWrite for FixedString<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

/// Three little endian `f32`s
#[derive(BinRead, BinWrite, Constructor, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

crate::weld::bit_eq_fields!(Vec3 { x, y, z });

impl Vec3 {
    pub const SIZE: usize = 12;

    pub const ZERO: Vec3 = Vec3::splat(0.0);
    pub const ONE: Vec3 = Vec3::splat(1.0);

    pub const fn splat(value: f32) -> Self {
        Self {
            x: value,
            y: value,
            z: value,
        }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(value: Vec3) -> Self {
        [value.x, value.y, value.z]
    }
}

/// Row major 3x3 orientation
pub type Matrix3 = [[f32; 3]; 3];

pub(crate) const MATRIX3_SIZE: usize = 36;
