//! Fixed size attachment points: hooks, hair and helm.
//!
//! None of these carry variable length data, the whole packet is its header.

use binrw::{binrw, BinRead, BinWrite};

use crate::codec::{FixedString, Matrix3, Vec3, MATRIX3_SIZE};
use crate::types::{NAME_LEN, PACKET_HEADER_SIZE};

/// Size of a [`Hook`], [`Hair`] or [`Helm`] packet on disk
pub const ATTACHMENT_SIZE: usize = PACKET_HEADER_SIZE + NAME_LEN + 4 + Vec3::SIZE + MATRIX3_SIZE;

const ATTACHMENT_BODY_SIZE: u32 = (ATTACHMENT_SIZE - PACKET_HEADER_SIZE) as u32;

/// How hair is shortened when a helmet is worn
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[brw(repr = u32)]
pub enum HairShortening {
    #[default]
    Low = 0,
    Short = 1,
    Ponytail = 2,
}

/// What a helmet hides on the head wearing it
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[brw(repr = u32)]
pub enum HelmHiding {
    #[default]
    NoneHidden = 0,
    HairHidden = 1,
    PartialHair = 2,
    HeadHidden = 3,
}

/// HOOK packet, a named attachment point
#[binrw]
#[brw(little, magic = b"HOOK")]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hook {
    #[br(temp)]
    #[bw(calc = ATTACHMENT_BODY_SIZE)]
    packet_size: u32,

    pub name: FixedString<NAME_LEN>,
    pub point_type: u16,
    pub point_size: u16,
    pub position: Vec3,
    pub orientation: Matrix3,
}

impl Hook {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// HAIR packet
#[binrw]
#[brw(little, magic = b"HAIR")]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hair {
    #[br(temp)]
    #[bw(calc = ATTACHMENT_BODY_SIZE)]
    packet_size: u32,

    pub name: FixedString<NAME_LEN>,
    pub shortening: HairShortening,
    pub position: Vec3,
    pub orientation: Matrix3,
}

impl Hair {
    pub fn new(name: &str, shortening: HairShortening) -> Self {
        Self {
            name: name.into(),
            shortening,
            ..Default::default()
        }
    }
}

/// HELM packet
#[binrw]
#[brw(little, magic = b"HELM")]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Helm {
    #[br(temp)]
    #[bw(calc = ATTACHMENT_BODY_SIZE)]
    packet_size: u32,

    pub name: FixedString<NAME_LEN>,
    pub hiding: HelmHiding,
    pub position: Vec3,
    pub orientation: Matrix3,
}

impl Helm {
    pub fn new(name: &str, hiding: HelmHiding) -> Self {
        Self {
            name: name.into(),
            hiding,
            ..Default::default()
        }
    }
}
