use std::io::{self, Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use nwn2_mdb::error::{Error, FormatError, Result};
use nwn2_mdb::packet::{CollisionKind, Face, HelmHiding};
use nwn2_mdb::{MdbArchive, Packet, Tag};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn name_field(out: &mut Vec<u8>, name: &str, width: usize) {
    let mut field = name.as_bytes().to_vec();
    field.resize(width, 0);
    out.extend(field);
}

fn write_f32s(out: &mut Vec<u8>, values: &[f32]) -> io::Result<()> {
    for value in values {
        out.write_f32::<LittleEndian>(*value)?;
    }
    Ok(())
}

fn default_material(out: &mut Vec<u8>, diffuse_map: &str) -> io::Result<()> {
    name_field(out, diffuse_map, 32);
    for _ in 0..3 {
        name_field(out, "", 32);
    }
    write_f32s(out, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0])?;
    out.write_u32::<LittleEndian>(0)
}

/// RIGD body with three vertices and a single face
fn rigid_body(tag: &[u8; 4]) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_all(tag)?;
    body.write_u32::<LittleEndian>(205 + 3 * 60 + 6)?;
    name_field(&mut body, "Torso", 33);
    default_material(&mut body, "c_torso_d")?;
    body.write_u32::<LittleEndian>(3)?;
    body.write_u32::<LittleEndian>(1)?;

    for x in [0.0, 1.0, 2.0] {
        #[rustfmt::skip]
        let vertex = [
            x, 0.0, 0.0,
            0.0, 0.0, 1.0,
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            x, -x, 1.0,
        ];
        write_f32s(&mut body, &vertex)?;
    }
    for index in [0u16, 1, 2] {
        body.write_u16::<LittleEndian>(index)?;
    }
    Ok(body)
}

fn collision_body(tag: &[u8; 4]) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_all(tag)?;
    body.write_u32::<LittleEndian>(205)?;
    name_field(&mut body, "Box_C2", 33);
    default_material(&mut body, "")?;
    body.write_u32::<LittleEndian>(0)?;
    body.write_u32::<LittleEndian>(0)?;
    Ok(body)
}

fn helm_body() -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_all(b"HELM")?;
    body.write_u32::<LittleEndian>(85)?;
    name_field(&mut body, "HHM_Helm", 33);
    body.write_u32::<LittleEndian>(3)?;
    #[rustfmt::skip]
    let placement = [
        0.0, 0.0, 1.5,
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
    ];
    write_f32s(&mut body, &placement)?;
    Ok(body)
}

/// Header and key table followed by `data`, keys are `(tag, offset)`
fn archive(keys: &[(&[u8; 4], u32)], data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_all(b"NWN2")?;
    out.write_u16::<LittleEndian>(1)?;
    out.write_u16::<LittleEndian>(12)?;
    out.write_u32::<LittleEndian>(keys.len() as u32)?;
    for (tag, offset) in keys {
        out.write_all(*tag)?;
        out.write_u32::<LittleEndian>(*offset)?;
    }
    out.write_all(data)?;
    Ok(out)
}

#[traced_test]
#[test]
fn known_and_unknown_packet() -> Result<()> {
    let rigid = rigid_body(b"RIGD")?;
    let first = 12 + 2 * 8;
    let second = first + rigid.len() as u32;

    let mut data = rigid.clone();
    data.extend_from_slice(b"ABCD\x04\x00\x00\x00\xFF\xFF\xFF\xFF");
    let input = archive(&[(b"RIGD", first), (b"ABCD", second)], &data)?;

    let mdb = MdbArchive::open(Cursor::new(input))?;

    assert_eq!(mdb.packet_count(), 2);
    assert_eq!(mdb.len(), 2);
    assert!(mdb.packet(1).is_none());
    assert_eq!(
        mdb.unsupported().collect::<Vec<_>>(),
        vec![(1, Tag::new(b"ABCD"))]
    );

    let Some(Packet::RigidMesh(mesh)) = mdb.packet(0) else {
        panic!("expected a rigid mesh, got {:?}", mdb.packet(0));
    };
    assert_eq!(mesh.name, "Torso");
    assert_eq!(mesh.material.diffuse_map, "c_torso_d");
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.vertices[2].uvw.y, -2.0);
    assert_eq!(mesh.faces, vec![Face::new([0, 1, 2])]);

    assert!(logs_contain("unsupported packet kept as an empty slot"));
    Ok(())
}

#[test]
fn offsets_are_followed_out_of_order() -> Result<()> {
    let helm = helm_body()?;
    let rigid = rigid_body(b"RIGD")?;
    let start = 12 + 2 * 8;

    // Rigid mesh first on disk, helm after a gap, keys in the other order
    let mut data = rigid.clone();
    data.extend_from_slice(&[0xEE; 16]);
    data.extend_from_slice(&helm);
    let helm_offset = start + rigid.len() as u32 + 16;
    let input = archive(&[(b"HELM", helm_offset), (b"RIGD", start)], &data)?;

    let mdb = MdbArchive::open(Cursor::new(input))?;

    assert_eq!(mdb.keys()[0].offset, helm_offset);
    let Some(Packet::Helm(helm)) = mdb.packet(0) else {
        panic!("expected a helm, got {:?}", mdb.packet(0));
    };
    assert_eq!(helm.name, "HHM_Helm");
    assert_eq!(helm.hiding, HelmHiding::HeadHidden);
    assert_eq!(helm.position.z, 1.5);
    assert_eq!(mdb.packet(1).and_then(|p| p.name()), Some("Torso".into()));
    Ok(())
}

#[test]
fn collision_kind_follows_body_tag() -> Result<()> {
    let start = 12 + 8;
    let input = archive(&[(b"COL3", start)], &collision_body(b"COL2")?)?;

    let mdb = MdbArchive::open(Cursor::new(input))?;

    let Some(Packet::CollisionMesh(mesh)) = mdb.packet(0) else {
        panic!("expected a collision mesh, got {:?}", mdb.packet(0));
    };
    assert_eq!(mesh.kind, CollisionKind::Col2);
    assert_eq!(mdb.packet(0).map(Packet::tag), Some(Tag::new(b"COL2")));
    Ok(())
}

#[test]
fn body_tag_mismatch_fails() -> Result<()> {
    let input = archive(&[(b"RIGD", 12 + 8)], &helm_body()?)?;

    let mdb = MdbArchive::open(Cursor::new(input));

    assert!(matches!(mdb, Err(Error::BinRWError(_))));
    Ok(())
}

#[test]
fn truncated_body_fails() -> Result<()> {
    let mut rigid = rigid_body(b"RIGD")?;
    rigid.truncate(rigid.len() - 4);
    let input = archive(&[(b"RIGD", 12 + 8)], &rigid)?;

    let mdb = MdbArchive::open(Cursor::new(input));

    assert!(matches!(mdb, Err(Error::Format(FormatError::Truncated))));
    Ok(())
}

#[test]
fn collision_body_cut_inside_tag_fails() -> Result<()> {
    let start = 12 + 8;

    for (tag, body) in [(b"COL2", &b"CO"[..]), (b"COL3", &[][..])] {
        let input = archive(&[(tag, start)], body)?;

        let mdb = MdbArchive::open(Cursor::new(input));

        assert!(matches!(mdb, Err(Error::Format(FormatError::Truncated))));
    }
    Ok(())
}

#[test]
fn offset_past_end_fails() -> Result<()> {
    let input = archive(&[(b"HOOK", 0x1000)], &[])?;

    let mdb = MdbArchive::open(Cursor::new(input));

    assert!(matches!(mdb, Err(Error::Format(FormatError::Truncated))));
    Ok(())
}
