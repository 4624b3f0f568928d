//! Building mesh packets from polygon soup.
//!
//! A [`MeshSource`] is the normalized shape a scene importer hands over: one
//! list of corners per polygon plus an optional material and skeleton binding.
//! Only triangles are accepted, anything else is skipped and reported as a
//! [`Warning`]. Corners are welded into the packet's vertex list as they are added.

use bon::Builder;
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::codec::Vec3;
use crate::error::{Error, Result, Warning};
use crate::packet::{
    CollisionKind, CollisionMesh, CollisionVertex, Material, MaterialFlags, Packet, RigidMesh,
    RigidVertex, Skin, SkinVertex,
};
use crate::read::MdbArchive;
use crate::types::PacketType;

/// One bone pulling on a vertex
#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfluence {
    pub bone: String,
    pub weight: f32,
}

impl BoneInfluence {
    pub fn new(bone: impl Into<String>, weight: f32) -> Self {
        Self {
            bone: bone.into(),
            weight,
        }
    }
}

/// Attributes of a single polygon corner
///
/// ```
/// use nwn2_mdb::import::{BoneInfluence, SourceVertex};
///
/// let corner = SourceVertex::builder()
///     .position([0.0, 1.0, 0.0])
///     .normal([0.0, 0.0, 1.0])
///     .uv([0.25, 0.75])
///     .influences(vec![BoneInfluence::new("Spine", 1.0)])
///     .build();
///
/// assert_eq!(corner.uvw().y, -0.75);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct SourceVertex {
    #[builder(into)]
    pub position: Vec3,
    #[builder(into)]
    pub normal: Vec3,
    pub tangent: Option<Vec3>,
    pub binormal: Option<Vec3>,
    pub uv: Option<[f32; 2]>,
    #[builder(default)]
    pub influences: Vec<BoneInfluence>,
}

impl SourceVertex {
    /// Texture coordinate as stored in the archive, V is flipped and W is always 1
    pub fn uvw(&self) -> Vec3 {
        match self.uv {
            Some([u, v]) => Vec3::new(u, -v, 1.0),
            None => Vec3::ZERO,
        }
    }

    fn collision_vertex(&self) -> CollisionVertex {
        CollisionVertex {
            position: self.position,
            normal: self.normal,
            uvw: self.uvw(),
        }
    }

    fn rigid_vertex(&self) -> RigidVertex {
        RigidVertex {
            position: self.position,
            normal: self.normal,
            tangent: self.tangent.unwrap_or(Vec3::ZERO),
            binormal: self.binormal.unwrap_or(Vec3::ZERO),
            uvw: self.uvw(),
        }
    }

    fn skin_vertex(
        &self,
        skeleton: &SkeletonIndex,
        polygon: usize,
        corner: usize,
        warnings: &mut Vec<Warning>,
    ) -> SkinVertex {
        let mut vertex = SkinVertex {
            position: self.position,
            normal: self.normal,
            tangent: self.tangent.unwrap_or(Vec3::ZERO),
            binormal: self.binormal.unwrap_or(Vec3::ZERO),
            uvw: self.uvw(),
            bone_count: SkinVertex::MAX_BONES as f32,
            ..Default::default()
        };

        for (slot, influence) in self.influences.iter().take(SkinVertex::MAX_BONES).enumerate() {
            vertex.bone_indices[slot] = skeleton.resolve_byte(&influence.bone);
            vertex.bone_weights[slot] = influence.weight;
        }

        for influence in self.influences.iter().skip(SkinVertex::MAX_BONES) {
            warn!(polygon, corner, bone = %influence.bone, "a vertex cannot have more than 4 bones");
            warnings.push(Warning::BoneOverflow {
                polygon,
                corner,
                bone: influence.bone.clone(),
            });
        }

        vertex
    }
}

/// Material as described by the importer, converted into a [`Material`] block
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct SourceMaterial {
    #[builder(into, default)]
    pub diffuse_map: String,
    #[builder(into, default)]
    pub normal_map: String,
    #[builder(into, default)]
    pub tint_map: String,
    #[builder(into, default)]
    pub glow_map: String,
    #[builder(into, default = Vec3::ONE)]
    pub diffuse_color: Vec3,
    #[builder(into, default = Vec3::ONE)]
    pub specular_color: Vec3,
    #[builder(default = 1.0)]
    pub specular_level: f32,
    #[builder(default = 1.0)]
    pub specular_power: f32,
    #[builder(default)]
    pub flags: MaterialFlags,
}

impl Default for SourceMaterial {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&SourceMaterial> for Material {
    fn from(value: &SourceMaterial) -> Self {
        Material {
            diffuse_map: value.diffuse_map.as_str().into(),
            normal_map: value.normal_map.as_str().into(),
            tint_map: value.tint_map.as_str().into(),
            glow_map: value.glow_map.as_str().into(),
            diffuse_color: value.diffuse_color,
            specular_color: value.specular_color,
            specular_level: value.specular_level,
            specular_power: value.specular_power,
            flags: value.flags,
        }
    }
}

/// The skeleton a skinned mesh is bound to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinBinding {
    pub skeleton_name: String,
    /// Bone names in skeleton order
    pub bones: Vec<String>,
}

impl SkinBinding {
    pub fn new<I, S>(skeleton_name: impl Into<String>, bones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skeleton_name: skeleton_name.into(),
            bones: bones.into_iter().map(Into::into).collect(),
        }
    }
}

/// One mesh of an imported scene
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct MeshSource {
    #[builder(into)]
    pub name: String,
    #[builder(default)]
    pub polygons: Vec<Vec<SourceVertex>>,
    pub material: Option<SourceMaterial>,
    pub skin: Option<SkinBinding>,
}

impl MeshSource {
    /// The packet this source becomes
    ///
    /// Names ending in `_C2` or `_C3` are collision meshes, otherwise a mesh with a
    /// skeleton binding is a skin and everything else is rigid.
    pub fn kind(&self) -> PacketType {
        if self.name.ends_with("_C2") {
            PacketType::Col2
        } else if self.name.ends_with("_C3") {
            PacketType::Col3
        } else if self.skin.is_some() {
            PacketType::Skin
        } else {
            PacketType::Rigd
        }
    }

    fn material(&self) -> Material {
        self.material.as_ref().map(Material::from).unwrap_or_default()
    }

    /// Call `f` for every triangle, reporting every other polygon as skipped
    fn for_each_triangle<F>(&self, warnings: &mut Vec<Warning>, mut f: F) -> Result<()>
    where
        F: FnMut(usize, &[SourceVertex; 3], &mut Vec<Warning>) -> Result<()>,
    {
        for (polygon, corners) in self.polygons.iter().enumerate() {
            match <&[SourceVertex; 3]>::try_from(corners.as_slice()) {
                Ok(triangle) => f(polygon, triangle, warnings)?,
                Err(_) => {
                    warn!(polygon, corners = corners.len(), "polygon is not a triangle");
                    warnings.push(Warning::NonTriangleFace {
                        polygon,
                        corners: corners.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Maps bone names to the indices a skinned vertex stores
///
/// The numbering skips attachment bones (`ap_` prefix) and `Ribcage`, which
/// itself always resolves to 53. A name that is not in the skeleton resolves to
/// the number of counted bones.
#[derive(Debug, Clone, Default)]
pub struct SkeletonIndex {
    indices: IndexMap<String, u32>,
    counted: u32,
}

impl SkeletonIndex {
    pub const RIBCAGE: &'static str = "Ribcage";
    pub const RIBCAGE_INDEX: u32 = 53;
    pub const ATTACHMENT_PREFIX: &'static str = "ap_";

    pub fn new<I, S>(bones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut indices = IndexMap::new();
        let mut counted = 0;

        for bone in bones {
            let bone = bone.as_ref();
            if bone.starts_with(Self::ATTACHMENT_PREFIX) || bone == Self::RIBCAGE {
                continue;
            }
            // Repeated names still take a slot, lookups stop at the first one
            indices.entry(bone.to_owned()).or_insert(counted);
            counted += 1;
        }

        Self { indices, counted }
    }

    pub fn resolve(&self, bone: &str) -> u32 {
        if bone == Self::RIBCAGE {
            return Self::RIBCAGE_INDEX;
        }
        self.indices.get(bone).copied().unwrap_or(self.counted)
    }

    /// Number of bones that take an index
    pub fn len(&self) -> usize {
        self.counted as usize
    }

    pub fn is_empty(&self) -> bool {
        self.counted == 0
    }

    /// Counted bone names in skeleton order
    pub fn bones(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    /// Index as stored in a vertex, wrapping past 255 like the engine's byte slot
    fn resolve_byte(&self, bone: &str) -> u8 {
        (self.resolve(bone) % 256) as u8
    }
}

impl CollisionMesh {
    /// Build a COL2 or COL3 mesh, the kind follows the source name
    #[instrument(skip_all, fields(name = %source.name), err)]
    pub fn from_source(source: &MeshSource) -> Result<(Self, Vec<Warning>)> {
        let kind = match source.kind() {
            PacketType::Col2 => CollisionKind::Col2,
            _ => CollisionKind::Col3,
        };

        let mut mesh = CollisionMesh::new(kind, &source.name);
        mesh.material = source.material();

        let mut warnings = Vec::new();
        source.for_each_triangle(&mut warnings, |_, [a, b, c], _| {
            mesh.push_triangle([a.collision_vertex(), b.collision_vertex(), c.collision_vertex()])
                .map(drop)
        })?;

        debug!(vertices = mesh.vertices.len(), faces = mesh.faces.len(), "built collision mesh");
        Ok((mesh, warnings))
    }
}

impl RigidMesh {
    #[instrument(skip_all, fields(name = %source.name), err)]
    pub fn from_source(source: &MeshSource) -> Result<(Self, Vec<Warning>)> {
        let mut mesh = RigidMesh::new(&source.name);
        mesh.material = source.material();

        let mut warnings = Vec::new();
        source.for_each_triangle(&mut warnings, |_, [a, b, c], _| {
            mesh.push_triangle([a.rigid_vertex(), b.rigid_vertex(), c.rigid_vertex()])
                .map(drop)
        })?;

        debug!(vertices = mesh.vertices.len(), faces = mesh.faces.len(), "built rigid mesh");
        Ok((mesh, warnings))
    }
}

impl Skin {
    /// Build a skinned mesh, resolving bone names against the source's skeleton
    #[instrument(skip_all, fields(name = %source.name), err)]
    pub fn from_source(source: &MeshSource) -> Result<(Self, Vec<Warning>)> {
        let binding = source
            .skin
            .as_ref()
            .ok_or_else(|| Error::MissingSkeleton(source.name.clone()))?;
        let skeleton = SkeletonIndex::new(&binding.bones);

        let mut mesh = Skin::new(&source.name, &binding.skeleton_name);
        mesh.material = source.material();

        let mut warnings = Vec::new();
        source.for_each_triangle(&mut warnings, |polygon, corners, warnings| {
            let mut vertices = [SkinVertex::default(); 3];
            for (corner, (vertex, input)) in vertices.iter_mut().zip(corners).enumerate() {
                *vertex = input.skin_vertex(&skeleton, polygon, corner, warnings);
            }
            mesh.push_triangle(vertices).map(drop)
        })?;

        debug!(vertices = mesh.vertices.len(), faces = mesh.faces.len(), "built skin");
        Ok((mesh, warnings))
    }
}

/// Build whichever packet [`MeshSource::kind`] selects
pub fn import_mesh(source: &MeshSource) -> Result<(Packet, Vec<Warning>)> {
    match source.kind() {
        PacketType::Col2 | PacketType::Col3 => {
            CollisionMesh::from_source(source).map(|(mesh, w)| (mesh.into(), w))
        }
        PacketType::Skin => Skin::from_source(source).map(|(mesh, w)| (mesh.into(), w)),
        _ => RigidMesh::from_source(source).map(|(mesh, w)| (mesh.into(), w)),
    }
}

impl MdbArchive {
    /// Import `source` and append the resulting packet
    pub fn import(&mut self, source: &MeshSource) -> Result<Vec<Warning>> {
        let (packet, warnings) = import_mesh(source)?;
        self.add_packet(packet);
        Ok(warnings)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::codec::Vec3;
    use crate::error::{Error, Result, Warning};
    use crate::import::{
        import_mesh, BoneInfluence, MeshSource, SkeletonIndex, SkinBinding, SourceMaterial,
        SourceVertex,
    };
    use crate::packet::{CollisionKind, CollisionMesh, MaterialFlags, Packet, RigidMesh, Skin};
    use crate::types::PacketType;

    fn corner(x: f32, influences: &[(&str, f32)]) -> SourceVertex {
        SourceVertex::builder()
            .position([x, 0.0, 0.0])
            .normal([0.0, 0.0, 1.0])
            .uv([x, 0.5])
            .influences(
                influences
                    .iter()
                    .map(|(bone, weight)| BoneInfluence::new(*bone, *weight))
                    .collect(),
            )
            .build()
    }

    fn triangle() -> Vec<SourceVertex> {
        vec![corner(0.0, &[]), corner(1.0, &[]), corner(2.0, &[])]
    }

    #[test]
    fn kind_follows_name_then_binding() {
        let source = |name: &str, skin: Option<SkinBinding>| {
            MeshSource::builder().name(name).maybe_skin(skin).build()
        };
        let binding = || Some(SkinBinding::new("P_HHM_skel", ["Spine"]));

        assert_eq!(source("Box_C2", None).kind(), PacketType::Col2);
        assert_eq!(source("Box_C3", binding()).kind(), PacketType::Col3);
        assert_eq!(source("Body", binding()).kind(), PacketType::Skin);
        assert_eq!(source("Torso", None).kind(), PacketType::Rigd);
        assert_eq!(source("Box_C2x", None).kind(), PacketType::Rigd);
    }

    #[test]
    fn uv_is_flipped() {
        let vertex = corner(0.25, &[]);
        assert_eq!(vertex.uvw(), Vec3::new(0.25, -0.5, 1.0));

        let bare = SourceVertex::builder()
            .position(Vec3::ZERO)
            .normal(Vec3::ZERO)
            .build();
        assert_eq!(bare.uvw(), Vec3::ZERO);
    }

    #[test]
    fn skeleton_index_skips_reserved_bones() {
        let skeleton = SkeletonIndex::new([
            "Root", "ap_hand_r", "Pelvis", "Ribcage", "Spine", "ap_head", "Neck",
        ]);

        assert_eq!(skeleton.len(), 4);
        assert_eq!(skeleton.resolve("Root"), 0);
        assert_eq!(skeleton.resolve("Pelvis"), 1);
        assert_eq!(skeleton.resolve("Spine"), 2);
        assert_eq!(skeleton.resolve("Neck"), 3);
        assert_eq!(skeleton.resolve("Ribcage"), 53);
        assert_eq!(skeleton.resolve("ap_hand_r"), 4);
        assert_eq!(skeleton.resolve("Tail"), 4);
        assert_eq!(
            skeleton.bones().collect::<Vec<_>>(),
            vec!["Root", "Pelvis", "Spine", "Neck"]
        );
    }

    #[test]
    fn skeleton_index_repeated_name_keeps_first() {
        let skeleton = SkeletonIndex::new(["A", "B", "A", "C"]);

        assert_eq!(skeleton.resolve("A"), 0);
        assert_eq!(skeleton.resolve("C"), 3);
        assert_eq!(skeleton.resolve("missing"), 4);
    }

    #[test]
    fn stored_index_wraps_past_a_byte() {
        let bones: Vec<String> = (0..300).map(|i| format!("Bone{i}")).collect();
        let skeleton = SkeletonIndex::new(&bones);

        assert_eq!(skeleton.resolve("Bone255"), 255);
        assert_eq!(skeleton.resolve_byte("Bone255"), 255);
        assert_eq!(skeleton.resolve_byte("Bone256"), 0);
        assert_eq!(skeleton.resolve_byte("Bone299"), 43);
        assert_eq!(skeleton.resolve_byte("Tail"), 44);
    }

    #[test]
    fn ribcage_resolves_without_skeleton() {
        assert_eq!(SkeletonIndex::default().resolve("Ribcage"), 53);
    }

    #[test]
    fn rigid_mesh_from_triangle() -> Result<()> {
        let source = MeshSource::builder()
            .name("Torso")
            .polygons(vec![triangle(), triangle()])
            .material(
                SourceMaterial::builder()
                    .diffuse_map("c_torso_d")
                    .flags(MaterialFlags::ALPHA_TEST)
                    .build(),
            )
            .build();

        let (mesh, warnings) = RigidMesh::from_source(&source)?;

        assert!(warnings.is_empty());
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.faces[1].vertex_indices, [0, 1, 2]);
        assert_eq!(mesh.material.diffuse_map, "c_torso_d");
        assert_eq!(mesh.material.specular_power, 1.0);
        assert_eq!(mesh.vertices[1].tangent, Vec3::ZERO);
        Ok(())
    }

    #[traced_test]
    #[test]
    fn quad_is_skipped() -> Result<()> {
        let mut quad = triangle();
        quad.push(corner(3.0, &[]));

        let source = MeshSource::builder()
            .name("Box_C2")
            .polygons(vec![quad, triangle()])
            .build();

        let (mesh, warnings) = CollisionMesh::from_source(&source)?;

        assert_eq!(mesh.kind, CollisionKind::Col2);
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(
            warnings,
            vec![Warning::NonTriangleFace {
                polygon: 0,
                corners: 4
            }]
        );
        assert!(logs_contain("polygon is not a triangle"));
        Ok(())
    }

    #[traced_test]
    #[test]
    fn fifth_bone_is_dropped() -> Result<()> {
        let bones = [("A", 0.4), ("B", 0.3), ("C", 0.2), ("D", 0.05), ("E", 0.05)];
        let source = MeshSource::builder()
            .name("Body")
            .polygons(vec![vec![corner(0.0, &bones), corner(1.0, &[]), corner(2.0, &[])]])
            .skin(SkinBinding::new("P_HHM_skel", ["A", "B", "C", "D", "E"]))
            .build();

        let (skin, warnings) = Skin::from_source(&source)?;

        let vertex = skin.vertices[0];
        assert_eq!(vertex.bone_indices, [0, 1, 2, 3]);
        assert_eq!(vertex.bone_weights, [0.4, 0.3, 0.2, 0.05]);
        assert_eq!(vertex.bone_count, 4.0);
        assert_eq!(skin.vertices[1].bone_indices, [0, 0, 0, 0]);
        assert_eq!(skin.vertices[1].bone_count, 4.0);
        assert_eq!(skin.skeleton_name, "P_HHM_skel");
        assert_eq!(
            warnings,
            vec![Warning::BoneOverflow {
                polygon: 0,
                corner: 0,
                bone: "E".into()
            }]
        );
        assert!(logs_contain("a vertex cannot have more than 4 bones"));
        Ok(())
    }

    #[test]
    fn skin_without_binding_fails() {
        let source = MeshSource::builder()
            .name("Body")
            .polygons(vec![triangle()])
            .build();

        let result = Skin::from_source(&source);
        assert!(matches!(result, Err(Error::MissingSkeleton(name)) if name == "Body"));
    }

    #[test]
    fn import_mesh_dispatches_on_kind() -> Result<()> {
        let source = MeshSource::builder()
            .name("Body")
            .polygons(vec![triangle()])
            .skin(SkinBinding::new("P_HHM_skel", ["Spine"]))
            .build();

        let (packet, _) = import_mesh(&source)?;
        assert!(matches!(packet, Packet::Skin(_)));
        assert_eq!(packet.tag(), PacketType::Skin.tag());
        Ok(())
    }
}
