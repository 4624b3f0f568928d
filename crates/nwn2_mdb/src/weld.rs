//! Vertex welding for meshes built from polygon soup.
//!
//! Vertices are compared bit for bit with [`BitEq`], so two corners only
//! share an index when every attribute is stored identically. The first vertex
//! seen is the one that is kept.

use tracing::trace;

use crate::error::{Error, Result};

/// Equality over the stored bits
///
/// A NaN matches the same NaN and `-0.0` does not match `0.0`.
pub trait BitEq {
    fn bit_eq(&self, other: &Self) -> bool;
}

impl BitEq for f32 {
    fn bit_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl BitEq for u8 {
    fn bit_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl BitEq for u32 {
    fn bit_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: BitEq, const N: usize> BitEq for [T; N] {
    fn bit_eq(&self, other: &Self) -> bool {
        self.iter().zip(other).all(|(a, b)| a.bit_eq(b))
    }
}

/// Implement [`BitEq`] for a struct by comparing the listed fields
macro_rules! bit_eq_fields {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::weld::BitEq for $ty {
            fn bit_eq(&self, other: &Self) -> bool {
                $($crate::weld::BitEq::bit_eq(&self.$field, &other.$field))&&+
            }
        }
    };
}
pub(crate) use bit_eq_fields;

/// A mesh whose vertex list is deduplicated as it grows
pub trait WeldedMesh {
    type Vertex: BitEq;

    fn vertices(&self) -> &[Self::Vertex];

    fn vertices_mut(&mut self) -> &mut Vec<Self::Vertex>;

    /// Index of `vertex` in this mesh, appending it when no equal vertex exists
    fn push_vertex(&mut self, vertex: Self::Vertex) -> Result<u16> {
        weld(self.vertices_mut(), vertex)
    }

    /// Weld the three corners of a triangle
    ///
    /// On error the vertex list is left as it was before the call.
    fn weld_triangle(&mut self, corners: [Self::Vertex; 3]) -> Result<[u16; 3]> {
        let len = self.vertices().len();
        let mut indices = [0; 3];

        for (index, corner) in indices.iter_mut().zip(corners) {
            match self.push_vertex(corner) {
                Ok(i) => *index = i,
                Err(e) => {
                    self.vertices_mut().truncate(len);
                    return Err(e);
                }
            }
        }

        Ok(indices)
    }
}

/// Linear scan for a bit-identical vertex, appending on a miss.
///
/// Faces address vertices with `u16`, so the list can never grow past 65536 entries.
pub fn weld<V: BitEq>(vertices: &mut Vec<V>, vertex: V) -> Result<u16> {
    if let Some(index) = vertices.iter().position(|v| v.bit_eq(&vertex)) {
        return u16::try_from(index).map_err(|_| Error::VertexLimit(index));
    }

    let index = u16::try_from(vertices.len()).map_err(|_| Error::VertexLimit(vertices.len()))?;
    vertices.push(vertex);
    trace!(index, "welded new vertex");

    Ok(index)
}
