use crate::prelude::*;
use bevy::{
    pbr::{MaterialPipeline, MaterialPipelineKey},
    prelude::*,
    reflect::TypePath,
    render::{
        mesh::{Indices, MeshVertexBufferLayoutRef, PrimitiveTopology},
        render_asset::RenderAssetUsages,
        render_resource::{
            AsBindGroup, BlendComponent, BlendFactor, BlendOperation, BlendState,
            RenderPipelineDescriptor, ShaderRef, ShaderType, SpecializedMeshPipelineError,
        },
    },
};
use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

const SHADER_ASSET_PATH: &str = "shaders/galaxy_points.wgsl";

/// Points narrower than this many pixels are widened to it
const MIN_PIXEL_SIZE: f32 = 1.0;

/// Billboard corners, expanded around the particle center in the vertex shader
const QUAD_CORNERS: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

const ADDITIVE_BLENDING: BlendState = BlendState {
    color: BlendComponent {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::One,
        operation: BlendOperation::Add,
    },
    alpha: BlendComponent {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::One,
        operation: BlendOperation::Add,
    },
};

pub struct PointsMaterialPlugin;

impl Plugin for PointsMaterialPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<GalaxyPointsMaterial>::default());
    }
}

/// Builds one camera-facing quad per particle.
///
/// Every vertex of a quad carries the particle center, its corner offset
/// (in `UV_0`) and the particle color.
pub fn point_mesh(geometry: &GalaxyGeometry) -> Mesh {
    let count = geometry.len();

    let mut positions = vec![[0.0f32; 3]; count * 4];
    positions
        .par_chunks_exact_mut(4)
        .zip(geometry.positions.par_iter())
        .for_each(|(quad, center)| quad.fill(*center));

    let mut colors = vec![[0.0f32; 4]; count * 4];
    colors
        .par_chunks_exact_mut(4)
        .zip(geometry.colors.par_iter())
        .for_each(|(quad, &[r, g, b])| quad.fill([r, g, b, 1.0]));

    let corners: Vec<[f32; 2]> = QUAD_CORNERS.iter().copied().cycle().take(count * 4).collect();

    let indices: Vec<u32> = (0..count as u32)
        .flat_map(|particle| QUAD_INDICES.map(|corner| particle * 4 + corner))
        .collect();

    // The main world never reads the expanded quads back, so only the GPU copy
    // is kept once the mesh is extracted
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, corners)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
        .with_inserted_indices(Indices::U32(indices))
}

// Mirrored by `PointsParams` in galaxy_points.wgsl
#[derive(ShaderType, Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct PointsParams {
    pub size: f32,
    pub min_pixel_size: f32,
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct GalaxyPointsMaterial {
    #[uniform(0)]
    pub params: PointsParams,
    pub alpha_mode: AlphaMode,
}

impl GalaxyPointsMaterial {
    pub fn new(params: &GalaxyParameters) -> Self {
        Self {
            params: PointsParams {
                size: params.size,
                min_pixel_size: MIN_PIXEL_SIZE,
            },
            alpha_mode: AlphaMode::Add,
        }
    }
}

impl Material for GalaxyPointsMaterial {
    fn vertex_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            Mesh::ATTRIBUTE_UV_0.at_shader_location(1),
            Mesh::ATTRIBUTE_COLOR.at_shader_location(2),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];

        // quads always face the camera
        descriptor.primitive.cull_mode = None;

        if let Some(depth_stencil) = descriptor.depth_stencil.as_mut() {
            depth_stencil.depth_write_enabled = false;
        }
        if let Some(fragment) = descriptor.fragment.as_mut() {
            for target in fragment.targets.iter_mut().flatten() {
                target.blend = Some(ADDITIVE_BLENDING);
            }
        }
        Ok(())
    }
}
