use glam::{Mat4, Vec3};
use crate::graphics_device::mock_graphics_device::{mock_buffer, MockGraphicsDevice};
use crate::graphics_device::{Buffer, BufferUsage, MemoryProperties};
use crate::resource::uniform::{MaterialUniform, TransformUniform, UniformBlock};

#[test]
fn test_uniform_sizes_match_shader_blocks() {
    assert_eq!(std::mem::size_of::<TransformUniform>(), 128);
    assert_eq!(std::mem::size_of::<MaterialUniform>(), 16);
}

#[test]
fn test_uniform_block_is_host_visible_without_staging() {
    let device = MockGraphicsDevice::new();
    let block = UniformBlock::new(&device, &MaterialUniform::default()).unwrap();

    assert_eq!(block.size(), 16);
    assert_eq!(block.buffer().usage(), BufferUsage::UNIFORM);
    assert_eq!(
        block.buffer().memory_properties(),
        MemoryProperties::HOST_VISIBLE | MemoryProperties::HOST_COHERENT
    );
    assert_eq!(device.stats.count("create_buffer"), 1);
    assert_eq!(device.stats.count("submit_one_shot"), 0);
}

#[test]
fn test_material_round_trip_includes_padding() {
    let device = MockGraphicsDevice::new();
    let block = UniformBlock::new(&device, &MaterialUniform::default()).unwrap();
    let value = MaterialUniform {
        specular_strength: 0.5,
        shininess: 32.0,
        padding: [1.5, -2.0],
    };
    block.update(&value).unwrap();

    let bytes = mock_buffer(block.buffer()).read();
    assert_eq!(bytes, bytemuck::bytes_of(&value).to_vec());
    assert_eq!(bytemuck::pod_read_unaligned::<MaterialUniform>(&bytes), value);
}

#[test]
fn test_transform_round_trip() {
    let device = MockGraphicsDevice::new();
    let block = UniformBlock::new(&device, &TransformUniform::default()).unwrap();
    let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let value = TransformUniform::new(world, Mat4::IDENTITY, Mat4::from_scale(Vec3::splat(2.0)));
    block.update(&value).unwrap();

    let stored = bytemuck::pod_read_unaligned::<TransformUniform>(&mock_buffer(block.buffer()).read());
    assert_eq!(stored, value);
    assert_eq!(stored.mvp, Mat4::from_scale(Vec3::splat(2.0)) * world);
}

#[test]
fn test_descriptor_info_covers_whole_block() {
    let device = MockGraphicsDevice::new();
    let block = UniformBlock::new(&device, &TransformUniform::default()).unwrap();
    let info = block.descriptor_info();
    assert_eq!(info.offset, 0);
    assert_eq!(info.range, 128);
}
