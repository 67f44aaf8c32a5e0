/// Mock graphics device for unit tests (no GPU required)
///
/// Every mock object reports creation/destruction into a shared `MockStats`
/// event log. Buffers keep their bytes so uploads can be read back, and
/// command lists record their commands as strings.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::resource::TextureLoader;
use crate::graphics_device::{
    Buffer, BufferCopy, BufferDesc, BufferUsage, ClearValue, CommandList, CommandListInheritance,
    CommandListLevel, DescriptorSet, DescriptorSetLayout, DescriptorSetLayoutDesc, DescriptorWrite,
    Extent2D, Framebuffer, FramebufferDesc, GraphicsDevice, IndexType, MemoryProperties, Pipeline,
    PipelineDesc, PipelineStage, PresentMode, PresentationDevice, Rect2D, RenderPass,
    RenderPassDesc, RenderPassKind, RenderTarget, Semaphore, SubpassContents, SurfaceCapabilities,
    SurfaceTransform, SwapchainDesc, Texture, TextureDesc, TextureFormat, Viewport,
};

// ============================================================================
// Shared stats
// ============================================================================

/// Event log shared by all mock objects of one device
#[derive(Default)]
pub struct MockStats {
    next_id: AtomicU64,
    events: Mutex<Vec<String>>,
}

impl MockStats {
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Number of events starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| e.starts_with(prefix)).count()
    }

    /// Position of the first event starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e.starts_with(prefix))
    }

    /// Buffers created and not yet dropped
    pub fn live_buffers(&self) -> usize {
        self.count("create_buffer") - self.count("destroy_buffer")
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub id: u64,
    pub size: u64,
    pub usage: BufferUsage,
    pub memory: MemoryProperties,
    data: Mutex<Vec<u8>>,
    stats: Arc<MockStats>,
}

impl MockBuffer {
    /// Current contents
    pub fn read(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }

    fn store(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let end = offset + bytes.len() as u64;
        if end > self.size {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at {} exceeds buffer size {}",
                bytes.len(),
                offset,
                self.size
            )));
        }
        self.data.lock().unwrap()[offset as usize..end as usize].copy_from_slice(bytes);
        Ok(())
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn memory_properties(&self) -> MemoryProperties {
        self.memory
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.memory.contains(MemoryProperties::HOST_VISIBLE) {
            return Err(Error::InvalidResource("buffer is not host visible".to_string()));
        }
        self.store(offset, data)?;
        self.stats.push(format!("write_buffer:{}:{}", self.id, data.len()));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_buffer:{}", self.id));
    }
}

/// Downcast helper for tests
pub fn mock_buffer(buffer: &Arc<dyn Buffer>) -> &MockBuffer {
    buffer.as_any().downcast_ref::<MockBuffer>().unwrap()
}

// ============================================================================
// Mock Texture / RenderTarget
// ============================================================================

pub struct MockTexture {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    stats: Arc<MockStats>,
}

impl Texture for MockTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_texture:{}", self.id));
    }
}

pub struct MockRenderTarget {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    stats: Arc<MockStats>,
}

impl RenderTarget for MockRenderTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockRenderTarget {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_view:{}", self.id));
    }
}

// ============================================================================
// Mock RenderPass / Framebuffer
// ============================================================================

pub struct MockRenderPass {
    pub id: u64,
    pub desc: RenderPassDesc,
    stats: Arc<MockStats>,
}

impl RenderPass for MockRenderPass {
    fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockRenderPass {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_render_pass:{}", self.id));
    }
}

pub struct MockFramebuffer {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub attachment_ids: Vec<u64>,
    stats: Arc<MockStats>,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_framebuffer:{}", self.id));
    }
}

fn object_id(any: &dyn Any) -> u64 {
    if let Some(pass) = any.downcast_ref::<MockRenderPass>() {
        pass.id
    } else if let Some(fb) = any.downcast_ref::<MockFramebuffer>() {
        fb.id
    } else if let Some(target) = any.downcast_ref::<MockRenderTarget>() {
        target.id
    } else if let Some(buffer) = any.downcast_ref::<MockBuffer>() {
        buffer.id
    } else {
        u64::MAX
    }
}

/// Id of a mock framebuffer
pub fn framebuffer_id(framebuffer: &Arc<dyn Framebuffer>) -> u64 {
    object_id(framebuffer.as_any())
}

/// Id of a mock render pass
pub fn render_pass_id(render_pass: &Arc<dyn RenderPass>) -> u64 {
    object_id(render_pass.as_any())
}

// ============================================================================
// Mock Descriptor Set Layout / Set
// ============================================================================

pub struct MockDescriptorSetLayout {
    pub desc: DescriptorSetLayoutDesc,
}

impl DescriptorSetLayout for MockDescriptorSetLayout {
    fn desc(&self) -> &DescriptorSetLayoutDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockDescriptorSet {
    pub id: u64,
    pub layout: Arc<dyn DescriptorSetLayout>,
    pub last_writes: Vec<DescriptorWrite>,
    pub update_count: u32,
    stats: Arc<MockStats>,
}

impl DescriptorSet for MockDescriptorSet {
    fn layout(&self) -> &Arc<dyn DescriptorSetLayout> {
        &self.layout
    }

    fn update(&mut self, writes: &[DescriptorWrite]) -> Result<()> {
        self.last_writes = writes.to_vec();
        self.update_count += 1;
        let slots: Vec<String> = writes.iter().map(|w| w.binding.to_string()).collect();
        self.stats.push(format!("update_descriptor_set:{}:[{}]", self.id, slots.join(",")));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockDescriptorSet {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_descriptor_set:{}", self.id));
    }
}

// ============================================================================
// Mock Pipeline
// ============================================================================

pub struct MockPipeline {
    pub kind: RenderPassKind,
    pub layout: Arc<dyn DescriptorSetLayout>,
}

impl Pipeline for MockPipeline {
    fn kind(&self) -> RenderPassKind {
        self.kind
    }

    fn descriptor_set_layout(&self) -> &Arc<dyn DescriptorSetLayout> {
        &self.layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    pub id: u64,
    pub level: CommandListLevel,
    pub commands: Vec<String>,
    stats: Arc<MockStats>,
}

impl MockCommandList {
    /// Standalone list, not tied to a device
    pub fn new(level: CommandListLevel) -> Self {
        Self {
            id: 0,
            level,
            commands: Vec::new(),
            stats: Arc::new(MockStats::default()),
        }
    }
}

/// Downcast helper for tests
pub fn recorded(list: &dyn CommandList) -> Vec<String> {
    list.as_any().downcast_ref::<MockCommandList>().unwrap().commands.clone()
}

impl CommandList for MockCommandList {
    fn level(&self) -> CommandListLevel {
        self.level
    }

    fn begin(&mut self, inheritance: Option<&CommandListInheritance>) -> Result<()> {
        self.commands.clear();
        match inheritance {
            Some(inh) => self.commands.push(format!(
                "begin(inherit render_pass={} framebuffer={})",
                object_id(inh.render_pass.as_any()),
                object_id(inh.framebuffer.as_any())
            )),
            None => self.commands.push("begin".to_string()),
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.commands.push("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()> {
        self.commands.push(format!(
            "begin_render_pass(render_pass={}, framebuffer={}, area={}x{}, clear={:?}, contents={:?})",
            object_id(render_pass.as_any()),
            object_id(framebuffer.as_any()),
            render_area.width,
            render_area.height,
            clear_values,
            contents
        ));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.commands.push("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.commands.push(format!("set_viewport({}x{})", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.commands.push(format!("set_scissor({}x{})", scissor.width, scissor.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.commands.push(format!("bind_pipeline({})", pipeline.kind()));
        Ok(())
    }

    fn bind_descriptor_set(&mut self, pipeline: &Arc<dyn Pipeline>, set: &dyn DescriptorSet) -> Result<()> {
        let id = set.as_any().downcast_ref::<MockDescriptorSet>().map(|s| s.id).unwrap_or(u64::MAX);
        self.commands.push(format!("bind_descriptor_set({}, set={})", pipeline.kind(), id));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.commands.push(format!(
            "bind_vertex_buffer(buffer={}, offset={})",
            object_id(buffer.as_any()),
            offset
        ));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()> {
        self.commands.push(format!(
            "bind_index_buffer(buffer={}, offset={}, {:?})",
            object_id(buffer.as_any()),
            offset,
            index_type
        ));
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.commands.push(format!(
            "draw_indexed({}, {}, {}, {}, {})",
            index_count, instance_count, first_index, vertex_offset, first_instance
        ));
        Ok(())
    }

    fn copy_buffer(&mut self, src: &Arc<dyn Buffer>, dst: &Arc<dyn Buffer>, region: BufferCopy) -> Result<()> {
        let source = src.as_any().downcast_ref::<MockBuffer>();
        let target = dst.as_any().downcast_ref::<MockBuffer>();
        if let (Some(source), Some(target)) = (source, target) {
            let bytes = source.read();
            let start = region.src_offset as usize;
            let end = start + region.size as usize;
            target.store(region.dst_offset, &bytes[start..end])?;
        }
        self.commands.push(format!(
            "copy_buffer({} -> {}, {} bytes)",
            object_id(src.as_any()),
            object_id(dst.as_any()),
            region.size
        ));
        Ok(())
    }

    fn execute_commands(&mut self, secondaries: &[&dyn CommandList]) -> Result<()> {
        if self.level != CommandListLevel::Primary {
            return Err(Error::InvalidState("execute_commands on a secondary list".to_string()));
        }
        self.commands.push(format!("execute_commands({})", secondaries.len()));
        for secondary in secondaries {
            for command in recorded(*secondary) {
                self.commands.push(format!("> {}", command));
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockCommandList {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_command_list:{}", self.id));
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    pub stats: Arc<MockStats>,
    buffers_created: AtomicU32,
    /// Fail the n-th buffer creation (0-based)
    pub fail_buffer_at: Mutex<Option<u32>>,
    pub fail_submit: AtomicBool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(MockStats::default()),
            buffers_created: AtomicU32::new(0),
            fail_buffer_at: Mutex::new(None),
            fail_submit: AtomicBool::new(false),
        }
    }

    /// Presentation mock sharing this device's event log
    pub fn presentation(&self, capabilities: SurfaceCapabilities, modes: Vec<PresentMode>) -> MockPresentationDevice {
        MockPresentationDevice::new(self.stats.clone(), capabilities, modes)
    }

    pub fn mock_texture(&self, width: u32, height: u32) -> Arc<dyn Texture> {
        let id = self.stats.next_id();
        self.stats.push(format!("create_texture:{}", id));
        Arc::new(MockTexture {
            id,
            width,
            height,
            format: TextureFormat::R8G8B8A8_SRGB,
            stats: self.stats.clone(),
        })
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        let index = self.buffers_created.fetch_add(1, Ordering::SeqCst);
        if *self.fail_buffer_at.lock().unwrap() == Some(index) {
            return Err(Error::OutOfMemory);
        }
        let id = self.stats.next_id();
        self.stats.push(format!("create_buffer:{}:{:?}:{:?}:{}", id, desc.usage, desc.memory, desc.size));
        Ok(Arc::new(MockBuffer {
            id,
            size: desc.size,
            usage: desc.usage,
            memory: desc.memory,
            data: Mutex::new(vec![0u8; desc.size as usize]),
            stats: self.stats.clone(),
        }))
    }

    fn create_command_list(&self, level: CommandListLevel) -> Result<Box<dyn CommandList>> {
        let id = self.stats.next_id();
        self.stats.push(format!("create_command_list:{}:{:?}", id, level));
        Ok(Box::new(MockCommandList {
            id,
            level,
            commands: Vec::new(),
            stats: self.stats.clone(),
        }))
    }

    fn submit_one_shot(&self, record: &mut dyn FnMut(&mut dyn CommandList) -> Result<()>) -> Result<()> {
        let mut list = MockCommandList {
            id: self.stats.next_id(),
            level: CommandListLevel::Primary,
            commands: Vec::new(),
            stats: self.stats.clone(),
        };
        list.begin(None)?;
        record(&mut list)?;
        list.end()?;
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(Error::BackendError("one-shot submit failed".to_string()));
        }
        self.stats.push(format!("submit_one_shot:[{}]", list.commands.join("; ")));
        Ok(())
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<Arc<dyn DescriptorSetLayout>> {
        Ok(Arc::new(MockDescriptorSetLayout { desc: desc.clone() }))
    }

    fn create_descriptor_set(&self, layout: &Arc<dyn DescriptorSetLayout>) -> Result<Box<dyn DescriptorSet>> {
        let id = self.stats.next_id();
        self.stats.push(format!("create_descriptor_set:{}", id));
        Ok(Box::new(MockDescriptorSet {
            id,
            layout: layout.clone(),
            last_writes: Vec::new(),
            update_count: 0,
            stats: self.stats.clone(),
        }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        let id = self.stats.next_id();
        self.stats.push(format!("create_render_pass:{}", id));
        Ok(Arc::new(MockRenderPass {
            id,
            desc: desc.clone(),
            stats: self.stats.clone(),
        }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        let id = self.stats.next_id();
        let attachment_ids: Vec<u64> = desc.attachments.iter().map(|a| object_id(a.as_any())).collect();
        self.stats.push(format!("create_framebuffer:{}:{:?}", id, attachment_ids));
        Ok(Arc::new(MockFramebuffer {
            id,
            width: desc.width,
            height: desc.height,
            attachment_ids,
            stats: self.stats.clone(),
        }))
    }

    fn create_depth_target(&self, width: u32, height: u32, format: TextureFormat) -> Result<Arc<dyn RenderTarget>> {
        let id = self.stats.next_id();
        self.stats.push(format!("create_depth_target:{}", id));
        Ok(Arc::new(MockRenderTarget {
            id,
            width,
            height,
            format,
            stats: self.stats.clone(),
        }))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        let id = self.stats.next_id();
        self.stats.push(format!("create_texture:{}", id));
        Ok(Arc::new(MockTexture {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
            stats: self.stats.clone(),
        }))
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(MockPipeline {
            kind: desc.kind,
            layout: desc.descriptor_set_layout.clone(),
        }))
    }

    fn wait_idle(&self) -> Result<()> {
        self.stats.push("wait_idle");
        Ok(())
    }
}

/// Pipeline for `kind` with the standard per-pass layout
pub fn mock_pipeline(kind: RenderPassKind) -> Arc<dyn Pipeline> {
    Arc::new(MockPipeline {
        kind,
        layout: Arc::new(MockDescriptorSetLayout {
            desc: DescriptorSetLayoutDesc::for_pass(kind),
        }),
    })
}

// ============================================================================
// Mock Presentation
// ============================================================================

pub struct MockSemaphore {
    pub id: u64,
    stats: Arc<MockStats>,
}

impl Semaphore for MockSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockSemaphore {
    fn drop(&mut self) {
        self.stats.push(format!("destroy_semaphore:{}", self.id));
    }
}

fn semaphore_id(semaphore: &dyn Semaphore) -> u64 {
    semaphore.as_any().downcast_ref::<MockSemaphore>().map(|s| s.id).unwrap_or(u64::MAX)
}

pub struct MockPresentationDevice {
    pub stats: Arc<MockStats>,
    pub capabilities: Mutex<SurfaceCapabilities>,
    pub present_modes: Vec<PresentMode>,
    pub format: TextureFormat,
    image_count: u32,
    next_image: u32,
    pub last_desc: Arc<Mutex<Option<SwapchainDesc>>>,
    /// When set, `present` fails as an out-of-date swapchain would
    pub fail_present: Arc<AtomicBool>,
}

impl MockPresentationDevice {
    pub fn new(stats: Arc<MockStats>, capabilities: SurfaceCapabilities, present_modes: Vec<PresentMode>) -> Self {
        Self {
            stats,
            capabilities: Mutex::new(capabilities),
            present_modes,
            format: TextureFormat::B8G8R8A8_SRGB,
            image_count: 0,
            next_image: 0,
            last_desc: Arc::new(Mutex::new(None)),
            fail_present: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Typical desktop surface: fixed 800×600 extent, 2..8 images, identity
pub fn desktop_capabilities() -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: Extent2D::new(800, 600),
        min_image_extent: Extent2D::new(1, 1),
        max_image_extent: Extent2D::new(4096, 4096),
        supported_transforms: SurfaceTransform::IDENTITY | SurfaceTransform::ROTATE_90,
        current_transform: SurfaceTransform::IDENTITY,
    }
}

impl PresentationDevice for MockPresentationDevice {
    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(*self.capabilities.lock().unwrap())
    }

    fn surface_present_modes(&self) -> Result<Vec<PresentMode>> {
        Ok(self.present_modes.clone())
    }

    fn surface_format(&self) -> TextureFormat {
        self.format
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<Vec<Arc<dyn RenderTarget>>> {
        self.stats.push(format!("create_swapchain:{}", desc.image_count));
        *self.last_desc.lock().unwrap() = Some(*desc);
        self.image_count = desc.image_count;
        self.next_image = 0;
        let views = (0..desc.image_count)
            .map(|_| {
                let id = self.stats.next_id();
                self.stats.push(format!("create_view:{}", id));
                Arc::new(MockRenderTarget {
                    id,
                    width: desc.extent.width,
                    height: desc.extent.height,
                    format: desc.format,
                    stats: self.stats.clone(),
                }) as Arc<dyn RenderTarget>
            })
            .collect();
        Ok(views)
    }

    fn destroy_swapchain(&mut self) {
        self.stats.push("destroy_swapchain");
        self.image_count = 0;
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        let id = self.stats.next_id();
        self.stats.push(format!("create_semaphore:{}", id));
        Ok(Box::new(MockSemaphore { id, stats: self.stats.clone() }))
    }

    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<u32> {
        if self.image_count == 0 {
            return Err(Error::BackendError("no swapchain".to_string()));
        }
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        self.stats.push(format!("acquire:{}:signal={}", index, semaphore_id(signal)));
        Ok(index)
    }

    fn submit(
        &self,
        primary: &dyn CommandList,
        wait: &dyn Semaphore,
        wait_stage: PipelineStage,
        signal: &dyn Semaphore,
    ) -> Result<()> {
        self.stats.push(format!(
            "submit:{}:wait={}:{:?}:signal={}",
            recorded(primary).len(),
            semaphore_id(wait),
            wait_stage,
            semaphore_id(signal)
        ));
        Ok(())
    }

    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<()> {
        if self.fail_present.load(Ordering::SeqCst) {
            self.stats.push("present_failed");
            return Err(Error::BackendError("swapchain out of date".to_string()));
        }
        self.stats.push(format!("present:{}:wait={}", image_index, semaphore_id(wait)));
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.stats.push("queue_wait_idle");
        Ok(())
    }
}

// ============================================================================
// Mock texture loader
// ============================================================================

/// 2×2 white texture for every path, remembering what was asked
///
/// Paths containing "missing" fail with `AssetNotFound`.
#[derive(Default)]
pub struct SolidColorLoader {
    pub requests: Mutex<Vec<PathBuf>>,
}

impl TextureLoader for SolidColorLoader {
    fn load(&self, path: &Path) -> Result<TextureDesc> {
        self.requests.lock().unwrap().push(path.to_path_buf());
        if path.to_string_lossy().contains("missing") {
            return Err(Error::AssetNotFound(path.display().to_string()));
        }
        Ok(TextureDesc {
            width: 2,
            height: 2,
            format: TextureFormat::R8G8B8A8_SRGB,
            data: vec![255; 16],
        })
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
