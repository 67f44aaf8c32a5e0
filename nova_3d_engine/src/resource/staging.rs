//! Staged upload of CPU bytes into device-local buffers
//!
//! Each transfer creates a host-visible staging buffer, writes the payload,
//! creates the device-local destination, and copies between them in a
//! one-shot command list. Staging buffers live only until the submission has
//! completed (or failed).

use std::sync::Arc;
use crate::engine_debug;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferCopy, BufferDesc, BufferUsage, GraphicsDevice, MemoryProperties,
};
use crate::log::LogSink;

const SOURCE: &str = "nova3d::StagedUpload";

/// Staging/destination pair of one transfer
struct StagingTransfer {
    staging: Arc<dyn Buffer>,
    destination: Arc<dyn Buffer>,
}

/// One or more uploads submitted together
pub struct StagedUpload<'a> {
    device: &'a dyn GraphicsDevice,
    logger: &'a LogSink,
    transfers: Vec<StagingTransfer>,
}

impl<'a> StagedUpload<'a> {
    /// Start an empty batch
    pub fn batch(device: &'a dyn GraphicsDevice, logger: &'a LogSink) -> Self {
        Self {
            device,
            logger,
            transfers: Vec::new(),
        }
    }

    /// Queue `bytes` for upload into a new device-local buffer
    ///
    /// Returns the destination; its content is valid once `submit` succeeds.
    pub fn stage(&mut self, bytes: &[u8], usage: BufferUsage) -> Result<Arc<dyn Buffer>> {
        if bytes.is_empty() {
            return Err(Error::InvalidResource(format!(
                "cannot upload an empty payload ({:?})",
                usage
            )));
        }
        let size = bytes.len() as u64;

        let staging = self.device.create_buffer(&BufferDesc {
            size,
            usage: BufferUsage::TRANSFER_SRC,
            memory: MemoryProperties::HOST_VISIBLE | MemoryProperties::HOST_COHERENT,
        })?;
        staging.write(0, bytes)?;

        let destination = self.device.create_buffer(&BufferDesc {
            size,
            usage: usage | BufferUsage::TRANSFER_DST,
            memory: MemoryProperties::DEVICE_LOCAL,
        })?;

        self.transfers.push(StagingTransfer {
            staging,
            destination: destination.clone(),
        });
        Ok(destination)
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Copy every staged payload in one submission and wait for completion
    ///
    /// Staging buffers are released when this returns, on success and failure.
    pub fn submit(self) -> Result<()> {
        if self.transfers.is_empty() {
            return Ok(());
        }
        let total: u64 = self.transfers.iter().map(|t| t.staging.size()).sum();
        let transfers = &self.transfers;
        self.device.submit_one_shot(&mut |cmd| {
            for transfer in transfers {
                cmd.copy_buffer(
                    &transfer.staging,
                    &transfer.destination,
                    BufferCopy {
                        src_offset: 0,
                        dst_offset: 0,
                        size: transfer.staging.size(),
                    },
                )?;
            }
            Ok(())
        })?;
        engine_debug!(self.logger, SOURCE, "Uploaded {} buffer(s), {} bytes", transfers.len(), total);
        Ok(())
    }
}

/// Upload a single payload into a new device-local buffer
pub fn upload(
    device: &dyn GraphicsDevice,
    logger: &LogSink,
    bytes: &[u8],
    usage: BufferUsage,
) -> Result<Arc<dyn Buffer>> {
    let mut batch = StagedUpload::batch(device, logger);
    let destination = batch.stage(bytes, usage)?;
    batch.submit()?;
    Ok(destination)
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
