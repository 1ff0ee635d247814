use ash::vk;
use itertools::Itertools;

use crate::commands::command_buffer::GfxCommandBuffer;

/// Gfx 关于 submitInfo 的封装，更易用
///
/// binary semaphore 的 value 传 None，timeline semaphore 传 Some(value)
#[derive(Default)]
pub struct GfxSubmitInfo {
    command_buffers: Vec<vk::CommandBufferSubmitInfo<'static>>,
    wait_infos: Vec<vk::SemaphoreSubmitInfo<'static>>,
    signal_infos: Vec<vk::SemaphoreSubmitInfo<'static>>,
}

impl GfxSubmitInfo {
    pub fn new(commands: &[GfxCommandBuffer]) -> Self {
        let command_buffers = commands
            .iter()
            .map(|cmd| vk::CommandBufferSubmitInfo::default().command_buffer(cmd.handle()))
            .collect_vec();

        Self {
            command_buffers,
            wait_infos: vec![],
            signal_infos: vec![],
        }
    }

    #[inline]
    pub fn submit_info(&self) -> vk::SubmitInfo2<'_> {
        vk::SubmitInfo2::default()
            .command_buffer_infos(&self.command_buffers)
            .wait_semaphore_infos(&self.wait_infos)
            .signal_semaphore_infos(&self.signal_infos)
    }

    #[inline]
    pub fn wait(mut self, semaphore: vk::Semaphore, stage: vk::PipelineStageFlags2, value: Option<u64>) -> Self {
        self.wait_infos.push(
            vk::SemaphoreSubmitInfo::default()
                .semaphore(semaphore)
                .stage_mask(stage)
                .value(value.unwrap_or_default()),
        );
        self
    }

    #[inline]
    pub fn signal(mut self, semaphore: vk::Semaphore, stage: vk::PipelineStageFlags2, value: Option<u64>) -> Self {
        self.signal_infos.push(
            vk::SemaphoreSubmitInfo::default()
                .semaphore(semaphore)
                .stage_mask(stage)
                .value(value.unwrap_or_default()),
        );
        self
    }
}
