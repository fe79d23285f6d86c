//! JSON topology description for the demo firmware binary: a host-side
//! config file that expands into the same [`TopologyCommand`] sequence a
//! real host would send over IPC, so `bbx_fw_demo` can stand a pipeline up
//! without a host driver attached.
//!
//! Mirrors `bbx_dsp::config::GraphConfig`'s shape (blocks/connections
//! parsed from JSON, then turned into graph operations) rather than
//! inventing a new config idiom.

use bbx_core::{AudioFormat, FrameFormat};
use bbx_engine::{BufferId, ComponentId, PipelineId};
use bbx_ipc::{ComponentTypeTag, Direction, TopologyCommand};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyFileError {
    #[error("failed to parse topology file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown component kind: {0}")]
    UnknownKind(String),
    #[error("unknown direction: {0}")]
    UnknownDirection(String),
    #[error("unknown frame format: {0}")]
    UnknownFrameFormat(String),
}

type Result<T> = std::result::Result<T, TopologyFileError>;

#[derive(Debug, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub buffers: Vec<BufferSpec>,
    #[serde(default)]
    pub pipelines: Vec<PipelineSpec>,
}

#[derive(Debug, Deserialize)]
pub struct FormatSpec {
    pub frame_format: String,
    pub rate: u32,
    pub channels: u16,
    #[serde(default = "default_interleaved")]
    pub interleaved: bool,
}

fn default_interleaved() -> bool {
    true
}

impl FormatSpec {
    fn resolve(&self) -> Result<AudioFormat> {
        let frame_format = match self.frame_format.as_str() {
            "s16le" => FrameFormat::S16Le,
            "s24in32le" => FrameFormat::S24In32Le,
            "s32le" => FrameFormat::S32Le,
            other => return Err(TopologyFileError::UnknownFrameFormat(other.to_string())),
        };
        Ok(AudioFormat::new(frame_format, self.rate, self.channels, self.interleaved))
    }
}

#[derive(Debug, Deserialize)]
pub struct ComponentSpec {
    pub id: u32,
    #[serde(default)]
    pub core: u32,
    pub kind: String,
    pub direction: String,
    pub format: FormatSpec,
    pub period_frames: u32,
    /// Pipeline this component is bound to, by id.
    pub pipeline: u32,
}

#[derive(Debug, Deserialize)]
pub struct BufferSpec {
    pub id: u32,
    pub producer: u32,
    pub consumer: u32,
    pub format: FormatSpec,
    pub size_bytes: u32,
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Deserialize)]
pub struct PipelineSpec {
    pub id: u32,
    #[serde(default)]
    pub core: u32,
    pub period_us: u32,
    #[serde(default)]
    pub priority: u8,
    pub frames_per_period: u32,
    pub source: u32,
    pub sink: u32,
}

fn resolve_kind(kind: &str) -> Result<ComponentTypeTag> {
    Ok(match kind {
        "host" => ComponentTypeTag::Host,
        "dai" => ComponentTypeTag::Dai,
        "mixer" => ComponentTypeTag::Mixer,
        "mux" => ComponentTypeTag::Mux,
        "volume" => ComponentTypeTag::Volume,
        "src" => ComponentTypeTag::Src,
        "dcblock" | "dc_block" => ComponentTypeTag::DcBlock,
        other => return Err(TopologyFileError::UnknownKind(other.to_string())),
    })
}

fn resolve_direction(direction: &str) -> Result<Direction> {
    Ok(match direction {
        "playback" => Direction::Playback,
        "capture" => Direction::Capture,
        other => return Err(TopologyFileError::UnknownDirection(other.to_string())),
    })
}

impl TopologyFile {
    /// Parse a topology description from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Negotiated format to drive `pipeline_params` with: the format of
    /// any one component bound to `pipeline` (the topology file format is
    /// already per-pin agreed, see spec §3 "Two connected pins must
    /// agree").
    pub fn format_for_pipeline(&self, pipeline: u32) -> Result<AudioFormat> {
        self.components
            .iter()
            .find(|c| c.pipeline == pipeline)
            .ok_or_else(|| TopologyFileError::UnknownKind(format!("no component bound to pipeline {pipeline}")))?
            .format
            .resolve()
    }

    /// Expand this description into the ordered command sequence
    /// `bbx_ipc::topology::apply` expects: pipelines and components before
    /// buffers are connected, bindings before `pipeline_complete`.
    pub fn into_commands(self) -> Result<Vec<TopologyCommand>> {
        let mut commands = Vec::new();

        for pipeline in &self.pipelines {
            commands.push(TopologyCommand::NewPipeline {
                id: PipelineId(pipeline.id),
                core: pipeline.core,
                period_us: pipeline.period_us,
                priority: pipeline.priority,
                frames_per_period: pipeline.frames_per_period,
            });
        }

        for component in &self.components {
            commands.push(TopologyCommand::NewComponent {
                id: ComponentId(component.id),
                core: component.core,
                kind: resolve_kind(&component.kind)?,
                direction: resolve_direction(&component.direction)?,
                format: component.format.resolve()?,
                period_frames: component.period_frames,
            });
        }

        for buffer in &self.buffers {
            commands.push(TopologyCommand::NewBuffer {
                id: BufferId(buffer.id),
                producer: ComponentId(buffer.producer),
                consumer: ComponentId(buffer.consumer),
                format: buffer.format.resolve()?,
                size_bytes: buffer.size_bytes,
                shared: buffer.shared,
            });
            commands.push(TopologyCommand::Connect { buffer: BufferId(buffer.id) });
        }

        for component in &self.components {
            commands.push(TopologyCommand::BindComponentToPipeline {
                component: ComponentId(component.id),
                pipeline: PipelineId(component.pipeline),
            });
        }

        for pipeline in &self.pipelines {
            commands.push(TopologyCommand::PipelineComplete {
                id: PipelineId(pipeline.id),
                source: ComponentId(pipeline.source),
                sink: ComponentId(pipeline.sink),
            });
        }

        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_COMPONENT: &str = r#"{
        "pipelines": [
            { "id": 1, "core": 0, "period_us": 1000, "priority": 0, "frames_per_period": 48, "source": 10, "sink": 10 }
        ],
        "components": [
            { "id": 10, "core": 0, "kind": "host", "direction": "playback",
              "format": { "frame_format": "s16le", "rate": 48000, "channels": 2 },
              "period_frames": 48, "pipeline": 1 }
        ],
        "buffers": []
    }"#;

    #[test]
    fn parses_a_single_component_pipeline() {
        let file = TopologyFile::from_json(SINGLE_COMPONENT).unwrap();
        assert_eq!(file.pipelines.len(), 1);
        assert_eq!(file.components.len(), 1);
    }

    #[test]
    fn expands_in_dependency_order() {
        let file = TopologyFile::from_json(SINGLE_COMPONENT).unwrap();
        let commands = file.into_commands().unwrap();
        assert!(matches!(commands[0], TopologyCommand::NewPipeline { .. }));
        assert!(matches!(commands[1], TopologyCommand::NewComponent { .. }));
        assert!(matches!(commands.last().unwrap(), TopologyCommand::PipelineComplete { .. }));
    }

    #[test]
    fn rejects_unknown_component_kind() {
        let json = SINGLE_COMPONENT.replace("\"host\"", "\"nonexistent\"");
        let file = TopologyFile::from_json(&json).unwrap();
        assert!(matches!(file.into_commands(), Err(TopologyFileError::UnknownKind(_))));
    }

    #[test]
    fn rejects_unknown_frame_format() {
        let json = SINGLE_COMPONENT.replace("\"s16le\"", "\"f64le\"");
        let file = TopologyFile::from_json(&json).unwrap();
        assert!(matches!(file.into_commands(), Err(TopologyFileError::UnknownFrameFormat(_))));
    }
}
