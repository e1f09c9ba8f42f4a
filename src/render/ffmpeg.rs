// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
//! Renders graphs with an ffmpeg subprocess.
//!
//! Every node becomes one filter of a `-filter_complex` description, in the form
//! `[in..]filter[out..]`, joined with `;`. Asset `n` is read from input `[n:a]`.

use std::{
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use tokio::{fs, process::Command};
use tracing::{debug, info, span, warn, Instrument, Level};

use super::{backend::RenderJob, error::RenderError};
use crate::graph::{db_to_linear, Graph, Node, NodeKind, Port, OUTPUT_LABEL};

/// acompressor's supported makeup range, as a linear factor.
const MAKEUP_LINEAR_RANGE: (f64, f64) = (1.0, 64.0);
/// aecho's supported decay range.
const ECHO_DECAY_RANGE: (f64, f64) = (0.001, 1.0);

/// An ffmpeg binary.
pub struct Backend {
    binary: PathBuf,
}

impl Backend {
    pub fn new(binary: impl Into<PathBuf>) -> Backend {
        Backend {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ffmpeg)", self.binary.display())
    }
}

#[async_trait]
impl super::Backend for Backend {
    async fn check(&self) -> Result<(), RenderError> {
        let output = self
            .command()
            .args(["-hide_banner", "-version"])
            .output()
            .await
            .map_err(|e| {
                RenderError::BackendUnavailable(format!("{}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            return Err(RenderError::BackendUnavailable(format!(
                "{} exited with {}",
                self.binary.display(),
                output.status
            )));
        }
        Ok(())
    }

    async fn execute(&self, job: &RenderJob) -> Result<(), RenderError> {
        self.run(job)
            .instrument(span!(Level::INFO, "render (ffmpeg)"))
            .await
    }
}

impl Backend {
    async fn run(&self, job: &RenderJob) -> Result<(), RenderError> {
        job.graph.check().map_err(RenderError::InvalidGraph)?;
        if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| RenderError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let filter = filter_complex(&job.graph);
        debug!(filter, "Serialized filter graph");
        info!(
            binary = ?self.binary,
            output = ?job.output,
            assets = job.graph.assets().len(),
            duration = job.duration,
            "Running ffmpeg"
        );

        let mut command = self.command();
        command.args(["-y", "-hide_banner", "-loglevel", "error"]);
        for asset in job.graph.assets() {
            command.arg("-i").arg(asset);
        }
        command
            .arg("-filter_complex")
            .arg(&filter)
            .arg("-map")
            .arg(format!("[{}]", OUTPUT_LABEL))
            .arg("-t")
            .arg(number(job.duration))
            .arg("-ar")
            .arg(job.format.sample_rate.to_string())
            .arg("-c:a")
            .arg(job.format.bit_depth.pcm_codec())
            .arg(&job.output);

        let output = command.output().await.map_err(|e| RenderError::Backend {
            path: job.output.clone(),
            diagnostic: format!("unable to run {}: {}", self.binary.display(), e),
        })?;

        if !output.status.success() {
            remove_partial_output(&job.output).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostic = match stderr.trim() {
                "" => format!("ffmpeg exited with {}", output.status),
                stderr => stderr.to_string(),
            };
            return Err(RenderError::Backend {
                path: job.output.clone(),
                diagnostic,
            });
        }

        Ok(())
    }
}

async fn remove_partial_output(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = ?path, "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = ?path, err = %e, "Unable to remove partial output"),
    }
}

/// Serializes the graph into an ffmpeg filter_complex description.
pub fn filter_complex(graph: &Graph) -> String {
    graph
        .nodes()
        .iter()
        .map(|node| {
            let inputs: String = node.inputs.iter().map(port).collect();
            let outputs: String = node.outputs.iter().map(|o| format!("[{}]", o)).collect();
            format!("{}{}{}", inputs, filter(node), outputs)
        })
        .collect::<Vec<String>>()
        .join(";")
}

fn port(port: &Port) -> String {
    match port {
        Port::Asset(index) => format!("[{}:a]", index),
        Port::Label(label) => format!("[{}]", label),
    }
}

/// Converts makeup gain to the linear range acompressor accepts.
fn makeup(db: f64) -> f64 {
    let (min, max) = MAKEUP_LINEAR_RANGE;
    let linear = db_to_linear(db);
    let clamped = linear.clamp(min, max);
    if clamped != linear {
        warn!(
            makeup_db = db,
            applied_db = 20.0 * clamped.log10(),
            "Compressor makeup outside the supported range, clamping"
        );
    }
    clamped
}

fn filter(node: &Node) -> String {
    match &node.kind {
        NodeKind::Delay { ms } => format!("adelay=delays={}:all=1", ms),
        NodeKind::Pad { duration } => format!("apad=whole_dur={}", number(*duration)),
        NodeKind::Gain { db } => format!("volume={}dB", number(*db)),
        NodeKind::Highpass { hz } => format!("highpass=f={}", number(*hz)),
        NodeKind::Lowpass { hz } => format!("lowpass=f={}", number(*hz)),
        NodeKind::Compressor(c) => format!(
            "acompressor=threshold={}:ratio={}:attack={}:release={}:makeup={}",
            number(db_to_linear(c.threshold_db)),
            number(c.ratio),
            number(c.attack_ms),
            number(c.release_ms),
            number(makeup(c.makeup_db)),
        ),
        NodeKind::SidechainCompressor(c) => format!(
            "sidechaincompress=threshold={}:ratio={}:attack={}:release={}",
            number(db_to_linear(c.threshold_db)),
            number(c.ratio),
            number(c.attack_ms),
            number(c.release_ms),
        ),
        NodeKind::Mix => format!(
            "amix=inputs={}:duration=longest:normalize=0",
            node.inputs.len()
        ),
        NodeKind::Split => format!("asplit={}", node.outputs.len()),
        NodeKind::Copy => "anull".to_string(),
        NodeKind::Echo {
            in_gain,
            out_gain,
            delays_ms,
            decays,
        } => {
            let (min, max) = ECHO_DECAY_RANGE;
            format!(
                "aecho={}:{}:{}:{}",
                number(*in_gain),
                number(*out_gain),
                join(delays_ms.iter().copied()),
                join(decays.iter().map(|d| d.clamp(min, max))),
            )
        }
        NodeKind::RateShift {
            factor,
            sample_rate,
        } => format!(
            "asetrate={},aresample={}",
            (*sample_rate as f64 * factor).round() as u64,
            sample_rate
        ),
        NodeKind::Fit { duration } => {
            let duration = number(*duration);
            format!("apad=whole_dur={},atrim=end={}", duration, duration)
        }
    }
}

fn join(values: impl Iterator<Item = f64>) -> String {
    values.map(number).collect::<Vec<String>>().join("|")
}

/// Formats a number with at most six decimals.
fn number(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::mix::{CompressorConfig, MixConfig, SendConfig};
    use crate::graph::compile;
    use crate::render::{format::OutputFormat, Backend as _};
    use crate::timeline::PlaybackEvent;

    fn node(kind: NodeKind, inputs: usize, outputs: usize) -> Node {
        Node {
            kind,
            inputs: (0..inputs).map(|i| Port::label(format!("i{}", i))).collect(),
            outputs: (0..outputs).map(|o| format!("o{}", o)).collect(),
        }
    }

    #[test]
    fn test_number() {
        assert_eq!(number(0.0), "0");
        assert_eq!(number(-0.0000001), "0");
        assert_eq!(number(2.0), "2");
        assert_eq!(number(-6.020599913), "-6.0206");
        assert_eq!(number(0.001), "0.001");
    }

    #[test]
    fn test_filters() {
        assert_eq!(
            filter(&node(NodeKind::Delay { ms: 469 }, 1, 1)),
            "adelay=delays=469:all=1"
        );
        assert_eq!(
            filter(&node(NodeKind::Pad { duration: 7.5 }, 1, 1)),
            "apad=whole_dur=7.5"
        );
        assert_eq!(
            filter(&node(NodeKind::Gain { db: -60.0 }, 1, 1)),
            "volume=-60dB"
        );
        assert_eq!(
            filter(&node(NodeKind::Highpass { hz: 30.0 }, 1, 1)),
            "highpass=f=30"
        );
        assert_eq!(filter(&node(NodeKind::Mix, 3, 1)), "amix=inputs=3:duration=longest:normalize=0");
        assert_eq!(filter(&node(NodeKind::Split, 1, 4)), "asplit=4");
        assert_eq!(filter(&node(NodeKind::Copy, 1, 1)), "anull");
        assert_eq!(
            filter(&node(
                NodeKind::RateShift {
                    factor: 2f64.powf(7.0 / 12.0),
                    sample_rate: 44100
                },
                1,
                1
            )),
            "asetrate=66075,aresample=44100"
        );
        assert_eq!(
            filter(&node(NodeKind::Fit { duration: 0.5 }, 1, 1)),
            "apad=whole_dur=0.5,atrim=end=0.5"
        );
    }

    #[test]
    fn test_makeup_is_clamped() {
        assert_eq!(makeup(0.0), 1.0);
        assert!((makeup(6.0) - 1.995262).abs() < 1e-6);
        // 64 linear is about 36.1 dB, so anything louder is capped there.
        assert_eq!(makeup(40.0), 64.0);
        assert_eq!(makeup(64.0), 64.0);
        assert_eq!(makeup(-6.0), 1.0);
    }

    #[test]
    fn test_compressor_levels_are_linear() {
        let compressor = CompressorConfig {
            threshold_db: -20.0,
            ratio: 4.0,
            attack_ms: 5.0,
            release_ms: 50.0,
            makeup_db: 0.0,
        };
        assert_eq!(
            filter(&node(NodeKind::Compressor(compressor), 1, 1)),
            "acompressor=threshold=0.1:ratio=4:attack=5:release=50:makeup=1"
        );
        let loud = CompressorConfig {
            makeup_db: 64.0,
            ..compressor
        };
        assert!(filter(&node(NodeKind::Compressor(loud), 1, 1)).ends_with("makeup=64"));
        assert_eq!(
            filter(&node(NodeKind::SidechainCompressor(compressor), 2, 1)),
            "sidechaincompress=threshold=0.1:ratio=4:attack=5:release=50"
        );
    }

    #[test]
    fn test_echo_decays_are_clamped() {
        let echo = NodeKind::Echo {
            in_gain: 0.8,
            out_gain: 0.9,
            delays_ms: vec![250.0, 500.0],
            decays: vec![0.0, 1.0],
        };
        assert_eq!(
            filter(&node(echo, 1, 1)),
            "aecho=0.8:0.9:250|500:0.001|1"
        );
    }

    #[test]
    fn test_filter_complex() {
        let events = vec![
            PlaybackEvent {
                time: 0.0,
                asset_path: PathBuf::from("kick.wav"),
                gain: 1.0,
                track_name: "kick".to_string(),
                pitch: None,
                duration: None,
            },
            PlaybackEvent {
                time: 0.5,
                asset_path: PathBuf::from("kick.wav"),
                gain: 1.0,
                track_name: "kick".to_string(),
                pitch: None,
                duration: None,
            },
        ];
        let graph = compile(&events, 1.0, None);
        assert_eq!(
            filter_complex(&graph),
            "[0:a]adelay=delays=0:all=1[e0_delay];\
             [e0_delay]apad=whole_dur=1[e0_pad];\
             [e0_pad]volume=0dB[e0];\
             [1:a]adelay=delays=500:all=1[e1_delay];\
             [e1_delay]apad=whole_dur=1[e1_pad];\
             [e1_pad]volume=0dB[e1];\
             [e0][e1]amix=inputs=2:duration=longest:normalize=0[bus0];\
             [bus0]anull[out]"
        );
    }

    #[test]
    fn test_filter_complex_with_sends() {
        let mut mix = MixConfig::default();
        mix.master.delay_send = Some(SendConfig {
            wet: 1.0,
            delay_ms: None,
            decay: None,
        });
        let events = vec![PlaybackEvent {
            time: 0.0,
            asset_path: PathBuf::from("kick.wav"),
            gain: 1.0,
            track_name: "kick".to_string(),
            pitch: None,
            duration: None,
        }];
        let filter = filter_complex(&compile(&events, 1.0, Some(&mix)));
        assert!(filter.contains("[master]asplit=2[dry][delay_send]"));
        assert!(filter.contains("[delay_send]aecho=0.8:0.9:375|750:0.35|0.1225[delay_echo]"));
        assert!(filter.ends_with("[dry][delay_wet]amix=inputs=2:duration=longest:normalize=0[out]"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let backend = Backend::new("/nonexistent/mixdown-ffmpeg");
        assert!(matches!(
            backend.check().await,
            Err(RenderError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_graph_is_rejected_before_running() {
        let backend = Backend::new("/nonexistent/mixdown-ffmpeg");
        let job = RenderJob {
            graph: Graph::new(),
            output: PathBuf::from("never.wav"),
            format: OutputFormat::default(),
            duration: 1.0,
        };
        assert!(matches!(
            backend.execute(&job).await,
            Err(RenderError::InvalidGraph(_))
        ));
    }
}
