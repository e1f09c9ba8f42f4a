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
//! Compiles playback events and a mix configuration into a processing graph.
//!
//! The graph is built in five phases:
//! 1. Per event: delay to its start time, pad to the full length, static gain
//! 2. Bus grouping: one bus per track
//! 3. Track inserts: gain, highpass, lowpass, compressor and sidechain ducking
//! 4. Master bus: the sum of all tracks
//! 5. Master chain: gain, compressor and the reverb/delay sends
//!
//! Without a mix configuration only phases 1, 2 and 4 apply.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::levels::{gain_to_db, ratio_to_db};
use super::node::{Graph, NodeKind, Port, OUTPUT_LABEL};
use crate::config::mix::{CompressorConfig, MasterConfig, MixConfig, SendConfig, TrackConfig};
use crate::timeline::PlaybackEvent;

/// Reverb tap times in milliseconds for the default base delay.
const REVERB_TAPS_MS: [f64; 4] = [40.0, 60.0, 90.0, 130.0];
/// Relative decay of each reverb tap.
const REVERB_TAP_DECAYS: [f64; 4] = [1.0, 0.8, 0.6, 0.4];
const REVERB_DEFAULT_DECAY: f64 = 0.5;
const DELAY_DEFAULT_MS: f64 = 375.0;
const DELAY_DEFAULT_DECAY: f64 = 0.35;
const ECHO_IN_GAIN: f64 = 0.8;
const ECHO_OUT_GAIN: f64 = 0.9;

/// Compiles the events into a graph whose output spans `total_duration` seconds.
/// The mix configuration is clamped into its supported ranges before use.
pub fn compile(events: &[PlaybackEvent], total_duration: f64, mix: Option<&MixConfig>) -> Graph {
    let mut graph = Graph::new();
    let mix = mix.map(MixConfig::validated);

    let buses = track_buses(&mut graph, events, total_duration);
    let tracks = match &mix {
        Some(mix) => track_inserts(&mut graph, buses, mix),
        None => buses.into_iter().map(|(_, port)| port).collect(),
    };

    let master = if tracks.len() == 1 {
        graph.push(NodeKind::Copy, tracks, "master")
    } else {
        graph.push(NodeKind::Mix, tracks, "master")
    };

    let master_config = mix.map(|mix| mix.master).unwrap_or_default();
    master_chain(&mut graph, master, &master_config);

    debug!(
        events = events.len(),
        assets = graph.assets().len(),
        nodes = graph.nodes().len(),
        "Compiled mix graph"
    );
    graph
}

/// Rounds a start time in seconds to whole milliseconds.
fn delay_ms(time: f64) -> u64 {
    (time * 1000.0).round().max(0.0) as u64
}

/// Phases 1 and 2. Returns one bus per track in order of first appearance.
fn track_buses(
    graph: &mut Graph,
    events: &[PlaybackEvent],
    total_duration: f64,
) -> Vec<(String, Port)> {
    let mut groups: Vec<(String, Vec<Port>)> = Vec::new();
    for (index, event) in events.iter().enumerate() {
        let asset = graph.add_asset(event.asset_path.clone());
        let delayed = graph.push(
            NodeKind::Delay {
                ms: delay_ms(event.time),
            },
            vec![asset],
            format!("e{}_delay", index),
        );
        let padded = graph.push(
            NodeKind::Pad {
                duration: total_duration,
            },
            vec![delayed],
            format!("e{}_pad", index),
        );
        let gained = graph.push(
            NodeKind::Gain {
                db: gain_to_db(event.gain),
            },
            vec![padded],
            format!("e{}", index),
        );

        match groups.iter_mut().find(|(name, _)| *name == event.track_name) {
            Some((_, ports)) => ports.push(gained),
            None => groups.push((event.track_name.clone(), vec![gained])),
        }
    }

    let mut buses = Vec::with_capacity(groups.len());
    for (index, (name, ports)) in groups.into_iter().enumerate() {
        let kind = if ports.len() == 1 {
            NodeKind::Copy
        } else {
            NodeKind::Mix
        };
        let bus = graph.push(kind, ports, format!("bus{}", index));
        buses.push((name, bus));
    }
    buses
}

/// Phase 3. Returns the processed bus of each track, in bus order.
fn track_inserts(graph: &mut Graph, buses: Vec<(String, Port)>, mix: &MixConfig) -> Vec<Port> {
    let names: Vec<String> = buses.iter().map(|(name, _)| name.clone()).collect();
    let sidechains = sidechains(&names, mix);

    let mut processed = Vec::with_capacity(buses.len());
    for (index, (name, bus)) in buses.into_iter().enumerate() {
        let label = if sidechains.contains_key(&index) {
            format!("t{}_pre", index)
        } else {
            format!("t{}", index)
        };
        let stages = mix.track(&name).map(track_stages).unwrap_or_default();
        processed.push(chain(graph, bus, stages, &label));
    }

    // Each sidechain source is split into its own signal plus one key per ducked track.
    let mut targets_by_source: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (target, (source, _)) in sidechains.iter() {
        targets_by_source.entry(*source).or_default().push(*target);
    }
    let mut keys: BTreeMap<usize, Port> = BTreeMap::new();
    for (source, targets) in targets_by_source {
        let mut outputs = vec![format!("t{}", source)];
        outputs.extend(targets.iter().map(|target| format!("t{}_key{}", source, target)));

        let unsplit = format!("t{}_main", source);
        graph.rename_output(&format!("t{}", source), &unsplit);
        let mut ports = graph.split(Port::Label(unsplit), outputs).into_iter();
        if let Some(main) = ports.next() {
            processed[source] = main;
        }
        keys.extend(targets.into_iter().zip(ports));
    }

    for (target, (_, sidechain)) in sidechains {
        let Some(key) = keys.remove(&target) else {
            continue;
        };
        processed[target] = graph.push(
            NodeKind::SidechainCompressor(sidechain),
            vec![processed[target].clone(), key],
            format!("t{}", target),
        );
    }

    processed
}

/// Finds the usable sidechains as a map of target bus to (source bus, dynamics).
fn sidechains(names: &[String], mix: &MixConfig) -> BTreeMap<usize, (usize, CompressorConfig)> {
    let mut sidechains = BTreeMap::new();
    for (target, name) in names.iter().enumerate() {
        let Some(sidechain) = mix.track(name).and_then(|config| config.sidechain.as_ref()) else {
            continue;
        };
        let Some(source) = names
            .iter()
            .position(|other| other.eq_ignore_ascii_case(&sidechain.source))
        else {
            warn!(
                track = name,
                source = sidechain.source,
                "Sidechain source track has no events, skipping sidechain"
            );
            continue;
        };
        if source == target {
            warn!(track = name, "Track cannot duck under itself, skipping sidechain");
            continue;
        }
        sidechains.insert(
            target,
            (
                source,
                CompressorConfig {
                    threshold_db: sidechain.threshold_db,
                    ratio: sidechain.ratio,
                    attack_ms: sidechain.attack_ms,
                    release_ms: sidechain.release_ms,
                    makeup_db: 0.0,
                },
            ),
        );
    }

    // A ducked track cannot also key another track.
    let targets: Vec<usize> = sidechains.keys().copied().collect();
    sidechains.retain(|target, (source, _)| {
        let chained = targets.contains(source);
        if chained {
            warn!(
                track = names[*target],
                source = names[*source],
                "Sidechain source is itself ducked, skipping sidechain"
            );
        }
        !chained
    });
    sidechains
}

/// The fixed insert order for a track: gain, highpass, lowpass, compressor.
fn track_stages(config: &TrackConfig) -> Vec<(NodeKind, &'static str)> {
    let mut stages = Vec::new();
    if config.gain_db != 0.0 {
        stages.push((NodeKind::Gain { db: config.gain_db }, "gain"));
    }
    if let Some(hz) = config.highpass_hz {
        stages.push((NodeKind::Highpass { hz }, "hp"));
    }
    if let Some(hz) = config.lowpass_hz {
        stages.push((NodeKind::Lowpass { hz }, "lp"));
    }
    if let Some(compressor) = config.compressor {
        stages.push((NodeKind::Compressor(compressor), "comp"));
    }
    stages
}

/// Chains the stages onto the input, with the last stage producing `label`.
/// With no stages the input is copied onto `label`.
fn chain(
    graph: &mut Graph,
    input: Port,
    stages: Vec<(NodeKind, &'static str)>,
    label: &str,
) -> Port {
    if stages.is_empty() {
        return graph.push(NodeKind::Copy, vec![input], label);
    }
    let last = stages.len() - 1;
    let mut port = input;
    for (index, (kind, suffix)) in stages.into_iter().enumerate() {
        let output = if index == last {
            label.to_string()
        } else {
            format!("{}_{}", label, suffix)
        };
        port = graph.push(kind, vec![port], output);
    }
    port
}

/// Phase 5.
fn master_chain(graph: &mut Graph, master: Port, config: &MasterConfig) {
    let mut stages = Vec::new();
    if config.gain_db != 0.0 {
        stages.push((NodeKind::Gain { db: config.gain_db }, "gain"));
    }
    if let Some(compressor) = config.compressor {
        stages.push((NodeKind::Compressor(compressor), "comp"));
    }

    let sends: Vec<(&str, NodeKind, f64)> = [
        config.reverb_send.map(|send| ("reverb", reverb(&send), send.wet)),
        config.delay_send.map(|send| ("delay", echo_delay(&send), send.wet)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sends.is_empty() {
        if stages.is_empty() {
            if let Port::Label(label) = &master {
                graph.rename_output(label, OUTPUT_LABEL);
            }
        } else {
            chain(graph, master, stages, OUTPUT_LABEL);
        }
        return;
    }

    let post = if stages.is_empty() {
        master
    } else {
        chain(graph, master, stages, "master_post")
    };

    let mut outputs = vec!["dry".to_string()];
    outputs.extend(sends.iter().map(|(name, _, _)| format!("{}_send", name)));
    let mut ports = graph.split(post, outputs).into_iter();

    let mut paths: Vec<Port> = ports.next().into_iter().collect();
    for ((name, effect, wet), port) in sends.into_iter().zip(ports) {
        let echoed = graph.push(effect, vec![port], format!("{}_echo", name));
        paths.push(graph.push(
            NodeKind::Gain {
                db: ratio_to_db(wet),
            },
            vec![echoed],
            format!("{}_wet", name),
        ));
    }
    graph.push(NodeKind::Mix, paths, OUTPUT_LABEL);
}

/// A short four-tap echo. The delay time scales every tap.
fn reverb(send: &SendConfig) -> NodeKind {
    let scale = send.delay_ms.map_or(1.0, |ms| ms / REVERB_TAPS_MS[0]);
    let decay = send.decay.unwrap_or(REVERB_DEFAULT_DECAY);
    NodeKind::Echo {
        in_gain: ECHO_IN_GAIN,
        out_gain: ECHO_OUT_GAIN,
        delays_ms: REVERB_TAPS_MS.iter().map(|ms| ms * scale).collect(),
        decays: REVERB_TAP_DECAYS.iter().map(|d| d * decay).collect(),
    }
}

/// A two-repeat echo.
fn echo_delay(send: &SendConfig) -> NodeKind {
    let ms = send.delay_ms.unwrap_or(DELAY_DEFAULT_MS);
    let decay = send.decay.unwrap_or(DELAY_DEFAULT_DECAY);
    NodeKind::Echo {
        in_gain: ECHO_IN_GAIN,
        out_gain: ECHO_OUT_GAIN,
        delays_ms: vec![ms, ms * 2.0],
        decays: vec![decay, decay * decay],
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::mix::SidechainConfig;
    use crate::graph::node::Node;

    fn event(track: &str, time: f64, gain: f64) -> PlaybackEvent {
        PlaybackEvent {
            time,
            asset_path: PathBuf::from(format!("{}.wav", track)),
            gain,
            track_name: track.to_string(),
            pitch: None,
            duration: None,
        }
    }

    fn producer<'a>(graph: &'a Graph, label: &str) -> &'a Node {
        graph
            .producer(label)
            .unwrap_or_else(|| panic!("nothing produces {}", label))
    }

    /// Walks back from a label through single-input nodes, collecting kinds until a bus is hit.
    fn chain_kinds(graph: &Graph, label: &str) -> Vec<NodeKind> {
        let mut kinds = Vec::new();
        let mut current = label.to_string();
        while !current.starts_with("bus") {
            let node = producer(graph, &current);
            kinds.push(node.kind.clone());
            match &node.inputs[0] {
                Port::Label(input) => current = input.clone(),
                Port::Asset(_) => break,
            }
        }
        kinds.reverse();
        kinds
    }

    fn compressor(ratio: f64) -> CompressorConfig {
        CompressorConfig {
            threshold_db: -18.0,
            ratio,
            attack_ms: 10.0,
            release_ms: 120.0,
            makeup_db: 2.0,
        }
    }

    #[test]
    fn test_single_event_without_mix() {
        let graph = compile(&[event("kick", 0.46875, 0.5)], 2.0, None);
        assert_eq!(graph.check(), Ok(()));
        assert_eq!(graph.assets(), &[PathBuf::from("kick.wav")]);

        let kinds: Vec<&NodeKind> = graph.nodes().iter().map(|node| &node.kind).collect();
        assert_eq!(kinds.len(), 5);
        assert_eq!(*kinds[0], NodeKind::Delay { ms: 469 });
        assert_eq!(*kinds[1], NodeKind::Pad { duration: 2.0 });
        match kinds[2] {
            NodeKind::Gain { db } => assert!((db - gain_to_db(0.5)).abs() < 1e-12),
            other => panic!("expected gain, got {:?}", other),
        }
        assert_eq!(*kinds[3], NodeKind::Copy);
        assert_eq!(*kinds[4], NodeKind::Copy);
        assert_eq!(graph.nodes()[4].outputs, vec![OUTPUT_LABEL.to_string()]);
    }

    #[test]
    fn test_bus_grouping() {
        let events = vec![
            event("kick", 0.0, 1.0),
            event("snare", 0.5, 1.0),
            event("kick", 1.0, 1.0),
            event("kick", 1.5, 0.0),
        ];
        let graph = compile(&events, 2.0, None);
        assert_eq!(graph.check(), Ok(()));
        assert_eq!(graph.assets().len(), 4);

        let kick_bus = producer(&graph, "bus0");
        assert_eq!(kick_bus.kind, NodeKind::Mix);
        assert_eq!(
            kick_bus.inputs,
            vec![Port::label("e0"), Port::label("e2"), Port::label("e3")]
        );
        assert_eq!(producer(&graph, "bus1").kind, NodeKind::Copy);
        assert_eq!(producer(&graph, "e3").kind, NodeKind::Gain { db: -60.0 });

        let master = producer(&graph, OUTPUT_LABEL);
        assert_eq!(master.kind, NodeKind::Mix);
        assert_eq!(master.inputs, vec![Port::label("bus0"), Port::label("bus1")]);
        assert_eq!(graph.count(|kind| matches!(kind, NodeKind::Split)), 0);
    }

    #[test]
    fn test_track_insert_order() {
        let mut mix = MixConfig::default();
        mix.tracks.insert(
            "bass".to_string(),
            TrackConfig {
                gain_db: -2.0,
                highpass_hz: Some(40.0),
                lowpass_hz: Some(8000.0),
                compressor: Some(compressor(4.0)),
                sidechain: None,
            },
        );
        mix.tracks.insert(
            "keys".to_string(),
            TrackConfig {
                gain_db: 0.0,
                lowpass_hz: Some(5000.0),
                ..Default::default()
            },
        );
        let events = vec![
            event("bass", 0.0, 1.0),
            event("keys", 0.0, 1.0),
            event("kick", 0.0, 1.0),
        ];
        let graph = compile(&events, 1.0, Some(&mix));
        assert_eq!(graph.check(), Ok(()));

        assert_eq!(
            chain_kinds(&graph, "t0"),
            vec![
                NodeKind::Gain { db: -2.0 },
                NodeKind::Highpass { hz: 40.0 },
                NodeKind::Lowpass { hz: 8000.0 },
                NodeKind::Compressor(compressor(4.0)),
            ]
        );
        assert_eq!(chain_kinds(&graph, "t1"), vec![NodeKind::Lowpass { hz: 5000.0 }]);
        assert_eq!(chain_kinds(&graph, "t2"), vec![NodeKind::Copy]);
    }

    #[test]
    fn test_track_values_are_clamped() {
        let mut mix = MixConfig::default();
        mix.tracks.insert(
            "kick".to_string(),
            TrackConfig {
                gain_db: 40.0,
                compressor: Some(compressor(0.5)),
                ..Default::default()
            },
        );
        let graph = compile(&[event("kick", 0.0, 1.0)], 1.0, Some(&mix));
        assert_eq!(
            chain_kinds(&graph, "t0"),
            vec![
                NodeKind::Gain { db: 24.0 },
                NodeKind::Compressor(compressor(1.0)),
            ]
        );
    }

    #[test]
    fn test_master_gain_without_sends_feeds_output() {
        let mut mix = MixConfig::default();
        mix.master.gain_db = -3.0;
        mix.master.compressor = Some(compressor(2.0));
        let graph = compile(&[event("kick", 0.0, 1.0)], 1.0, Some(&mix));
        assert_eq!(graph.check(), Ok(()));

        let out = producer(&graph, OUTPUT_LABEL);
        assert_eq!(out.kind, NodeKind::Compressor(compressor(2.0)));
        assert_eq!(producer(&graph, "out_gain").kind, NodeKind::Gain { db: -3.0 });
        assert_eq!(graph.count(|kind| matches!(kind, NodeKind::Mix)), 0);
    }

    #[test]
    fn test_flat_mix_renames_master_to_output() {
        let graph = compile(&[event("kick", 0.0, 1.0)], 1.0, Some(&MixConfig::default()));
        assert_eq!(graph.check(), Ok(()));
        let out = producer(&graph, OUTPUT_LABEL);
        assert_eq!(out.kind, NodeKind::Copy);
        assert_eq!(out.inputs, vec![Port::label("t0")]);
    }

    #[test]
    fn test_sends_split_and_mix() {
        let mut mix = MixConfig::default();
        mix.master.reverb_send = Some(SendConfig {
            wet: 0.1,
            delay_ms: None,
            decay: None,
        });
        mix.master.delay_send = Some(SendConfig {
            wet: 0.0,
            delay_ms: Some(250.0),
            decay: Some(0.5),
        });
        let graph = compile(
            &[event("kick", 0.0, 1.0), event("hat", 0.25, 0.5)],
            1.0,
            Some(&mix),
        );
        assert_eq!(graph.check(), Ok(()));

        let split = producer(&graph, "dry");
        assert_eq!(split.kind, NodeKind::Split);
        assert_eq!(split.inputs, vec![Port::label("master")]);
        assert_eq!(split.outputs, vec!["dry", "reverb_send", "delay_send"]);

        match &producer(&graph, "reverb_echo").kind {
            NodeKind::Echo {
                delays_ms, decays, ..
            } => {
                assert_eq!(delays_ms.len(), 4);
                assert_eq!(decays.len(), 4);
                assert!((decays[0] - REVERB_DEFAULT_DECAY).abs() < 1e-12);
            }
            other => panic!("expected echo, got {:?}", other),
        }
        assert_eq!(
            producer(&graph, "delay_echo").kind,
            NodeKind::Echo {
                in_gain: ECHO_IN_GAIN,
                out_gain: ECHO_OUT_GAIN,
                delays_ms: vec![250.0, 500.0],
                decays: vec![0.5, 0.25],
            }
        );
        match producer(&graph, "reverb_wet").kind {
            NodeKind::Gain { db } => assert!((db - (-20.0)).abs() < 1e-9),
            ref other => panic!("expected gain, got {:?}", other),
        }
        assert_eq!(producer(&graph, "delay_wet").kind, NodeKind::Gain { db: -60.0 });

        let out = producer(&graph, OUTPUT_LABEL);
        assert_eq!(out.kind, NodeKind::Mix);
        assert_eq!(
            out.inputs,
            vec![
                Port::label("dry"),
                Port::label("reverb_wet"),
                Port::label("delay_wet")
            ]
        );
    }

    fn duck(source: &str) -> TrackConfig {
        TrackConfig {
            sidechain: Some(SidechainConfig {
                source: source.to_string(),
                threshold_db: -24.0,
                ratio: 6.0,
                attack_ms: 5.0,
                release_ms: 150.0,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_sidechain_ducking() {
        let mut mix = MixConfig::default();
        mix.tracks.insert("bass".to_string(), duck("kick"));
        let events = vec![event("kick", 0.0, 1.0), event("bass", 0.0, 1.0)];
        let graph = compile(&events, 1.0, Some(&mix));
        assert_eq!(graph.check(), Ok(()));

        let ducked = producer(&graph, "t1");
        assert!(matches!(
            ducked.kind,
            NodeKind::SidechainCompressor(CompressorConfig {
                ratio,
                makeup_db,
                ..
            }) if ratio == 6.0 && makeup_db == 0.0
        ));
        assert_eq!(
            ducked.inputs,
            vec![Port::label("t1_pre"), Port::label("t0_key1")]
        );

        let split = producer(&graph, "t0_key1");
        assert_eq!(split.kind, NodeKind::Split);
        assert_eq!(split.inputs, vec![Port::label("t0_main")]);
        assert_eq!(
            producer(&graph, OUTPUT_LABEL).inputs,
            vec![Port::label("t0"), Port::label("t1")]
        );
    }

    #[test]
    fn test_invalid_sidechains_are_skipped() {
        let mut mix = MixConfig::default();
        mix.tracks.insert("bass".to_string(), duck("cowbell"));
        mix.tracks.insert("pad".to_string(), duck("pad"));
        mix.tracks.insert("lead".to_string(), duck("keys"));
        mix.tracks.insert("keys".to_string(), duck("lead"));
        let events = vec![
            event("bass", 0.0, 1.0),
            event("pad", 0.0, 1.0),
            event("lead", 0.0, 1.0),
            event("keys", 0.0, 1.0),
        ];
        let graph = compile(&events, 1.0, Some(&mix));
        assert_eq!(graph.check(), Ok(()));
        assert_eq!(
            graph.count(|kind| matches!(kind, NodeKind::SidechainCompressor(_))),
            0
        );
    }
}
