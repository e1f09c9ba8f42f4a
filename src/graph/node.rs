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
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::mix::CompressorConfig;

/// The label every graph delivers its final signal on.
pub const OUTPUT_LABEL: &str = "out";

/// A processing stage. Parameters are plain numbers; backends decide how to express them.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Delays the input by a whole number of milliseconds.
    Delay { ms: u64 },
    /// Pads the input with silence to span the given length in seconds.
    Pad { duration: f64 },
    /// A static gain in dB.
    Gain { db: f64 },
    Highpass { hz: f64 },
    Lowpass { hz: f64 },
    /// A compressor with dB threshold and makeup.
    Compressor(CompressorConfig),
    /// A compressor on the first input keyed by the second input. Makeup is unused.
    SidechainCompressor(CompressorConfig),
    /// Sums all inputs.
    Mix,
    /// Duplicates the input onto every output.
    Split,
    /// Passes the input through unchanged.
    Copy,
    /// A multi-tap echo. `delays_ms` and `decays` are paired per tap.
    Echo {
        in_gain: f64,
        out_gain: f64,
        delays_ms: Vec<f64>,
        decays: Vec<f64>,
    },
    /// Plays the input at `sample_rate * factor` and resamples back to `sample_rate`.
    RateShift { factor: f64, sample_rate: u32 },
    /// Trims or silence-pads the input to exactly the given length in seconds.
    Fit { duration: f64 },
}

impl NodeKind {
    /// The number of inputs this kind needs, or None if it takes any number of them.
    pub fn arity(&self) -> Option<usize> {
        match self {
            NodeKind::Mix => None,
            NodeKind::SidechainCompressor(_) => Some(2),
            _ => Some(1),
        }
    }
}

/// A connection point on a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    /// The audio of the graph's nth input asset.
    Asset(usize),
    /// The output of another node.
    Label(String),
}

impl Port {
    pub fn label(name: impl Into<String>) -> Port {
        Port::Label(name.into())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Asset(index) => write!(f, "asset#{}", index),
            Port::Label(name) => write!(f, "{}", name),
        }
    }
}

/// A processing node: a stage wired from its inputs to its named outputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub inputs: Vec<Port>,
    pub outputs: Vec<String>,
}

/// An ordered list of processing-node declarations over a set of input assets,
/// feeding the single output labelled [`OUTPUT_LABEL`].
#[derive(Clone, Debug, PartialEq)]
pub struct Graph {
    assets: Vec<PathBuf>,
    nodes: Vec<Node>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Graph {
        Graph {
            assets: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Registers an input asset and returns the port that reads it.
    pub fn add_asset(&mut self, path: PathBuf) -> Port {
        self.assets.push(path);
        Port::Asset(self.assets.len() - 1)
    }

    /// Appends a node with a single output and returns the port for that output.
    pub fn push(&mut self, kind: NodeKind, inputs: Vec<Port>, output: impl Into<String>) -> Port {
        let output = output.into();
        self.nodes.push(Node {
            kind,
            inputs,
            outputs: vec![output.clone()],
        });
        Port::Label(output)
    }

    /// Appends a split node and returns the ports for its outputs.
    pub fn split(&mut self, input: Port, outputs: Vec<String>) -> Vec<Port> {
        let ports = outputs.iter().cloned().map(Port::Label).collect();
        self.nodes.push(Node {
            kind: NodeKind::Split,
            inputs: vec![input],
            outputs,
        });
        ports
    }

    /// Renames the output of the node producing `from`. Returns false if no node produces it.
    pub fn rename_output(&mut self, from: &str, to: &str) -> bool {
        for node in self.nodes.iter_mut().rev() {
            if let Some(output) = node.outputs.iter_mut().find(|output| output.as_str() == from) {
                *output = to.to_string();
                return true;
            }
        }
        false
    }

    /// Gets the input assets, indexed by [`Port::Asset`].
    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    /// Gets the nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Counts the nodes matching the predicate.
    pub fn count(&self, predicate: impl Fn(&NodeKind) -> bool) -> usize {
        self.nodes.iter().filter(|node| predicate(&node.kind)).count()
    }

    /// Gets the node producing the given label.
    pub fn producer(&self, label: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| node.outputs.iter().any(|output| output == label))
    }

    /// Checks that the graph is wired correctly: every label is produced exactly once and
    /// consumed exactly once, except the output which is produced and never consumed,
    /// every asset is read exactly once and every node has the inputs it needs.
    pub fn check(&self) -> Result<(), String> {
        let mut produced: HashMap<&str, usize> = HashMap::new();
        let mut consumed: HashMap<&Port, usize> = HashMap::new();

        for node in self.nodes.iter() {
            if node.outputs.is_empty() {
                return Err(format!("{:?} node has no outputs", node.kind));
            }
            match node.kind.arity() {
                Some(arity) if node.inputs.len() != arity => {
                    return Err(format!(
                        "{:?} node expects {} inputs, got {}",
                        node.kind,
                        arity,
                        node.inputs.len()
                    ))
                }
                None if node.inputs.is_empty() => {
                    return Err(format!("{:?} node has no inputs", node.kind))
                }
                _ => {}
            }
            for output in node.outputs.iter() {
                *produced.entry(output.as_str()).or_default() += 1;
            }
            for input in node.inputs.iter() {
                *consumed.entry(input).or_default() += 1;
            }
        }

        if produced.get(OUTPUT_LABEL) != Some(&1) {
            return Err(format!("graph must produce \"{}\" exactly once", OUTPUT_LABEL));
        }
        for (label, count) in produced.iter() {
            if *count != 1 {
                return Err(format!("label {} is produced {} times", label, count));
            }
            let uses = consumed
                .get(&Port::Label(label.to_string()))
                .copied()
                .unwrap_or(0);
            let expected = if *label == OUTPUT_LABEL { 0 } else { 1 };
            if uses != expected {
                return Err(format!("label {} is consumed {} times", label, uses));
            }
        }
        for (port, count) in consumed.iter() {
            match port {
                Port::Label(label) if !produced.contains_key(label.as_str()) => {
                    return Err(format!("label {} is never produced", label));
                }
                Port::Asset(index) if *index >= self.assets.len() => {
                    return Err(format!("asset {} does not exist", index));
                }
                Port::Asset(index) if *count != 1 => {
                    return Err(format!("asset {} is read {} times", index, count));
                }
                _ => {}
            }
        }
        if let Some(index) =
            (0..self.assets.len()).find(|index| !consumed.contains_key(&Port::Asset(*index)))
        {
            return Err(format!("asset {} is never read", index));
        }

        Ok(())
    }
}
