//! Activation of the network encoded by an [`NNGenome`].
//!
//! A genome is its own phenotype: nodes carry their activation
//! state, and enabled connections are indexed by target node
//! in a derived topology, rebuilt whenever the genome's
//! structure changes. Disabled connections are ignored.
//!
//! Every call to [`activate`] is one time step. Feed-forward
//! paths are relaxed within the call until every output has
//! fired, so deep hidden layers may still hold older values when
//! it returns. Recurrent connections read the values their
//! sources held when the call began, which is what gives
//! recurrent networks memory across calls.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
//! [`activate`]: crate::genomics::NNGenome::activate
use crate::genomics::{ConnectionGene, FeatureKey, NNGenome, NodeGene, NodeKind};
use crate::Innovation;

use thiserror::Error;

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Relaxation rounds after which an activation gives up.
pub const MAX_ACTIVATION_ROUNDS: usize = 100;

/// Rounds granted to a network on top of the
/// requested period before it is deemed unstable.
const STABILIZATION_GRACE: usize = 90;

/// An error type indicating a failed activation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Some output was never reached from the inputs.
    #[error("outputs still inactive after {rounds} activation rounds")]
    DefectNetwork { rounds: usize },
    #[error("expected {expected} inputs, found {found}")]
    InputSizeMismatch { expected: usize, found: usize },
}

/// The result of a single activation.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkOutput {
    /// Softmax distribution over the classification
    /// outputs, in action order.
    pub classification: Vec<f32>,
    /// Values of the regression outputs, ordered
    /// by action and then by parameter.
    pub regression: Vec<f32>,
}

impl NetworkOutput {
    /// Returns the index of the most probable action, if any.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::networks::NetworkOutput;
    ///
    /// let output = NetworkOutput { classification: vec![0.2, 0.5, 0.3], regression: vec![] };
    /// assert_eq!(output.selected_action(), Some(1));
    /// ```
    pub fn selected_action(&self) -> Option<usize> {
        self.classification
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }
}

/// Node indices of a genome's enabled wiring.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Topology {
    /// `(source node, connection)` index pairs, by target node.
    incoming: Vec<Vec<(usize, usize)>>,
    inputs: Vec<usize>,
    bias: Option<usize>,
    classification: Vec<usize>,
    regression: Vec<usize>,
}

impl Topology {
    /// Indexes the enabled connections. Both slices
    /// must be sorted, nodes by id.
    fn new(nodes: &[NodeGene], connections: &[ConnectionGene]) -> Topology {
        let index_of = |id: Innovation| nodes.binary_search_by_key(&id, |n| n.id()).ok();
        let mut topology = Topology {
            incoming: vec![vec![]; nodes.len()],
            ..Topology::default()
        };
        for (c, connection) in connections.iter().enumerate().filter(|(_, c)| c.enabled()) {
            if let (Some(source), Some(target)) =
                (index_of(connection.source()), index_of(connection.target()))
            {
                topology.incoming[target].push((source, c));
            }
        }
        for (i, node) in nodes.iter().enumerate() {
            match node.kind() {
                NodeKind::Input { .. } => topology.inputs.push(i),
                NodeKind::Bias => topology.bias = Some(i),
                NodeKind::Hidden => {}
                NodeKind::Classification { .. } => topology.classification.push(i),
                NodeKind::Regression { .. } => topology.regression.push(i),
            }
        }
        topology
    }

    fn outputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.classification.iter().chain(&self.regression).copied()
    }

    fn output(&self, nodes: &[NodeGene]) -> NetworkOutput {
        let scores: Vec<f32> = self
            .classification
            .iter()
            .map(|&i| nodes[i].node_value())
            .collect();
        NetworkOutput {
            classification: softmax(&scores),
            regression: self
                .regression
                .iter()
                .map(|&i| nodes[i].activation_value())
                .collect(),
        }
    }
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exponentials: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exponentials.iter().sum();
    exponentials.iter().map(|e| e / total).collect()
}

/// Runs relaxation rounds until a round ends with every output
/// having fired during this call, or the round limit is hit.
fn propagate(
    nodes: &mut [NodeGene],
    connections: &[ConnectionGene],
    topology: &Topology,
    inputs: &[f32],
) -> Result<(), NetworkError> {
    if inputs.len() != topology.inputs.len() {
        return Err(NetworkError::InputSizeMismatch {
            expected: topology.inputs.len(),
            found: inputs.len(),
        });
    }

    // What recurrent connections see for the whole call.
    let previous: Vec<(f32, bool)> = nodes
        .iter()
        .map(|n| (n.activation_value(), n.activation_count() > 0))
        .collect();
    for (&i, &value) in topology.inputs.iter().zip(inputs) {
        nodes[i].load(value);
    }
    if let Some(bias) = topology.bias {
        nodes[bias].load(1.0);
    }

    let mut fired = vec![false; nodes.len()];
    let mut sums = vec![(0.0, false); nodes.len()];
    for _ in 0..MAX_ACTIVATION_ROUNDS {
        for (target, incoming) in topology.incoming.iter().enumerate() {
            if nodes[target].kind().is_sensor() {
                continue;
            }
            let mut sum = 0.0;
            let mut active = false;
            for &(source, c) in incoming {
                let connection = &connections[c];
                let (value, source_active) = if connection.recurrent() {
                    previous[source]
                } else {
                    let node = &nodes[source];
                    (node.activation_value(), node.kind().is_sensor() || fired[source])
                };
                sum += connection.weight() * value;
                active |= source_active;
            }
            sums[target] = (sum, active);
        }

        for (i, node) in nodes.iter_mut().enumerate() {
            if node.kind().is_sensor() {
                continue;
            }
            let (sum, active) = sums[i];
            node.node_value = sum;
            node.activated = active;
            if active {
                node.last_activation_value = node.activation_value;
                node.activation_value = node.activation_function().apply(sum);
                node.activation_count += 1;
                fired[i] = true;
            }
        }

        if topology.outputs().all(|i| fired[i]) {
            return Ok(());
        }
    }

    Err(NetworkError::DefectNetwork {
        rounds: MAX_ACTIVATION_ROUNDS,
    })
}

impl NNGenome {
    /// Sorts the genome's genes and rebuilds the index of
    /// enabled connections used for activation. Repeated calls
    /// without structural changes have no further effect.
    pub fn generate_network(&mut self) {
        self.nodes.sort_by_key(|n| n.id());
        self.connections.sort_by_key(|c| c.innovation());
        self.topology = Some(Topology::new(&self.nodes, &self.connections));
    }

    fn take_topology(&mut self) -> Topology {
        match self.topology.take() {
            Some(topology) => topology,
            None => Topology::new(&self.nodes, &self.connections),
        }
    }

    /// Performs a single time step of the network, with
    /// `inputs` given in input node order.
    ///
    /// # Errors
    /// Fails if the number of inputs is wrong, or if some output
    /// cannot be reached from the inputs and the bias.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// // Nodes 0 and 1 are inputs, 2 the bias, 3 and 4 outputs.
    /// let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(2, 2));
    /// genome.add_connection(0, 0, 3, 1.0, false).unwrap();
    /// genome.add_connection(3, 1, 4, 1.0, false).unwrap();
    ///
    /// let output = genome.activate(&[2.0, 1.0]).unwrap();
    /// assert_eq!(output.selected_action(), Some(0));
    /// assert!((output.classification.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    ///
    /// assert!(genome.activate(&[2.0]).is_err());
    /// ```
    pub fn activate(&mut self, inputs: &[f32]) -> Result<NetworkOutput, NetworkError> {
        let topology = self.take_topology();
        let result = propagate(&mut self.nodes, &self.connections, &topology, inputs)
            .map(|()| topology.output(&self.nodes));
        self.topology = Some(topology);
        result
    }

    /// Performs a single time step of the network, reading each input
    /// node's value from `features`. Missing features read as 0.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{FeatureGroup, GeneticConfig, NNGenome};
    /// use std::collections::HashMap;
    ///
    /// let config = GeneticConfig {
    ///     feature_groups: vec![FeatureGroup { name: "cat".into(), features: vec!["x".into(), "y".into()] }],
    ///     ..GeneticConfig::with_shape(0, 2)
    /// };
    /// let mut genome = NNGenome::unconnected(&config);
    /// genome.add_connection(0, 0, 3, 1.0, false).unwrap();
    /// genome.add_connection(3, 1, 4, 1.0, false).unwrap();
    ///
    /// let features = HashMap::from([(config.feature_key("cat", "y").unwrap(), 5.0)]);
    /// assert_eq!(genome.activate_features(&features).unwrap().selected_action(), Some(1));
    /// ```
    pub fn activate_features<S: BuildHasher>(
        &mut self,
        features: &HashMap<FeatureKey, f32, S>,
    ) -> Result<NetworkOutput, NetworkError> {
        let inputs: Vec<f32> = self
            .nodes
            .iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Input { group, feature } => {
                    Some(*features.get(&FeatureKey { group, feature }).unwrap_or(&0.0))
                }
                _ => None,
            })
            .collect();
        self.activate(&inputs)
    }

    /// Resets the activation state of every node,
    /// so the next activation starts a new episode.
    pub fn flush_node_values(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Activates the network repeatedly with all inputs set to 1,
    /// and returns how many activations it took before the outputs
    /// held still for `period` consecutive activations, or -1 if
    /// that did not happen within `period + 90` activations.
    ///
    /// Recurrent networks are never expected to settle, and
    /// report `period + 90` without being activated.
    ///
    /// Node values are flushed before and after.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(1, 1));
    /// // The output is unreachable.
    /// assert_eq!(genome.stabilized_counter(10), -1);
    ///
    /// genome.add_connection(0, 0, 2, 1.0, false).unwrap();
    /// // The first activation moves the output away from its flushed value.
    /// assert_eq!(genome.stabilized_counter(10), 1);
    /// ```
    pub fn stabilized_counter(&mut self, period: usize) -> i32 {
        self.generate_network();
        self.flush_node_values();
        self.update_recurrent();
        let limit = period + STABILIZATION_GRACE;
        if self.recurrent {
            return limit as i32;
        }

        let (inputs, outputs) = match &self.topology {
            Some(topology) => (topology.inputs.len(), topology.outputs().collect::<Vec<_>>()),
            None => (0, vec![]),
        };
        let ones = vec![1.0; inputs];
        let mut stable = 0;
        for round in 0..limit {
            let settled = self.activate(&ones).is_ok()
                && outputs.iter().all(|&i| {
                    self.nodes[i].last_activation_value() == self.nodes[i].activation_value()
                });
            if settled {
                stable += 1;
                if stable >= period {
                    self.flush_node_values();
                    return (round + 1 - period) as i32;
                }
            } else {
                stable = 0;
            }
        }
        self.flush_node_values();
        -1
    }

    /// Returns whether a connection from `source` to `target` would
    /// close a cycle: that is, whether `source` can be reached from
    /// `target` along enabled, feed-forward connections, or `source`
    /// is an output node. The search gives up, returning `false`,
    /// beyond `threshold` levels.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{ActivationFunction, GeneticConfig, NNGenome};
    ///
    /// // Nodes 0 and 1 are inputs, 2 the bias, 3 the output.
    /// let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(2, 1));
    /// genome.add_node(4, ActivationFunction::Sigmoid).unwrap();
    /// genome.add_connection(10, 0, 4, 1.0, false).unwrap();
    /// genome.add_connection(11, 4, 3, 1.0, false).unwrap();
    ///
    /// assert!(!genome.is_recurrent_path(0, 4, 25));
    /// assert!(genome.is_recurrent_path(4, 4, 25));
    /// assert!(genome.is_recurrent_path(3, 4, 25));
    /// ```
    pub fn is_recurrent_path(&mut self, source: Innovation, target: Innovation, threshold: usize) -> bool {
        let (Some(source), Some(target)) = (self.node_index(source), self.node_index(target)) else {
            return false;
        };
        let topology = self.take_topology();
        let mut traversed = vec![false; self.nodes.len()];
        let mut stack = vec![(source, 0)];
        let mut found = false;
        while let Some((node, level)) = stack.pop() {
            if self.nodes[node].kind().is_output() || node == target {
                found = true;
                break;
            }
            if level >= threshold {
                continue;
            }
            for &(previous, c) in &topology.incoming[node] {
                if !self.connections[c].recurrent() && !traversed[previous] {
                    traversed[previous] = true;
                    stack.push((previous, level + 1));
                }
            }
        }
        self.topology = Some(topology);
        found
    }

    /// Returns whether the network has enabled recurrent
    /// connections, as of the last structural update.
    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    /// Recomputes whether any enabled connection is recurrent,
    /// and returns the result.
    pub fn update_recurrent(&mut self) -> bool {
        self.recurrent = self
            .connections
            .iter()
            .any(|c| c.enabled() && c.recurrent());
        self.recurrent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationFunction, GeneticConfig};
    use approx::assert_abs_diff_eq;

    /// Input 0 -> hidden 3 -> output 2, with input 0 also
    /// feeding the output directly.
    fn layered() -> NNGenome {
        let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(1, 1));
        genome.add_node(3, ActivationFunction::Relu).unwrap();
        genome.add_connection(0, 0, 2, 0.5, false).unwrap();
        genome.add_connection(4, 0, 3, 2.0, false).unwrap();
        genome.add_connection(5, 3, 2, 1.0, false).unwrap();
        genome
    }

    #[test]
    fn feed_forward_activation_is_repeatable() {
        let mut genome = layered();
        let first = genome.activate(&[0.3]).unwrap();
        genome.flush_node_values();
        let second = genome.activate(&[0.3]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.classification, vec![1.0]);
    }

    #[test]
    fn activation_stops_once_outputs_fire() {
        let mut genome = layered();
        genome.flush_node_values();
        genome.activate(&[0.3]).unwrap();
        // The output fires in the first round, while the hidden
        // node still holds its flushed value: 0.5 * 0.3 + 1.0 * 0.
        assert_abs_diff_eq!(genome.nodes[2].node_value(), 0.15, epsilon = 1e-6);
        assert_eq!(genome.nodes[2].activation_count(), 1);

        // 0.5 * 0.3 + relu(2.0 * 0.3)
        genome.activate(&[0.3]).unwrap();
        assert_abs_diff_eq!(genome.nodes[2].node_value(), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn disabled_connections_are_ignored() {
        let mut genome = layered();
        genome.connection_mut(5).unwrap().set_enabled(false);
        genome.activate(&[0.3]).unwrap();
        assert_abs_diff_eq!(genome.nodes[2].node_value(), 0.15, epsilon = 1e-6);
    }

    #[test]
    fn unreachable_output_is_defect() {
        let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(1, 2));
        genome.add_connection(0, 0, 2, 1.0, false).unwrap();
        assert_eq!(
            genome.activate(&[1.0]),
            Err(NetworkError::DefectNetwork {
                rounds: MAX_ACTIVATION_ROUNDS
            })
        );
    }

    #[test]
    fn recurrent_connections_lag_one_step() {
        // Output 2 feeds itself back.
        let mut genome = NNGenome::unconnected(&GeneticConfig {
            classification_activation: ActivationFunction::None,
            ..GeneticConfig::with_shape(1, 1)
        });
        genome.add_connection(0, 0, 2, 1.0, false).unwrap();
        genome.add_connection(3, 2, 2, 1.0, true).unwrap();
        assert!(genome.is_recurrent());

        genome.activate(&[1.0]).unwrap();
        assert_eq!(genome.nodes[2].activation_value(), 1.0);
        genome.activate(&[1.0]).unwrap();
        assert_eq!(genome.nodes[2].activation_value(), 2.0);
        genome.activate(&[1.0]).unwrap();
        assert_eq!(genome.nodes[2].activation_value(), 3.0);

        genome.flush_node_values();
        genome.activate(&[1.0]).unwrap();
        assert_eq!(genome.nodes[2].activation_value(), 1.0);
    }

    #[test]
    fn regression_outputs_are_not_normalized() {
        use crate::genomics::{ActionSpec, ParameterSpec};
        let config = GeneticConfig {
            actions: vec![ActionSpec {
                name: "wait".into(),
                parameters: vec![ParameterSpec {
                    name: "seconds".into(),
                    activation: ActivationFunction::None,
                }],
            }],
            ..GeneticConfig::with_shape(1, 0)
        };
        // 0 input, 1 bias, 2 classification, 3 regression.
        let mut genome = NNGenome::unconnected(&config);
        genome.add_connection(0, 0, 2, 1.0, false).unwrap();
        genome.add_connection(1, 0, 3, 3.0, false).unwrap();
        genome.add_connection(3, 1, 3, 1.0, false).unwrap();
        let output = genome.activate(&[2.0]).unwrap();
        assert_eq!(output.classification, vec![1.0]);
        assert_eq!(output.regression, vec![7.0]);
    }

    #[test]
    fn softmax_handles_large_scores() {
        let distribution = softmax(&[1000.0, 1000.0]);
        assert_eq!(distribution, vec![0.5, 0.5]);
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn recurrent_networks_skip_stabilization() {
        let mut genome = layered();
        genome.add_connection(6, 2, 3, 1.0, true).unwrap();
        assert_eq!(genome.stabilized_counter(100), 190);
        genome.connection_mut(6).unwrap().set_enabled(false);
        // The hidden node reaches the output on the second activation.
        assert_eq!(genome.stabilized_counter(100), 2);
        assert!(!genome.is_recurrent());
    }

    #[test]
    fn recurrent_path_search_is_bounded() {
        let mut genome = layered();
        // 0 -> 3 exists, so 3 -> 0 closes a cycle two levels away.
        assert!(genome.is_recurrent_path(3, 0, 5));
        assert!(!genome.is_recurrent_path(3, 0, 0));
        assert!(!genome.is_recurrent_path(0, 3, 5));
    }
}
