//! Genomes, their genes, and the operators that
//! vary them: generation, mutation, crossover and
//! genetic distance.
mod config;
mod crossover;
mod errors;
mod genes;
mod history;
mod mutation;
mod nodes;

pub use config::{ActionSpec, FeatureGroup, FeatureKey, GeneticConfig, InitialTopology, ParameterSpec};
pub use errors::{GenomeError, MutationError};
pub use genes::ConnectionGene;
pub use history::History;
pub use nodes::{ActivationFunction, NodeGene, NodeKind};

use crate::networks::Topology;
use crate::Innovation;

use neuroevo::Genome;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fmt;

/// A neural network genome: a set of nodes and the
/// weighted connections between them.
///
/// Nodes are kept sorted by id and connections by innovation
/// number, so genomes can be aligned gene by gene. The network
/// derived from the genes for activation is rebuilt lazily
/// after every structural change.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "GenomeRecord")]
pub struct NNGenome {
    pub(crate) nodes: Vec<NodeGene>,
    pub(crate) connections: Vec<ConnectionGene>,
    fitness: f32,
    pub(crate) recurrent: bool,
    #[serde(skip)]
    pub(crate) topology: Option<Topology>,
}

/// The serialized form of a genome, restored
/// into sorted order on load.
#[derive(Deserialize)]
struct GenomeRecord {
    nodes: Vec<NodeGene>,
    connections: Vec<ConnectionGene>,
    fitness: f32,
    recurrent: bool,
}

impl From<GenomeRecord> for NNGenome {
    fn from(record: GenomeRecord) -> NNGenome {
        let mut genome = NNGenome {
            nodes: record.nodes,
            connections: record.connections,
            fitness: record.fitness,
            recurrent: record.recurrent,
            topology: None,
        };
        genome.nodes.sort_by_key(|n| n.id());
        genome.connections.sort_by_key(|c| c.innovation());
        for node in &mut genome.nodes {
            node.reset();
        }
        genome
    }
}

impl Genome for NNGenome {
    type Config = GeneticConfig;
    type InnovationHistory = History;

    fn new<R: Rng + ?Sized>(config: &GeneticConfig, history: &mut History, rng: &mut R) -> Self {
        NNGenome::generate(config, history, rng)
    }

    fn genetic_distance(first: &Self, second: &Self, config: &GeneticConfig) -> f32 {
        NNGenome::compatibility_distance(first, second, config)
    }

    fn mate<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        _history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        crossover::crossover(parent1, parent2, config, rng).map_err(|e| e.into())
    }

    fn mutate<R: Rng + ?Sized>(
        &mut self,
        population_champion: bool,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        mutation::mutate(self, population_champion, history, config, rng)
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }
}

impl NNGenome {
    /// Returns a genome holding the sensor and output nodes
    /// described by `config`, without any connections.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome, NodeKind};
    ///
    /// let genome = NNGenome::unconnected(&GeneticConfig::with_shape(3, 2));
    ///
    /// // 3 inputs, a bias and 2 classification outputs.
    /// assert_eq!(genome.nodes().count(), 3 + 1 + 2);
    /// assert_eq!(genome.nodes().filter(|n| n.kind() == NodeKind::Bias).count(), 1);
    /// assert_eq!(genome.connections().count(), 0);
    /// ```
    pub fn unconnected(config: &GeneticConfig) -> NNGenome {
        let nodes = config
            .node_layout()
            .into_iter()
            .enumerate()
            .map(|(id, (kind, activation))| {
                let mut node = NodeGene::new(id, kind, activation);
                node.reset();
                node
            })
            .collect();
        NNGenome {
            nodes,
            connections: vec![],
            fitness: 0.0,
            recurrent: false,
            topology: None,
        }
    }

    /// Generates a fresh genome, wired according to
    /// the configured [`InitialTopology`], with weights drawn
    /// uniformly from `±initial_weight_range`.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::with_shape(3, 2);
    /// let mut history = History::new(&config);
    /// let genome = NNGenome::generate(&config, &mut history, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// // Fully connected by default: every input and the bias reach every output.
    /// assert_eq!(genome.connections().count(), (3 + 1) * 2);
    /// assert!(genome.connections().all(|c| c.weight().abs() <= config.initial_weight_range));
    /// ```
    pub fn generate<R: Rng + ?Sized>(
        config: &GeneticConfig,
        history: &mut History,
        rng: &mut R,
    ) -> NNGenome {
        let mut genome = Self::unconnected(config);
        let sensors = Self::initially_connected_sensors(config, rng);
        let outputs: Vec<Innovation> = genome
            .nodes
            .iter()
            .filter(|n| n.kind().is_output())
            .map(|n| n.id())
            .collect();

        for &source in &sensors {
            for &target in &outputs {
                let innovation = history.next_connection_innovation(source, target, false);
                history.add_connection_innovation(source, target, false);
                let range = config.initial_weight_range;
                let weight = rng.gen_range(-range..=range);
                genome.insert_connection(ConnectionGene::new(innovation, source, target, weight, false));
            }
        }
        genome
    }

    /// Returns the ids of the sensors wired to every
    /// output in a freshly generated genome.
    fn initially_connected_sensors<R: Rng + ?Sized>(
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Vec<Innovation> {
        match config.initial_topology {
            InitialTopology::FullyConnected => (0..config.sensor_count()).collect(),
            InitialTopology::Sparse { input_rate } => {
                let mut group_ids = Vec::with_capacity(config.feature_groups.len());
                let mut next_id = 0;
                for group in &config.feature_groups {
                    group_ids.push(next_id..next_id + group.features.len());
                    next_id += group.features.len();
                }
                let mut remaining: Vec<usize> = (0..group_ids.len()).collect();
                let mut sensors = vec![];
                loop {
                    let Some(&group) = remaining.choose(rng) else {
                        break;
                    };
                    remaining.retain(|g| *g != group);
                    sensors.extend(group_ids[group].clone());
                    if rng.gen::<f32>() >= input_rate {
                        break;
                    }
                }
                sensors.sort_unstable();
                sensors
            }
        }
    }

    /// Adds a new hidden node to the genome.
    /// Returns a reference to the newly created node.
    ///
    /// # Errors
    ///
    /// Returns an error if a node with the same id
    /// already exists in the genome.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{ActivationFunction, GeneticConfig, NNGenome, NodeKind};
    ///
    /// let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(2, 1));
    ///
    /// let node = genome.add_node(42, ActivationFunction::Relu).unwrap();
    /// assert_eq!(node.kind(), NodeKind::Hidden);
    ///
    /// assert!(genome.add_node(42, ActivationFunction::Sigmoid).is_err());
    /// assert!(genome.add_node(0, ActivationFunction::Sigmoid).is_err());
    /// ```
    pub fn add_node(
        &mut self,
        id: Innovation,
        activation: ActivationFunction,
    ) -> Result<&mut NodeGene, GenomeError> {
        if self.node_index(id).is_some() {
            return Err(GenomeError::DuplicateNodeId(id));
        }
        let index = self.insert_node(NodeGene::new(id, NodeKind::Hidden, activation));
        Ok(&mut self.nodes[index])
    }

    /// Adds a new, enabled connection to the genome.
    /// Returns a reference to the new connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the innovation number is already
    /// in use, if either endpoint is missing, if the target
    /// is a sensor, or if a connection of the same kind
    /// already links the same endpoints.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{ActivationFunction, GeneticConfig, NNGenome};
    ///
    /// // Nodes 0 and 1 are inputs, 2 the bias and 3 the output.
    /// let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(2, 1));
    /// genome.add_node(4, ActivationFunction::Sigmoid).unwrap();
    ///
    /// genome.add_connection(10, 0, 4, 1.5, false).unwrap();
    /// genome.add_connection(11, 4, 3, -0.5, false).unwrap();
    /// // A self-loop must be recurrent to be activated.
    /// genome.add_connection(12, 4, 4, 0.5, true).unwrap();
    ///
    /// assert!(genome.add_connection(10, 1, 4, 1.0, false).is_err());
    /// assert!(genome.add_connection(13, 0, 4, 1.0, false).is_err());
    /// assert!(genome.add_connection(13, 4, 0, 1.0, false).is_err());
    /// assert!(genome.add_connection(13, 9, 3, 1.0, false).is_err());
    ///
    /// assert_eq!(genome.connections().count(), 3);
    /// ```
    pub fn add_connection(
        &mut self,
        innovation: Innovation,
        source: Innovation,
        target: Innovation,
        weight: f32,
        recurrent: bool,
    ) -> Result<&mut ConnectionGene, GenomeError> {
        self.check_connection_viability(innovation, source, target, recurrent)?;
        let index =
            self.insert_connection(ConnectionGene::new(innovation, source, target, weight, recurrent));
        if recurrent {
            self.recurrent = true;
        }
        Ok(&mut self.connections[index])
    }

    /// Checks whether a connection is a duplicate
    /// or is invalid for the genome.
    fn check_connection_viability(
        &self,
        innovation: Innovation,
        source: Innovation,
        target: Innovation,
        recurrent: bool,
    ) -> Result<(), GenomeError> {
        use GenomeError::*;
        if self.connection_index(innovation).is_some() {
            Err(DuplicateInnovation(innovation))
        } else if self.node_index(source).is_none() {
            Err(NonexistentEndpoints(source, target))
        } else if let Some(target_node) = self.node(target) {
            if target_node.kind().is_sensor() {
                Err(SensorTarget(target))
            } else if self.has_connection(source, target, recurrent) {
                Err(DuplicateConnection(innovation, source, target))
            } else {
                Ok(())
            }
        } else {
            Err(NonexistentEndpoints(source, target))
        }
    }

    /// Inserts a node at its sorted position and
    /// returns its index. Assumes the id is unused.
    pub(crate) fn insert_node(&mut self, node: NodeGene) -> usize {
        let index = self.nodes.partition_point(|n| n.id() < node.id());
        self.nodes.insert(index, node);
        self.topology = None;
        index
    }

    /// Inserts a connection at its sorted position and returns
    /// its index. Assumes the connection is viable.
    pub(crate) fn insert_connection(&mut self, connection: ConnectionGene) -> usize {
        let index = self
            .connections
            .partition_point(|c| c.innovation() < connection.innovation());
        self.connections.insert(index, connection);
        self.topology = None;
        index
    }

    /// Returns whether a connection of the given
    /// kind already links `source` to `target`.
    pub(crate) fn has_connection(&self, source: Innovation, target: Innovation, recurrent: bool) -> bool {
        self.connections
            .iter()
            .any(|c| c.signature() == (source, target, recurrent))
    }

    pub(crate) fn node_index(&self, id: Innovation) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |n| n.id()).ok()
    }

    pub(crate) fn connection_index(&self, innovation: Innovation) -> Option<usize> {
        self.connections
            .binary_search_by_key(&innovation, |c| c.innovation())
            .ok()
    }

    /// Returns the node with the given id, if present.
    pub fn node(&self, id: Innovation) -> Option<&NodeGene> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    /// Returns the connection with the given
    /// innovation number, if present.
    pub fn connection(&self, innovation: Innovation) -> Option<&ConnectionGene> {
        self.connection_index(innovation).map(|i| &self.connections[i])
    }

    /// Returns a mutable reference to the connection with
    /// the given innovation number, if present.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::with_shape(1, 1);
    /// let mut history = History::new(&config);
    /// let mut genome = NNGenome::generate(&config, &mut history, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// genome.connection_mut(0).unwrap().set_weight(3.0);
    /// assert_eq!(genome.connection(0).unwrap().weight(), 3.0);
    /// ```
    pub fn connection_mut(&mut self, innovation: Innovation) -> Option<&mut ConnectionGene> {
        let index = self.connection_index(innovation)?;
        self.topology = None;
        Some(&mut self.connections[index])
    }

    /// Returns an iterator over the genome's nodes, sorted by id.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.iter()
    }

    /// Returns an iterator over the genome's connections,
    /// sorted by innovation number.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.iter()
    }

    /// Returns the ids and kinds of the sensor and output nodes,
    /// which identify the task a genome was generated for.
    pub(crate) fn shape(&self) -> impl Iterator<Item = (Innovation, NodeKind)> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.kind().is_sensor() || n.kind().is_output())
            .map(|n| (n.id(), n.kind()))
    }

    /// Calculates the _compatibility distance_ between two genomes,
    /// weighting gene differences as specified in `config`.
    ///
    /// Connection lists are walked in innovation order, one step
    /// per gene of the longer genome. Genes met after either list
    /// is exhausted are excess, unmatched genes before that are
    /// disjoint. The weight term is the average weight difference
    /// of matching genes, and is omitted if there are none.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{ActivationFunction, GeneticConfig, NNGenome};
    ///
    /// // Completely arbitrary quantities.
    /// let config = GeneticConfig {
    ///     excess_coefficient: 1.5,
    ///     disjoint_coefficient: 0.5,
    ///     weight_coefficient: 0.25,
    ///     ..GeneticConfig::with_shape(2, 1)
    /// };
    ///
    /// let mut genome1 = NNGenome::unconnected(&config);
    /// let mut genome2 = NNGenome::unconnected(&config);
    /// genome1.add_node(4, ActivationFunction::Sigmoid).unwrap();
    /// genome2.add_node(4, ActivationFunction::Sigmoid).unwrap();
    ///
    /// // Matching gene, weight difference of 2.0.
    /// genome1.add_connection(0, 0, 3, 1.0, false).unwrap();
    /// genome2.add_connection(0, 0, 3, -1.0, false).unwrap();
    ///
    /// // Matching gene, weight difference of 0.0.
    /// genome1.add_connection(5, 4, 3, 1.0, false).unwrap();
    /// genome2.add_connection(5, 4, 3, 1.0, false).unwrap();
    ///
    /// // Excess gene.
    /// genome1.add_connection(6, 0, 4, 3.0, false).unwrap();
    ///
    /// assert_eq!(
    ///     NNGenome::compatibility_distance(&genome1, &genome2, &config),
    ///     1.5 * 1.0 + 0.25 * (2.0 + 0.0) / 2.0
    /// );
    ///
    /// // Disjoint genes use up steps of the walk,
    /// // so gene 6 is no longer reached.
    /// genome1.add_connection(3, 1, 3, 3.0, false).unwrap();
    /// genome2.add_connection(4, 1, 4, 1.0, false).unwrap();
    /// assert_eq!(
    ///     NNGenome::compatibility_distance(&genome1, &genome2, &config),
    ///     0.5 * 2.0 + 0.25 * (2.0 + 0.0) / 2.0
    /// );
    /// ```
    pub fn compatibility_distance(first: &NNGenome, second: &NNGenome, config: &GeneticConfig) -> f32 {
        let (genes1, genes2) = (&first.connections, &second.connections);
        let (mut i1, mut i2) = (0, 0);
        let (mut excess, mut disjoint, mut matching) = (0usize, 0usize, 0usize);
        let mut weight_difference = 0.0;

        for _ in 0..genes1.len().max(genes2.len()) {
            if i1 >= genes1.len() {
                excess += 1;
                i2 += 1;
            } else if i2 >= genes2.len() {
                excess += 1;
                i1 += 1;
            } else {
                let (gene1, gene2) = (&genes1[i1], &genes2[i2]);
                match gene1.innovation().cmp(&gene2.innovation()) {
                    std::cmp::Ordering::Equal => {
                        matching += 1;
                        weight_difference += (gene1.weight() - gene2.weight()).abs();
                        i1 += 1;
                        i2 += 1;
                    }
                    std::cmp::Ordering::Less => {
                        disjoint += 1;
                        i1 += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        disjoint += 1;
                        i2 += 1;
                    }
                }
            }
        }

        let structural = config.disjoint_coefficient * disjoint as f32
            + config.excess_coefficient * excess as f32;
        if matching == 0 {
            structural
        } else {
            structural + config.weight_coefficient * (weight_difference / matching as f32)
        }
    }
}

impl fmt::Display for NNGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connections: Vec<String> = self.connections.iter().map(|c| c.to_string()).collect();
        let nodes: Vec<String> = self.nodes.iter().map(|n| n.to_string()).collect();
        f.debug_struct("NNGenome")
            .field("Connections", &connections)
            .field("Nodes", &nodes)
            .field("Fitness", &self.fitness)
            .field("Recurrent", &self.recurrent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sparse_config(input_rate: f32) -> GeneticConfig {
        GeneticConfig {
            feature_groups: (0..4)
                .map(|g| FeatureGroup {
                    name: format!("sprite{}", g),
                    features: vec!["x".into(), "y".into()],
                })
                .collect(),
            initial_topology: InitialTopology::Sparse { input_rate },
            ..GeneticConfig::with_shape(0, 3)
        }
    }

    #[test]
    fn new_fully_connected() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for input_count in 1..8 {
            for output_count in 1..8 {
                let config = GeneticConfig::with_shape(input_count, output_count);
                let mut history = History::new(&config);
                let genome = NNGenome::generate(&config, &mut history, &mut rng);
                let sensor_count = input_count + 1;

                assert_eq!(genome.connections.len(), sensor_count * output_count);
                assert_eq!(genome.nodes.len(), sensor_count + output_count);
                assert_eq!(
                    genome
                        .nodes()
                        .filter(|n| matches!(n.kind(), NodeKind::Input { .. })
                            && n.activation_function() == ActivationFunction::None)
                        .count(),
                    input_count
                );
                for c in genome.connections() {
                    assert_eq!(
                        c.innovation(),
                        c.source() * output_count + (c.target() - sensor_count),
                        "connection: {}, total I/O, {}/{}",
                        c,
                        input_count,
                        output_count
                    );
                    assert!(c.enabled() && !c.recurrent());
                }
                assert!(genome
                    .connections
                    .windows(2)
                    .all(|w| w[0].innovation() < w[1].innovation()));
            }
        }
    }

    #[test]
    fn new_sparse_connects_whole_groups_without_bias() {
        let config = sparse_config(0.0);
        let mut history = History::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            let genome = NNGenome::generate(&config, &mut history, &mut rng);
            // One group of two features, to each of the three outputs.
            assert_eq!(genome.connections().count(), 2 * 3);
            assert!(genome.connections().all(|c| c.source() != 8));
            let sources: Vec<_> = genome.connections().map(|c| c.source()).collect();
            assert!(sources.iter().all(|s| s / 2 == sources[0] / 2));
        }
    }

    #[test]
    fn new_sparse_with_certain_rate_connects_every_group() {
        let config = sparse_config(1.0);
        let mut history = History::new(&config);
        let genome = NNGenome::generate(&config, &mut history, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(genome.connections().count(), 8 * 3);
        // The full node set exists regardless of wiring.
        assert_eq!(genome.nodes().count(), 8 + 1 + 3);
    }

    #[test]
    fn add_connection_rejects_shadowing() {
        let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(1, 1));
        genome.add_connection(0, 0, 2, 1.0, false).unwrap();
        assert_eq!(
            genome.add_connection(5, 0, 2, 2.0, false).unwrap_err(),
            GenomeError::DuplicateConnection(5, 0, 2)
        );
        assert!(genome.add_connection(5, 0, 2, 2.0, true).is_ok());
        assert!(genome.recurrent);
        assert_eq!(
            genome.add_connection(6, 2, 1, 2.0, false).unwrap_err(),
            GenomeError::SensorTarget(1)
        );
    }

    #[test]
    fn connections_stay_sorted() {
        let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(2, 2));
        genome.add_connection(9, 0, 3, 1.0, false).unwrap();
        genome.add_connection(2, 1, 3, 1.0, false).unwrap();
        genome.add_connection(5, 2, 4, 1.0, false).unwrap();
        let innovations: Vec<_> = genome.connections().map(|c| c.innovation()).collect();
        assert_eq!(innovations, vec![2, 5, 9]);
    }

    #[test]
    fn serialization_restores_order() {
        let config = GeneticConfig::with_shape(2, 2);
        let mut history = History::new(&config);
        let mut genome = NNGenome::generate(&config, &mut history, &mut ChaCha8Rng::seed_from_u64(1));
        genome.set_fitness(2.5);
        let mut json: serde_json::Value = serde_json::to_value(&genome).unwrap();
        json["connections"].as_array_mut().unwrap().reverse();

        let restored: NNGenome = serde_json::from_value(json).unwrap();
        assert_eq!(restored.fitness(), 2.5);
        assert_eq!(
            restored.connections().map(|c| c.innovation()).collect::<Vec<_>>(),
            genome.connections().map(|c| c.innovation()).collect::<Vec<_>>()
        );
        assert_eq!(restored.node(2).unwrap().activation_value(), 1.0);
    }

    #[test]
    fn walk_is_bounded_by_longer_genome() {
        let config = GeneticConfig {
            excess_coefficient: 10.0,
            ..GeneticConfig::with_shape(3, 1)
        };
        let mut first = NNGenome::unconnected(&config);
        let mut second = NNGenome::unconnected(&config);
        first.add_connection(0, 0, 4, 1.0, false).unwrap();
        first.add_connection(2, 2, 4, 1.0, false).unwrap();
        second.add_connection(1, 1, 4, 1.0, false).unwrap();
        second.add_connection(3, 3, 4, 1.0, false).unwrap();
        // Two steps: 0 and 1 are disjoint, 3 is never reached.
        assert_eq!(NNGenome::compatibility_distance(&first, &second, &config), 2.0);
        assert_eq!(NNGenome::compatibility_distance(&second, &first, &config), 2.0);

        // Same genes plus a newer one: a single excess gene.
        let mut extended = first.clone();
        extended.add_connection(5, 1, 4, 1.0, false).unwrap();
        assert_eq!(NNGenome::compatibility_distance(&first, &extended, &config), 10.0);
        assert_eq!(NNGenome::compatibility_distance(&extended, &first, &config), 10.0);
    }

    #[test]
    fn empty_genomes_are_identical() {
        let config = GeneticConfig::with_shape(1, 1);
        let genome = NNGenome::unconnected(&config);
        assert_eq!(NNGenome::compatibility_distance(&genome, &genome, &config), 0.0);
    }
}
