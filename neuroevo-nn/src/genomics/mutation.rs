use super::{ConnectionGene, GeneticConfig, History, MutationError, NNGenome, NodeGene, NodeKind};
use crate::Innovation;

use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws made for an enabled, non-bias connection to split.
const SPLIT_ATTEMPTS: usize = 20;

/// Relative weight of all connection-level weight mutations.
const WEIGHT_MUTATION_RATE: f32 = 1.0;

/// Share of recurrent attempts that look for a self-loop.
const LOOP_CHANCE: f32 = 0.25;

/// Applies either one structural mutation or a bundle of
/// non-structural ones. Population champions only ever
/// gain a connection or have their weights mutated.
pub(super) fn mutate<R: Rng + ?Sized>(
    genome: &mut NNGenome,
    population_champion: bool,
    history: &mut History,
    config: &GeneticConfig,
    rng: &mut R,
) {
    if population_champion {
        if rng.gen::<f32>() <= config.population_champion_connection_mutation {
            log_failure(genome.mutate_add_connection(history, config, rng));
        } else {
            genome.mutate_weights(config, rng);
        }
    } else if rng.gen::<f32>() < config.add_node_chance {
        log_failure(genome.mutate_add_node(history, config, rng));
    } else if rng.gen::<f32>() < config.add_connection_chance {
        log_failure(genome.mutate_add_connection(history, config, rng));
    } else {
        if rng.gen::<f32>() < config.mutate_weights_chance {
            genome.mutate_weights(config, rng);
        }
        if rng.gen::<f32>() < config.toggle_enable_chance {
            genome.mutate_toggle_enable(config.toggle_enable_times, rng);
        }
        if rng.gen::<f32>() < config.reenable_chance {
            genome.mutate_reenable();
        }
    }
}

fn log_failure<T>(result: Result<T, MutationError>) {
    if let Err(e) = result {
        trace!("structural mutation skipped: {}", e);
    }
}

impl NNGenome {
    /// Induces a _weight mutation_ in the genome.
    ///
    /// A "severe" mutation is chosen with even odds for the whole
    /// genome. Each connection then draws a value `r` against a pair
    /// of thresholds: above the first, the weight is perturbed by up
    /// to `±weight_perturbation_power`; above the second only, it is
    /// replaced by such a perturbation; otherwise it is kept.
    /// Severe mutations use thresholds (0.3, 0.1). Otherwise, the
    /// last 20% of connections in genomes with at least 10 connections
    /// use (0.5, 0.3), and all others are always perturbed.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig { weight_perturbation_power: 0.5, ..GeneticConfig::with_shape(2, 2) };
    /// let mut history = History::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(3);
    /// let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
    /// let before: Vec<f32> = genome.connections().map(|c| c.weight()).collect();
    ///
    /// genome.mutate_weights(&config, &mut rng);
    ///
    /// // Perturbations, as well as replacements, are bound by the power.
    /// for (old, new) in before.iter().zip(genome.connections().map(|c| c.weight())) {
    ///     assert!((new - old).abs() <= 0.5 || new.abs() <= 0.5);
    /// }
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        let rate = WEIGHT_MUTATION_RATE;
        let power = config.weight_perturbation_power;
        let severe = rng.gen::<f32>() > 0.5;
        let count = self.connections.len();
        let tail_start = count as f32 * 0.8;

        for (position, connection) in self.connections.iter_mut().enumerate() {
            let (gauss_point, cold_gauss_point) = if severe {
                (0.3, 0.1)
            } else if count >= 10 && position as f32 > tail_start {
                (0.5, 0.3)
            } else if rng.gen::<f32>() > 0.5 {
                (1.0 - rate, 1.0 - rate - 0.1)
            } else {
                (1.0 - rate, 1.0 - rate)
            };

            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            let modification = sign * rng.gen::<f32>() * power;
            let r = rng.gen::<f32>();
            if r > gauss_point {
                connection.set_weight(connection.weight() + modification);
            } else if r > cold_gauss_point {
                connection.set_weight(modification);
            }
        }
    }

    /// Induces a _connection addition mutation_ in the genome.
    ///
    /// Whether to look for a recurrent connection is decided up
    /// front, and a quarter of recurrent attempts look for a self-loop
    /// on a hidden node. Outputs never loop onto themselves.
    /// Node pairs are drawn until one is found that is not already
    /// connected by a connection of the same kind, and whose
    /// recurrence matches the attempt. The new connection
    /// has a weight in `±new_connection_weight_range`.
    ///
    /// # Errors
    /// Returns an error if no viable pair was found in
    /// `add_connection_attempts` draws.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig { recurrent_connection_chance: 1.0, ..GeneticConfig::with_shape(2, 1) };
    /// let mut history = History::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
    ///
    /// let connection = genome.mutate_add_connection(&mut history, &config, &mut rng).unwrap();
    /// assert!(connection.recurrent());
    /// assert!(genome.is_recurrent());
    /// ```
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<&ConnectionGene, MutationError> {
        let attempts = config.add_connection_attempts;
        let (source, target, recurrent) = self
            .find_connectable_pair(attempts, config.recurrent_connection_chance, rng)
            .ok_or(MutationError::ConnectionAttemptsExhausted(attempts))?;

        let innovation = history.next_connection_innovation(source, target, recurrent);
        history.add_connection_innovation(source, target, recurrent);
        let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        let weight = sign * rng.gen::<f32>() * config.new_connection_weight_range;
        let index =
            self.insert_connection(ConnectionGene::new(innovation, source, target, weight, recurrent));
        if recurrent {
            self.recurrent = true;
        }
        Ok(&self.connections[index])
    }

    fn find_connectable_pair<R: Rng + ?Sized>(
        &mut self,
        attempts: usize,
        recurrent_chance: f32,
        rng: &mut R,
    ) -> Option<(Innovation, Innovation, bool)> {
        let all: Vec<Innovation> = self.nodes.iter().map(|n| n.id()).collect();
        let targets: Vec<Innovation> = self
            .nodes
            .iter()
            .filter(|n| !n.kind().is_sensor())
            .map(|n| n.id())
            .collect();
        let hidden: Vec<Innovation> = self
            .nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::Hidden)
            .map(|n| n.id())
            .collect();
        let threshold = all.len() * all.len();
        let recurrent = rng.gen::<f32>() < recurrent_chance;

        for _ in 0..attempts {
            let looped = recurrent && !hidden.is_empty() && rng.gen::<f32>() < LOOP_CHANCE;
            let (source, target) = if looped {
                let node = *hidden.choose(rng)?;
                (node, node)
            } else {
                (*all.choose(rng)?, *targets.choose(rng)?)
            };
            if (source == target && !looped) || self.has_connection(source, target, recurrent) {
                continue;
            }
            if self.is_recurrent_path(source, target, threshold) == recurrent {
                return Some((source, target, recurrent));
            }
        }
        None
    }

    /// Induces a _node addition mutation_ in the genome.
    ///
    /// An enabled connection not leaving the bias is disabled, and
    /// replaced by a new hidden node with a connection of weight 1
    /// into it, which inherits the old connection's recurrence, and
    /// a connection out of it with the old connection's weight.
    ///
    /// Returns references to the new incoming connection,
    /// node and outgoing connection, in that order.
    ///
    /// # Errors
    /// Returns an error if no splittable connection was found
    /// in 20 draws.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::with_shape(2, 1);
    /// let mut history = History::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
    ///
    /// let (incoming, node, outgoing) = genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
    /// assert_eq!(incoming.target(), node.id());
    /// assert_eq!(outgoing.source(), node.id());
    /// assert_eq!(incoming.weight(), 1.0);
    ///
    /// // Unconnected genomes cannot be split.
    /// let mut empty = NNGenome::unconnected(&config);
    /// assert!(empty.mutate_add_node(&mut history, &config, &mut rng).is_err());
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(&ConnectionGene, &NodeGene, &ConnectionGene), MutationError> {
        let split = self
            .choose_splittable_connection(rng)
            .ok_or(MutationError::NoSplittableConnection)?;
        let split_innovation = self.connections[split].innovation();
        let (source, target) = self.connections[split].endpoints();
        let old_weight = self.connections[split].weight();
        let recurrent = self.connections[split].recurrent();

        let (mut incoming, mut new_node, mut outgoing) =
            history.next_node_innovation(split_innovation, false);
        let duplicate = self.node_index(new_node).is_some();
        if duplicate {
            (incoming, new_node, outgoing) = history.next_node_innovation(split_innovation, true);
        }
        history.add_node_innovation(split_innovation, (source, target), recurrent, duplicate);

        self.connections[split].set_enabled(false);
        let node = self.insert_node(NodeGene::new(new_node, NodeKind::Hidden, config.hidden_activation));
        // The outgoing innovation always follows the incoming one,
        // so the first index survives the second insertion.
        let incoming =
            self.insert_connection(ConnectionGene::new(incoming, source, new_node, 1.0, recurrent));
        let outgoing =
            self.insert_connection(ConnectionGene::new(outgoing, new_node, target, old_weight, false));
        self.update_recurrent();

        Ok((
            &self.connections[incoming],
            &self.nodes[node],
            &self.connections[outgoing],
        ))
    }

    fn choose_splittable_connection<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.connections.is_empty() {
            return None;
        }
        (0..SPLIT_ATTEMPTS)
            .map(|_| rng.gen_range(0..self.connections.len()))
            .find(|&i| {
                let connection = &self.connections[i];
                connection.enabled()
                    && self
                        .node(connection.source())
                        .map_or(false, |n| n.kind() != NodeKind::Bias)
            })
    }

    /// Toggles randomly chosen connections `times + 1` times.
    /// Disabled connections are re-enabled, while enabled ones are
    /// only disabled if they are recurrent or their source keeps
    /// another enabled connection.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(1, 1));
    /// genome.add_connection(0, 0, 2, 1.0, false).unwrap();
    ///
    /// // The only connection out of the input is never disabled.
    /// genome.mutate_toggle_enable(10, &mut ChaCha8Rng::seed_from_u64(0));
    /// assert!(genome.connection(0).unwrap().enabled());
    /// ```
    pub fn mutate_toggle_enable<R: Rng + ?Sized>(&mut self, times: usize, rng: &mut R) {
        if self.connections.is_empty() {
            return;
        }
        for _ in 0..=times {
            let chosen = rng.gen_range(0..self.connections.len());
            let connection = &self.connections[chosen];
            if connection.enabled() {
                let keeps_source_connected = connection.recurrent()
                    || self.connections.iter().any(|other| {
                        other.source() == connection.source()
                            && other.enabled()
                            && other.innovation() != connection.innovation()
                    });
                if keeps_source_connected {
                    self.connections[chosen].set_enabled(false);
                }
            } else {
                self.connections[chosen].set_enabled(true);
            }
        }
        self.topology = None;
        self.update_recurrent();
    }

    /// Re-enables the first disabled connection, if any,
    /// and returns its innovation number.
    pub fn mutate_reenable(&mut self) -> Option<Innovation> {
        let connection = self.connections.iter_mut().find(|c| !c.enabled())?;
        connection.set_enabled(true);
        let innovation = connection.innovation();
        self.topology = None;
        self.update_recurrent();
        Some(innovation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ActivationFunction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup(inputs: usize, outputs: usize) -> (GeneticConfig, History, ChaCha8Rng, NNGenome) {
        let config = GeneticConfig::with_shape(inputs, outputs);
        let mut history = History::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let genome = NNGenome::generate(&config, &mut history, &mut rng);
        (config, history, rng, genome)
    }

    #[test]
    fn add_node_splits_connection() {
        let (config, mut history, mut rng, mut genome) = setup(3, 2);
        for _ in 0..10 {
            let max_innovation = genome.connections().map(|c| c.innovation()).max().unwrap();
            let (node_count, connection_count) = (genome.nodes().count(), genome.connections().count());
            let disabled_before = genome.connections().filter(|c| !c.enabled()).count();

            let (incoming, node, outgoing) = genome
                .mutate_add_node(&mut history, &config, &mut rng)
                .map(|(i, n, o)| (i.clone(), n.clone(), o.clone()))
                .unwrap();

            assert_eq!(genome.nodes().count(), node_count + 1);
            assert_eq!(genome.connections().count(), connection_count + 2);
            assert_eq!(
                genome.connections().filter(|c| !c.enabled()).count(),
                disabled_before + 1
            );
            assert!(incoming.innovation() > max_innovation);
            assert!(outgoing.innovation() > max_innovation);
            assert_eq!(node.kind(), NodeKind::Hidden);
            assert_eq!(node.activation_function(), ActivationFunction::Sigmoid);

            let split = genome
                .connections()
                .find(|c| !c.enabled() && c.endpoints() == (incoming.source(), outgoing.target()))
                .unwrap();
            assert_eq!(outgoing.weight(), split.weight());
            assert_ne!(genome.node(split.source()).unwrap().kind(), NodeKind::Bias);
        }
    }

    #[test]
    fn same_split_in_a_generation_shares_innovations() {
        let (config, mut history, mut rng, genome) = setup(1, 1);
        // 0 -> 2 is the only splittable connection (1 is the bias).
        let mut first = genome.clone();
        let mut second = genome;
        let a = first
            .mutate_add_node(&mut history, &config, &mut rng)
            .map(|(i, n, o)| (i.innovation(), n.id(), o.innovation()))
            .unwrap();
        let b = second
            .mutate_add_node(&mut history, &config, &mut rng)
            .map(|(i, n, o)| (i.innovation(), n.id(), o.innovation()))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(NNGenome::compatibility_distance(&first, &second, &config), 0.0);
    }

    #[test]
    fn resplitting_in_one_genome_takes_fresh_numbers() {
        let (config, mut history, mut rng, mut genome) = setup(1, 1);
        genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        // 0 -> 2 became 0 -> 3 (innovation 2) and 3 -> 2 (innovation 3).
        // Re-enable the split connection and split it again.
        assert_eq!(genome.mutate_reenable(), Some(0));
        genome.connection_mut(2).unwrap().set_enabled(false);
        genome.connection_mut(3).unwrap().set_enabled(false);
        let node = genome
            .mutate_add_node(&mut history, &config, &mut rng)
            .map(|(_, n, _)| n.id())
            .unwrap();
        assert_eq!(node, 4);
        assert_eq!(genome.nodes().count(), 5);
    }

    #[test]
    fn add_connection_respects_recurrence() {
        let mut config = GeneticConfig::with_shape(2, 2);
        config.recurrent_connection_chance = 0.0;
        let mut history = History::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut genome = NNGenome::unconnected(&config);
        genome.add_node(5, ActivationFunction::Sigmoid).unwrap();

        for _ in 0..20 {
            let _ = genome.mutate_add_connection(&mut history, &config, &mut rng);
        }
        assert!(genome.connections().count() > 0);
        assert!(genome.connections().all(|c| !c.recurrent()));
        // Nothing leaves an output in a feed-forward network.
        assert!(genome
            .connections()
            .all(|c| !genome.node(c.source()).unwrap().kind().is_output()));
        assert!(!genome.is_recurrent());
    }

    #[test]
    fn only_hidden_nodes_loop_onto_themselves() {
        let mut config = GeneticConfig::with_shape(2, 2);
        config.recurrent_connection_chance = 1.0;
        let mut history = History::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        // Nodes 0 and 1 are inputs, 2 the bias, 3 and 4 outputs.
        let mut genome = NNGenome::unconnected(&config);
        genome.add_node(5, ActivationFunction::Sigmoid).unwrap();
        genome.add_connection(0, 0, 5, 1.0, false).unwrap();
        genome.add_connection(1, 5, 3, 1.0, false).unwrap();

        for _ in 0..40 {
            let _ = genome.mutate_add_connection(&mut history, &config, &mut rng);
        }
        let loops: Vec<_> = genome
            .connections()
            .filter(|c| c.source() == c.target())
            .map(|c| c.target())
            .collect();
        assert_eq!(loops, vec![5]);
        assert!(genome.is_recurrent());
    }

    #[test]
    fn add_connection_gives_up_on_saturated_genome() {
        let mut config = GeneticConfig::with_shape(1, 1);
        config.recurrent_connection_chance = 0.0;
        let mut history = History::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
        assert_eq!(
            genome
                .mutate_add_connection(&mut history, &config, &mut rng)
                .unwrap_err(),
            MutationError::ConnectionAttemptsExhausted(50)
        );
    }

    #[test]
    fn toggle_updates_recurrence() {
        let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(1, 1));
        genome.add_connection(0, 0, 2, 1.0, false).unwrap();
        genome.add_connection(1, 1, 2, 1.0, false).unwrap();
        genome.add_connection(7, 2, 2, 1.0, true).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..20 {
            genome.mutate_toggle_enable(0, &mut rng);
            let enabled_recurrent = genome.connection(7).unwrap().enabled();
            assert_eq!(genome.is_recurrent(), enabled_recurrent);
            // Sole connections out of a node stay enabled.
            assert!(genome.connection(0).unwrap().enabled());
            assert!(genome.connection(1).unwrap().enabled());
        }
    }

    #[test]
    fn reenable_picks_first_disabled() {
        let (_, _, _, mut genome) = setup(2, 1);
        genome.connection_mut(2).unwrap().set_enabled(false);
        genome.connection_mut(1).unwrap().set_enabled(false);
        assert_eq!(genome.mutate_reenable(), Some(1));
        assert_eq!(genome.mutate_reenable(), Some(2));
        assert_eq!(genome.mutate_reenable(), None);
    }

    #[test]
    fn champions_keep_their_nodes() {
        let (config, mut history, mut rng, genome) = setup(2, 2);
        let mut champion = genome;
        for _ in 0..50 {
            mutate(&mut champion, true, &mut history, &config, &mut rng);
        }
        assert_eq!(champion.nodes().count(), 2 + 1 + 2);
    }

    #[test]
    fn weight_schedule_leaves_structure_alone() {
        let config = GeneticConfig {
            weight_perturbation_power: 0.0,
            ..GeneticConfig::with_shape(5, 4)
        };
        let mut history = History::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
        for _ in 0..10 {
            genome.mutate_weights(&config, &mut rng);
        }
        // A zero power only ever adds or sets 0.
        assert_eq!(genome.connections().count(), 6 * 4);
        assert!(genome.connections().all(|c| c.weight().abs() <= 1.0));
    }
}
