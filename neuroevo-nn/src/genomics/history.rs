use crate::genomics::GeneticConfig;
use crate::Innovation;

use ahash::RandomState;
use neuroevo::InnovationHistory;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// A `History` keeps track of connection and node innovations
/// in a population, in order to make sure identical mutations
/// within a generation are assigned the same innovation numbers.
///
/// For connection innovations the endpoints and the recurrence
/// of the connection identify identical mutations.
///
/// For node innovations the split connection identifies
/// identical mutations, and the innovation numbers for the
/// corresponding incoming connection, new node, and outgoing
/// connection are recorded, in that order.
///
/// Counters are never rewound, so numbers are not reused
/// across generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    sensor_count: usize,
    output_count: usize,
    next_connection_innovation: Innovation,
    next_node_id: Innovation,
    connection_innovations: HashMap<(Innovation, Innovation, bool), Innovation, RandomState>,
    node_innovations: HashMap<Innovation, (Innovation, Innovation, Innovation), RandomState>,
}

impl InnovationHistory for History {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> History {
        Self::new(config)
    }

    fn new_generation(&mut self) {
        self.connection_innovations.clear();
        self.node_innovations.clear();
    }
}

impl History {
    /// Creates a new History using the specified configuration.
    ///
    /// Feed-forward connections from a sensor `s` to an output `o`
    /// are permanently given the innovation number
    /// `(o - sensor_count) + s ⨯ output_count`, so the first number
    /// handed out for other connections is `sensor_count ⨯ output_count`.
    /// Likewise, sensor and output nodes take ids
    /// `0..sensor_count + output_count`.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, History};
    ///
    /// // 2 inputs and a bias, 2 outputs.
    /// let history = History::new(&GeneticConfig::with_shape(2, 2));
    ///
    /// assert_eq!(history.max_innovation(), Some(5));
    /// assert_eq!(history.max_node_id(), Some(4));
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let sensor_count = config.sensor_count();
        let output_count = config.output_count();
        History {
            sensor_count,
            output_count,
            next_connection_innovation: sensor_count * output_count,
            next_node_id: sensor_count + output_count,
            connection_innovations: HashMap::default(),
            node_innovations: HashMap::default(),
        }
    }

    /// Returns the preassigned innovation number of
    /// a feed-forward sensor to output connection.
    fn initial_innovation(&self, source: Innovation, target: Innovation) -> Option<Innovation> {
        let outputs = self.sensor_count..self.sensor_count + self.output_count;
        if source < self.sensor_count && outputs.contains(&target) {
            Some((target - self.sensor_count) + source * self.output_count)
        } else {
            None
        }
    }

    /// Returns the next connection innovation number, or the
    /// number previously assigned to the same connection mutation.
    pub(crate) fn next_connection_innovation(
        &self,
        source: Innovation,
        target: Innovation,
        recurrent: bool,
    ) -> Innovation {
        if !recurrent {
            if let Some(innovation) = self.initial_innovation(source, target) {
                return innovation;
            }
        }
        *self
            .connection_innovations
            .get(&(source, target, recurrent))
            .unwrap_or(&self.next_connection_innovation)
    }

    /// Records a connection mutation, if it is new.
    pub(crate) fn add_connection_innovation(
        &mut self,
        source: Innovation,
        target: Innovation,
        recurrent: bool,
    ) {
        if !recurrent && self.initial_innovation(source, target).is_some() {
            return;
        }
        if let Entry::Vacant(entry) = self.connection_innovations.entry((source, target, recurrent))
        {
            entry.insert(self.next_connection_innovation);
            self.next_connection_innovation += 1;
        }
    }

    /// Returns the next node and connection innovation numbers,
    /// or the numbers previously assigned to the same node mutation,
    /// in the format `(incoming connection, new node, outgoing connection)`.
    ///
    /// If `duplicate` is `true`, the returned numbers are computed
    /// as if the mutation were new. This is used when the mutating
    /// genome already split the same connection in an earlier
    /// mutation, which can be detected by the genome already
    /// containing the node returned with `duplicate` set to `false`.
    pub(crate) fn next_node_innovation(
        &self,
        split_connection: Innovation,
        duplicate: bool,
    ) -> (Innovation, Innovation, Innovation) {
        match self.node_innovations.get(&split_connection) {
            Some(record) if !duplicate => *record,
            _ => (
                self.next_connection_innovation,
                self.next_node_id,
                self.next_connection_innovation + 1,
            ),
        }
    }

    /// Records a node mutation splitting the connection
    /// `source -> target`, if the mutation is new or `duplicate`
    /// is `true`. In the latter case the new numbers replace
    /// the recorded ones.
    pub(crate) fn add_node_innovation(
        &mut self,
        split_connection: Innovation,
        (source, target): (Innovation, Innovation),
        recurrent: bool,
        duplicate: bool,
    ) {
        if self.node_innovations.contains_key(&split_connection) && !duplicate {
            return;
        }
        let new_node = self.next_node_id;
        self.next_node_id += 1;

        let incoming = self.next_connection_innovation;
        self.connection_innovations
            .insert((source, new_node, recurrent), incoming);
        let outgoing = incoming + 1;
        self.connection_innovations
            .insert((new_node, target, false), outgoing);
        self.next_connection_innovation += 2;

        self.node_innovations
            .insert(split_connection, (incoming, new_node, outgoing));
    }

    /// Returns the highest connection innovation number
    /// generated, or `None` if no connections are possible.
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.next_connection_innovation.checked_sub(1)
    }

    /// Returns the highest node id generated.
    pub fn max_node_id(&self) -> Option<Innovation> {
        self.next_node_id.checked_sub(1)
    }

    /// Returns an iterator over this generation's connection
    /// innovations, in the format `((source, target, recurrent), innovation)`.
    /// Preassigned sensor to output innovations are not listed.
    /// No ordering is guaranteed.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::with_shape(2, 1);
    /// let mut history = History::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(7);
    /// let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
    ///
    /// // Add mutations to the history through genome mutation.
    /// genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
    ///
    /// for ((source, target, recurrent), innovation) in history.connection_innovations() {
    ///     println!("connection {} from node {} to node {} (recurrent: {})",
    ///         innovation, source, target, recurrent);
    /// }
    /// assert_eq!(history.connection_innovations().count(), 2);
    /// ```
    pub fn connection_innovations(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation, bool), &Innovation)> {
        self.connection_innovations.iter()
    }

    /// Returns an iterator over this generation's node innovations,
    /// in the format `(split connection, (incoming connection, new node,
    /// outgoing connection))`. No ordering is guaranteed.
    pub fn node_innovations(
        &self,
    ) -> impl Iterator<Item = (&Innovation, &(Innovation, Innovation, Innovation))> {
        self.node_innovations.iter()
    }
}
