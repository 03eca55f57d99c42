use crate::genomics::{ActivationFunction, NodeKind};

use serde::{Deserialize, Serialize};

/// A named set of input features, e.g. all
/// the observations made about one sprite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureGroup {
    pub name: String,
    pub features: Vec<String>,
}

/// A scalar parameter of an action, produced by a regression node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(default = "default_parameter_activation")]
    pub activation: ActivationFunction,
}

fn default_parameter_activation() -> ActivationFunction {
    ActivationFunction::None
}

/// A discrete action a network can select, each with
/// one classification node and one regression node
/// per parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

/// How freshly generated genomes are wired.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InitialTopology {
    /// Every input and the bias connect to every output.
    FullyConnected,
    /// A random feature group connects to every output, and further
    /// groups are added while a uniform draw is below `input_rate`.
    /// The bias starts unconnected.
    Sparse { input_rate: f32 },
}

/// Identifies an input feature by the indices of its
/// group and of the feature within the group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureKey {
    pub group: usize,
    pub feature: usize,
}

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// Missing fields take their default values
/// when deserializing.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Input features, in node order.
    pub feature_groups: Vec<FeatureGroup>,
    /// Selectable actions, in node order.
    pub actions: Vec<ActionSpec>,
    pub initial_topology: InitialTopology,
    /// Magnitude bound of initial connection weights.
    pub initial_weight_range: f32,
    /// Activation function of classification nodes.
    pub classification_activation: ActivationFunction,
    /// Activation function of nodes created by mutation.
    pub hidden_activation: ActivationFunction,

    /// Chance of a node addition mutation.
    pub add_node_chance: f32,
    /// Chance of a connection addition mutation,
    /// if no node was added.
    pub add_connection_chance: f32,
    /// Node pairs drawn before a connection addition gives up.
    pub add_connection_attempts: usize,
    /// Chance that a connection addition looks for a recurrent connection.
    pub recurrent_connection_chance: f32,
    /// Magnitude bound of the weights of added connections.
    pub new_connection_weight_range: f32,
    /// Chance that a population champion gains a connection
    /// instead of having its weights mutated.
    pub population_champion_connection_mutation: f32,
    /// Chance of a weight mutation in a non-structural mutation.
    pub mutate_weights_chance: f32,
    /// Magnitude bound of weight perturbations.
    pub weight_perturbation_power: f32,
    /// Chance of toggling connections in a non-structural mutation.
    pub toggle_enable_chance: f32,
    /// Connections toggled, minus one, when toggling.
    pub toggle_enable_times: usize,
    /// Chance of re-enabling a disabled connection
    /// in a non-structural mutation.
    pub reenable_chance: f32,

    /// Chance that matching genes have their weights
    /// averaged during crossover.
    pub weight_average_chance: f32,
    /// Chance a matching gene disabled in
    /// either parent is disabled in the child.
    pub inherited_disable_chance: f32,
    /// Consecutive settled activations required
    /// for a child network to count as stable.
    pub stabilization_period: usize,

    /// Weight of excess genes in genetic distance.
    pub excess_coefficient: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_coefficient: f32,
    /// Weight of the average matching gene weight
    /// difference in genetic distance.
    pub weight_coefficient: f32,
}

impl Default for GeneticConfig {
    fn default() -> GeneticConfig {
        GeneticConfig {
            feature_groups: vec![FeatureGroup {
                name: "inputs".to_string(),
                features: vec!["0".to_string()],
            }],
            actions: vec![ActionSpec {
                name: "0".to_string(),
                parameters: vec![],
            }],
            initial_topology: InitialTopology::FullyConnected,
            initial_weight_range: 1.0,
            classification_activation: ActivationFunction::Sigmoid,
            hidden_activation: ActivationFunction::Sigmoid,
            add_node_chance: 0.03,
            add_connection_chance: 0.05,
            add_connection_attempts: 50,
            recurrent_connection_chance: 0.1,
            new_connection_weight_range: 10.0,
            population_champion_connection_mutation: 0.3,
            mutate_weights_chance: 0.6,
            weight_perturbation_power: 2.5,
            toggle_enable_chance: 0.1,
            toggle_enable_times: 3,
            reenable_chance: 0.03,
            weight_average_chance: 0.4,
            inherited_disable_chance: 0.75,
            stabilization_period: 100,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.4,
        }
    }
}

impl GeneticConfig {
    /// Returns the default configuration for a plain numeric
    /// task: a single group of `inputs` features, and `outputs`
    /// parameterless actions.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig::with_shape(3, 2);
    /// assert_eq!(config.input_count(), 3);
    /// assert_eq!(config.sensor_count(), 4);
    /// assert_eq!(config.output_count(), 2);
    /// ```
    pub fn with_shape(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            feature_groups: vec![FeatureGroup {
                name: "inputs".to_string(),
                features: (0..inputs).map(|i| i.to_string()).collect(),
            }],
            actions: (0..outputs)
                .map(|o| ActionSpec {
                    name: o.to_string(),
                    parameters: vec![],
                })
                .collect(),
            ..GeneticConfig::default()
        }
    }

    /// Number of input nodes.
    pub fn input_count(&self) -> usize {
        self.feature_groups.iter().map(|g| g.features.len()).sum()
    }

    /// Number of input nodes plus the bias.
    pub fn sensor_count(&self) -> usize {
        self.input_count() + 1
    }

    pub fn classification_count(&self) -> usize {
        self.actions.len()
    }

    pub fn regression_count(&self) -> usize {
        self.actions.iter().map(|a| a.parameters.len()).sum()
    }

    pub fn output_count(&self) -> usize {
        self.classification_count() + self.regression_count()
    }

    /// Looks up a feature by name.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{FeatureGroup, FeatureKey, GeneticConfig};
    ///
    /// let config = GeneticConfig {
    ///     feature_groups: vec![
    ///         FeatureGroup { name: "cat".into(), features: vec!["x".into(), "y".into()] },
    ///         FeatureGroup { name: "ball".into(), features: vec!["x".into()] },
    ///     ],
    ///     ..GeneticConfig::default()
    /// };
    /// assert_eq!(config.feature_key("ball", "x"), Some(FeatureKey { group: 1, feature: 0 }));
    /// assert_eq!(config.feature_key("ball", "y"), None);
    /// ```
    pub fn feature_key(&self, group_name: &str, feature_name: &str) -> Option<FeatureKey> {
        let group = self.feature_groups.iter().position(|g| g.name == group_name)?;
        let feature = self.feature_groups[group]
            .features
            .iter()
            .position(|f| f == feature_name)?;
        Some(FeatureKey { group, feature })
    }

    /// Returns the kind and activation function of every
    /// node shared by all genomes, in id order: inputs,
    /// bias, classification outputs, regression outputs.
    pub(crate) fn node_layout(&self) -> Vec<(NodeKind, ActivationFunction)> {
        let inputs = self.feature_groups.iter().enumerate().flat_map(|(group, g)| {
            (0..g.features.len()).map(move |feature| {
                (NodeKind::Input { group, feature }, ActivationFunction::None)
            })
        });
        let classification = (0..self.actions.len()).map(|action| {
            (
                NodeKind::Classification { action },
                self.classification_activation,
            )
        });
        let regression = self.actions.iter().enumerate().flat_map(|(action, a)| {
            a.parameters.iter().enumerate().map(move |(parameter, p)| {
                (NodeKind::Regression { action, parameter }, p.activation)
            })
        });
        inputs
            .chain(std::iter::once((NodeKind::Bias, ActivationFunction::None)))
            .chain(classification)
            .chain(regression)
            .collect()
    }
}
