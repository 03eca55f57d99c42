use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// The function a node applies to the
/// weighted sum of its incoming signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    // 1 / (1 + exp(-4.9x))
    Sigmoid,
    // tanh(x)
    Tanh,
    // max(0, x)
    Relu,
    // x
    None,
}

impl ActivationFunction {
    /// Applies the function to `x`.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::ActivationFunction;
    ///
    /// assert_eq!(ActivationFunction::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationFunction::Relu.apply(-3.0), 0.0);
    /// assert_eq!(ActivationFunction::None.apply(-3.0), -3.0);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            Self::Tanh => x.tanh(),
            Self::Relu => x.max(0.0),
            Self::None => x,
        }
    }
}

/// The role a node plays in the network.
///
/// Input nodes are keyed by the indices of their feature
/// group and feature, output nodes by the index of the
/// action (and parameter) they drive, both as configured in
/// the [`GeneticConfig`].
///
/// [`GeneticConfig`]: crate::genomics::GeneticConfig
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Input { group: usize, feature: usize },
    /// A constant 1 source.
    Bias,
    Hidden,
    /// One entry of the action-selection distribution.
    Classification { action: usize },
    /// A scalar parameter value for an action.
    Regression { action: usize, parameter: usize },
}

impl NodeKind {
    /// Returns whether the node feeds values into the network
    /// without reading any (inputs and bias).
    pub fn is_sensor(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::Bias)
    }

    /// Returns whether the node's value is part of the network's output.
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Classification { .. } | Self::Regression { .. })
    }
}

/// A single neuron. Besides its identity and function,
/// a node carries the runtime state of the network's
/// activation, which is not serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    id: Innovation,
    kind: NodeKind,
    activation: ActivationFunction,
    #[serde(skip)]
    pub(crate) node_value: f32,
    #[serde(skip)]
    pub(crate) activation_value: f32,
    #[serde(skip)]
    pub(crate) last_activation_value: f32,
    #[serde(skip)]
    pub(crate) activation_count: usize,
    #[serde(skip)]
    pub(crate) activated: bool,
}

impl NodeGene {
    /// Returns a new node in its reset state.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::{ActivationFunction, NodeGene, NodeKind};
    ///
    /// let node = NodeGene::new(7, NodeKind::Hidden, ActivationFunction::Sigmoid);
    /// assert_eq!(node.id(), 7);
    /// assert_eq!(node.activation_count(), 0);
    /// ```
    pub fn new(id: Innovation, kind: NodeKind, activation: ActivationFunction) -> NodeGene {
        NodeGene {
            id,
            kind,
            activation,
            node_value: 0.0,
            activation_value: 0.0,
            last_activation_value: 0.0,
            activation_count: 0,
            activated: false,
        }
    }

    /// Returns the node's identifier.
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the node's role.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the node's activation function.
    pub fn activation_function(&self) -> ActivationFunction {
        self.activation
    }

    /// Returns the weighted input sum of the last activation round.
    pub fn node_value(&self) -> f32 {
        self.node_value
    }

    /// Returns the node's current output value.
    pub fn activation_value(&self) -> f32 {
        self.activation_value
    }

    /// Returns the node's output value before its last activation.
    pub fn last_activation_value(&self) -> f32 {
        self.last_activation_value
    }

    /// Returns how many times the node has fired since it was last reset.
    pub fn activation_count(&self) -> usize {
        self.activation_count
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Clears all runtime state. Bias nodes keep
    /// their constant output.
    pub(crate) fn reset(&mut self) {
        self.node_value = 0.0;
        self.activation_value = 0.0;
        self.last_activation_value = 0.0;
        self.activation_count = 0;
        self.activated = false;
        if self.kind == NodeKind::Bias {
            self.node_value = 1.0;
            self.activation_value = 1.0;
        }
    }

    /// Loads a sensor value and counts it as a firing.
    pub(crate) fn load(&mut self, value: f32) {
        self.last_activation_value = self.activation_value;
        self.node_value = value;
        self.activation_value = value;
        self.activated = true;
        self.activation_count += 1;
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NodeKind::Input { group, feature } => format!("I{}.{}", group, feature),
            NodeKind::Bias => "B".to_string(),
            NodeKind::Hidden => "H".to_string(),
            NodeKind::Classification { action } => format!("C{}", action),
            NodeKind::Regression { action, parameter } => format!("R{}.{}", action, parameter),
        };
        write!(f, "{}:{}({:?})", self.id, kind, self.activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sigmoid_is_steepened() {
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.apply(1.0), 0.992_608, epsilon = 1e-5);
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.apply(-1.0), 0.007_392, epsilon = 1e-5);
    }

    #[test]
    fn sensor_and_output_kinds() {
        assert!(NodeKind::Bias.is_sensor());
        assert!(NodeKind::Input { group: 0, feature: 2 }.is_sensor());
        assert!(!NodeKind::Hidden.is_sensor() && !NodeKind::Hidden.is_output());
        assert!(NodeKind::Classification { action: 1 }.is_output());
        assert!(NodeKind::Regression { action: 1, parameter: 0 }.is_output());
    }

    #[test]
    fn reset_keeps_bias_constant() {
        let mut bias = NodeGene::new(3, NodeKind::Bias, ActivationFunction::None);
        let mut hidden = NodeGene::new(4, NodeKind::Hidden, ActivationFunction::Sigmoid);
        hidden.load(2.0);
        bias.reset();
        hidden.reset();
        assert_eq!(bias.activation_value(), 1.0);
        assert_eq!(hidden.activation_value(), 0.0);
        assert_eq!(hidden.activation_count(), 0);
        assert!(!hidden.is_activated());
    }

    #[test]
    fn runtime_state_is_not_serialized() {
        let mut node = NodeGene::new(9, NodeKind::Classification { action: 0 }, ActivationFunction::Sigmoid);
        node.load(0.75);
        let json = serde_json::to_string(&node).unwrap();
        let restored: NodeGene = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id(), 9);
        assert_eq!(restored.kind(), node.kind());
        assert_eq!(restored.activation_value(), 0.0);
    }
}
