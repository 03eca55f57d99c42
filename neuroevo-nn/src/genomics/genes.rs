use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A directed, weighted edge between two nodes,
/// identified across genomes by its innovation number.
///
/// Endpoints are node ids, not references, so genes
/// can be freely copied between genomes.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    source: Innovation,
    target: Innovation,
    weight: f32,
    enabled: bool,
    recurrent: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ connection gene.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0, false);
    /// assert!(gene.enabled());
    /// assert_eq!(gene.endpoints(), (3, 9));
    /// ```
    pub fn new(
        innovation: Innovation,
        source: Innovation,
        target: Innovation,
        weight: f32,
        recurrent: bool,
    ) -> ConnectionGene {
        ConnectionGene {
            innovation,
            source,
            target,
            weight,
            enabled: true,
            recurrent,
        }
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the node the connection reads from.
    pub fn source(&self) -> Innovation {
        self.source
    }

    /// Returns the id of the node the connection feeds into.
    pub fn target(&self) -> Innovation {
        self.target
    }

    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.source, self.target)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the gene's weight.
    ///
    /// # Examples
    /// ```
    /// use neuroevo_nn::genomics::ConnectionGene;
    ///
    /// let mut gene = ConnectionGene::new(42, 3, 9, 2.0, false);
    /// gene.set_weight(-5.0);
    /// assert_eq!(gene.weight(), -5.0);
    /// ```
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Returns whether the connection takes part in activation.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether the connection reads its source's
    /// value from the previous activation.
    pub fn recurrent(&self) -> bool {
        self.recurrent
    }

    /// Returns the `(source, target, recurrent)` triple,
    /// unique among a genome's connections.
    pub fn signature(&self) -> (Innovation, Innovation, bool) {
        (self.source, self.target, self.recurrent)
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}{}{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            if self.recurrent { "~>" } else { "->" },
            self.target,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_genes_are_parenthesized() {
        let mut gene = ConnectionGene::new(4, 0, 2, 0.5, false);
        assert_eq!(gene.to_string(), "4[0->2, 0.500]");
        gene.set_enabled(false);
        assert_eq!(gene.to_string(), "(4[0->2, 0.500])");
    }

    #[test]
    fn recurrence_is_part_of_the_signature() {
        let forward = ConnectionGene::new(4, 5, 2, 0.5, false);
        let backward = ConnectionGene::new(9, 5, 2, 0.5, true);
        assert_ne!(forward.signature(), backward.signature());
        assert_eq!(backward.to_string(), "9[5~>2, 0.500]");
    }
}
