use super::{ConnectionGene, GeneticConfig, GenomeError, NNGenome};

use log::{debug, warn};
use rand::Rng;

use std::cmp::Ordering;

/// Mates two genomes with identical sensor and output nodes.
///
/// Matching genes are inherited from either parent with even odds,
/// or with their weights averaged if the whole crossover was chosen
/// to average. Disjoint and excess genes are inherited from the
/// fitter parent, the shorter genome winning ties. When both parents
/// are equally fit and equally long, they are inherited from both.
///
/// A child whose outputs do not settle has the matching connections
/// it inherited disabled re-enabled, in innovation order, until they do.
/// Disjoint and excess connections keep their parent's state.
pub(super) fn crossover<R: Rng + ?Sized>(
    parent1: &NNGenome,
    parent2: &NNGenome,
    config: &GeneticConfig,
    rng: &mut R,
) -> Result<NNGenome, GenomeError> {
    if !parent1.shape().eq(parent2.shape()) {
        return Err(GenomeError::ShapeMismatch);
    }

    let average = rng.gen::<f32>() < config.weight_average_chance;
    let (f1, f2) = (parent1.fitness, parent2.fitness);
    let (len1, len2) = (parent1.connections.len(), parent2.connections.len());
    let parent1_better = f1 > f2 || (f1 == f2 && len1 < len2);
    let parent2_better = f2 > f1 || (f1 == f2 && len2 < len1);

    let mut child = NNGenome {
        nodes: parent1
            .nodes
            .iter()
            .filter(|n| n.kind().is_sensor() || n.kind().is_output())
            .cloned()
            .collect(),
        connections: Vec::with_capacity(len1.max(len2)),
        fitness: 0.0,
        recurrent: false,
        topology: None,
    };
    for node in &mut child.nodes {
        node.reset();
    }

    let mut disabled = vec![];
    let (genes1, genes2) = (&parent1.connections, &parent2.connections);
    let (mut i1, mut i2) = (0, 0);
    while i1 < genes1.len() || i2 < genes2.len() {
        let order = match (genes1.get(i1), genes2.get(i2)) {
            (Some(gene1), Some(gene2)) => gene1.innovation().cmp(&gene2.innovation()),
            (Some(_), None) => Ordering::Less,
            _ => Ordering::Greater,
        };
        match order {
            Ordering::Equal => {
                let (gene1, gene2) = (&genes1[i1], &genes2[i2]);
                let (chosen, parent) = if rng.gen::<bool>() {
                    (gene1, parent1)
                } else {
                    (gene2, parent2)
                };
                let weight = if average {
                    (gene1.weight() + gene2.weight()) / 2.0
                } else {
                    chosen.weight()
                };
                let enabled = (gene1.enabled() && gene2.enabled())
                    || rng.gen::<f32>() >= config.inherited_disable_chance;
                if inherit(&mut child, parent, chosen, weight, enabled) && !enabled {
                    disabled.push(chosen.innovation());
                }
                i1 += 1;
                i2 += 1;
            }
            Ordering::Less => {
                let gene = &genes1[i1];
                if !parent2_better {
                    inherit(&mut child, parent1, gene, gene.weight(), gene.enabled());
                }
                i1 += 1;
            }
            Ordering::Greater => {
                let gene = &genes2[i2];
                if !parent1_better {
                    inherit(&mut child, parent2, gene, gene.weight(), gene.enabled());
                }
                i2 += 1;
            }
        }
    }

    let period = config.stabilization_period;
    if child.stabilized_counter(period) < 0 {
        for innovation in disabled {
            if let Some(connection) = child.connection_mut(innovation) {
                connection.set_enabled(true);
            }
            if child.stabilized_counter(period) >= 0 {
                break;
            }
        }
        if child.stabilized_counter(period) < 0 {
            warn!("offspring did not stabilize after enabling all inherited connections");
        }
    }
    child.update_recurrent();
    Ok(child)
}

/// Copies a connection gene into the child, along with any
/// endpoint node the child does not have yet. Genes shadowing
/// one already inherited, or closing a two-node feed-forward
/// cycle with one, are left out. Returns whether the gene was copied.
fn inherit(
    child: &mut NNGenome,
    parent: &NNGenome,
    gene: &ConnectionGene,
    weight: f32,
    enabled: bool,
) -> bool {
    let (source, target, recurrent) = gene.signature();
    if child.has_connection(source, target, recurrent)
        || (!recurrent && child.has_connection(target, source, false))
    {
        debug!("skipping inherited connection {}", gene);
        return false;
    }
    for id in [source, target] {
        if child.node_index(id).is_some() {
            continue;
        }
        match parent.node(id) {
            Some(node) => {
                let mut node = node.clone();
                node.reset();
                child.insert_node(node);
            }
            None => {
                warn!("parent lacks endpoint {} of connection {}", id, gene);
                return false;
            }
        }
    }

    let mut inherited = ConnectionGene::new(gene.innovation(), source, target, weight, recurrent);
    inherited.set_enabled(enabled);
    child.insert_connection(inherited);
    true
}
