use approx::assert_abs_diff_eq;
use neuroevo_nn::genomics::{ActivationFunction, FeatureGroup, GeneticConfig, History, NNGenome};
use neuroevo_nn::networks::NetworkError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::collections::HashMap;

/// Two inputs (0, 1), the bias (2) and two classification outputs (3, 4),
/// fully connected with fixed weights.
fn fixture() -> NNGenome {
    let mut genome = NNGenome::unconnected(&GeneticConfig::with_shape(2, 2));
    let weights = [(0, 3, 0.1), (0, 4, 0.2), (1, 3, 0.3), (1, 4, 0.4), (2, 3, 0.5), (2, 4, 0.6)];
    for (innovation, (source, target, weight)) in weights.into_iter().enumerate() {
        genome
            .add_connection(innovation, source, target, weight, false)
            .unwrap();
    }
    genome
}

#[test]
fn fixed_weights_reproduce_known_output() {
    let mut genome = fixture();
    let output = genome.activate(&[0.5, 0.4]).unwrap();

    // Scores 0.67 and 0.86 before the softmax.
    assert_abs_diff_eq!(genome.node(3).unwrap().node_value(), 0.67, epsilon = 1e-5);
    assert_abs_diff_eq!(genome.node(4).unwrap().node_value(), 0.86, epsilon = 1e-5);
    assert_abs_diff_eq!(output.classification[0], 0.4527, epsilon = 1e-3);
    assert_abs_diff_eq!(output.classification[1], 0.5473, epsilon = 1e-3);
    assert_eq!(output.selected_action(), Some(1));
    assert!(output.regression.is_empty());

    // Outputs use the steepened sigmoid.
    assert_abs_diff_eq!(
        genome.node(3).unwrap().activation_value(),
        1.0 / (1.0 + (-4.9f32 * 0.67).exp()),
        epsilon = 1e-5
    );
}

#[test]
fn activation_is_deterministic_after_flush() {
    let config = GeneticConfig::with_shape(4, 3);
    let mut history = History::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    for _ in 0..20 {
        let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
        for _ in 0..5 {
            let _ = genome.mutate_add_node(&mut history, &config, &mut rng);
        }
        assert!(!genome.is_recurrent());
        let inputs = [0.3, -1.0, 2.0, 0.0];
        let first = genome.activate(&inputs).unwrap();
        genome.flush_node_values();
        let second = genome.activate(&inputs).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn classification_outputs_form_a_distribution() {
    let config = GeneticConfig {
        initial_weight_range: 50.0,
        ..GeneticConfig::with_shape(3, 5)
    };
    let mut history = History::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..50 {
        let mut genome = NNGenome::generate(&config, &mut history, &mut rng);
        let output = genome.activate(&[10.0, -10.0, 3.0]).unwrap();
        assert_abs_diff_eq!(output.classification.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert!(output.classification.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[test]
fn features_are_matched_by_name() {
    let config = GeneticConfig {
        feature_groups: vec![
            FeatureGroup {
                name: "player".into(),
                features: vec!["x".into(), "y".into()],
            },
            FeatureGroup {
                name: "enemy".into(),
                features: vec!["distance".into()],
            },
        ],
        ..GeneticConfig::with_shape(0, 2)
    };
    let mut history = History::new(&config);
    let genome = NNGenome::generate(&config, &mut history, &mut ChaCha8Rng::seed_from_u64(12));

    let mut by_index = genome.clone();
    let expected = by_index.activate(&[0.0, 2.0, -1.0]).unwrap();

    let features = HashMap::from([
        (config.feature_key("player", "y").unwrap(), 2.0),
        (config.feature_key("enemy", "distance").unwrap(), -1.0),
    ]);
    let mut by_name = genome;
    assert_eq!(by_name.activate_features(&features).unwrap(), expected);
    assert!(config.feature_key("enemy", "x").is_none());
}

#[test]
fn wrong_input_count_is_rejected() {
    let mut genome = fixture();
    assert_eq!(
        genome.activate(&[1.0, 2.0, 3.0]).unwrap_err(),
        NetworkError::InputSizeMismatch {
            expected: 2,
            found: 3
        }
    );
}

#[test]
fn hidden_layers_feed_outputs() {
    let config = GeneticConfig {
        hidden_activation: ActivationFunction::Relu,
        ..GeneticConfig::with_shape(1, 1)
    };
    let mut genome = NNGenome::unconnected(&config);
    genome.add_node(3, ActivationFunction::Relu).unwrap();
    genome.add_node(4, ActivationFunction::Relu).unwrap();
    genome.add_connection(10, 0, 3, 2.0, false).unwrap();
    genome.add_connection(11, 3, 4, 3.0, false).unwrap();
    genome.add_connection(12, 4, 2, 0.5, false).unwrap();

    genome.activate(&[1.0]).unwrap();
    assert_abs_diff_eq!(genome.node(2).unwrap().node_value(), 3.0, epsilon = 1e-6);
    // A negative input is cut off by the hidden layers.
    genome.flush_node_values();
    genome.activate(&[-1.0]).unwrap();
    assert_abs_diff_eq!(genome.node(2).unwrap().node_value(), 0.0, epsilon = 1e-6);
    // Each activation relays the signal through both hidden layers.
    assert_eq!(genome.stabilized_counter(5), 1);
}
