//! A Network is the phenotype of a genome: disabled
//! connections are ignored, connection genes become
//! weighted edges and node genes become neurons.
//!
//! Two evaluators are available:
//! - [`FeedForwardNetwork`] computes its evaluation order
//!   once, and produces outputs in a single pass. Only
//!   valid for acyclic genomes.
//! - [`RecurrentNetwork`] keeps activation state between
//!   calls and propagates signals one step per activation,
//!   allowing arbitrary cycles.
//!
//! [`Network`] picks one of them according to
//! [`GeneticConfig::feed_forward`].
mod feed_forward;
mod recurrent;

pub use feed_forward::FeedForwardNetwork;
pub use recurrent::RecurrentNetwork;

use crate::genomics::{GeneticConfig, NNGenome, NetworkError};

/// Either kind of network, as configured.
#[derive(Clone, Debug)]
pub enum Network {
    FeedForward(FeedForwardNetwork),
    Recurrent(RecurrentNetwork),
}

impl Network {
    /// Builds the network for `genome`.
    ///
    /// # Errors
    /// Fails with [`NetworkError::Cyclic`] if feed-forward
    /// networks are configured and the genome has a cycle.
    pub fn new(genome: &NNGenome, config: &GeneticConfig) -> Result<Network, NetworkError> {
        if config.feed_forward {
            FeedForwardNetwork::new(genome).map(Network::FeedForward)
        } else {
            Ok(Network::Recurrent(RecurrentNetwork::new(genome)))
        }
    }

    /// Feeds `inputs` to the network and returns its outputs.
    pub fn activate(&mut self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        match self {
            Network::FeedForward(network) => network.activate(inputs),
            Network::Recurrent(network) => network.activate(inputs),
        }
    }

    /// Forgets any state carried between activations.
    pub fn clear_state(&mut self) {
        if let Network::Recurrent(network) = self {
            network.clear_state();
        }
    }
}

/// Rejects input slices of the wrong length
/// or holding non-finite values.
fn check_inputs(inputs: &[f32], expected: usize) -> Result<(), NetworkError> {
    if inputs.len() != expected {
        return Err(NetworkError::InputCount {
            expected,
            found: inputs.len(),
        });
    }
    match inputs.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(NetworkError::NonFiniteInput { index }),
        None => Ok(()),
    }
}

fn check_outputs(outputs: Vec<f32>) -> Result<Vec<f32>, NetworkError> {
    match outputs.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(NetworkError::NonFiniteOutput { index }),
        None => Ok(outputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ConnectionGene, GeneticConfig, NNGenome};

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn picks_network_kind() {
        let config = GeneticConfig {
            feed_forward: true,
            ..GeneticConfig::zero()
        };
        let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(Network::new(&genome, &config), Ok(Network::FeedForward(_))));

        let config = GeneticConfig {
            feed_forward: false,
            ..config
        };
        assert!(matches!(Network::new(&genome, &config), Ok(Network::Recurrent(_))));
    }

    #[test]
    fn cyclic_genome_is_rejected_in_feed_forward_mode() {
        let config = GeneticConfig {
            output_count: std::num::NonZeroUsize::new(2).unwrap(),
            ..GeneticConfig::zero()
        };
        let mut genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
        genome.add_connection(ConnectionGene::new(2, 0, 1, 1.0), false).unwrap();
        genome.add_connection(ConnectionGene::new(3, 1, 0, 1.0), false).unwrap();

        let feed_forward = GeneticConfig {
            feed_forward: true,
            ..config
        };
        assert!(matches!(
            Network::new(&genome, &feed_forward),
            Err(NetworkError::Cyclic(_))
        ));
    }

    #[test]
    fn input_checks() {
        assert_eq!(
            check_inputs(&[1.0], 2),
            Err(NetworkError::InputCount {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            check_inputs(&[1.0, f32::NAN], 2),
            Err(NetworkError::NonFiniteInput { index: 1 })
        );
        assert_eq!(check_inputs(&[1.0, 2.0], 2), Ok(()));
        assert_eq!(
            check_outputs(vec![0.0, f32::INFINITY]),
            Err(NetworkError::NonFiniteOutput { index: 1 })
        );
    }
}
