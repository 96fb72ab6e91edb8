use super::{check_inputs, check_outputs};
use crate::genomics::{ActivationType, AggregationType, NNGenome, NetworkError, NodeType};
use crate::NodeId;

use ahash::RandomState;

use std::collections::{BTreeSet, HashMap};

/// A neuron scheduled for evaluation, with its
/// incoming `(source slot, weight)` pairs.
#[derive(Clone, Debug)]
struct Neuron {
    id: NodeId,
    slot: usize,
    bias: f32,
    activation: ActivationType,
    aggregation: AggregationType,
    inputs: Box<[(usize, f32)]>,
}

/// An acyclic neural network, evaluated in a single pass
/// over a topological order computed at construction.
///
/// Only neurons from which an actuator can be reached are
/// evaluated; the rest of the genome is ignored.
#[derive(Clone, Debug)]
pub struct FeedForwardNetwork {
    input_count: usize,
    output_slots: Box<[usize]>,
    order: Box<[Neuron]>,
    values: Box<[f32]>,
}

impl FeedForwardNetwork {
    /// Generates a new network from the passed genome.
    ///
    /// # Errors
    /// Returns [`NetworkError::Cyclic`] if the enabled
    /// connections feeding the actuators form a cycle.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rexneat_nn::networks::FeedForwardNetwork;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// let mut network = FeedForwardNetwork::new(&genome).unwrap();
    /// let outputs = network.activate(&[0.5; 12]).unwrap();
    /// assert_eq!(outputs.len(), 3);
    /// ```
    pub fn new(genome: &NNGenome) -> Result<FeedForwardNetwork, NetworkError> {
        let mut sensors = vec![];
        let mut actuators = vec![];
        let mut hidden = vec![];
        for node in genome.nodes() {
            match node.node_type() {
                NodeType::Sensor => &mut sensors,
                NodeType::Actuator => &mut actuators,
                NodeType::Hidden => &mut hidden,
            }
            .push(node);
        }
        // Sensor -1 is the first input.
        sensors.reverse();
        let nodes: Vec<_> = sensors.iter().chain(&actuators).chain(&hidden).copied().collect();
        let slot_of: HashMap<NodeId, usize, RandomState> =
            nodes.iter().enumerate().map(|(slot, n)| (n.id(), slot)).collect();

        let mut incoming = vec![vec![]; nodes.len()];
        let mut outgoing = vec![vec![]; nodes.len()];
        for gene in genome.connections().filter(|c| c.enabled()) {
            if let (Some(&source), Some(&target)) =
                (slot_of.get(&gene.source()), slot_of.get(&gene.target()))
            {
                incoming[target].push((source, gene.weight()));
                outgoing[source].push(target);
            }
        }

        let input_count = sensors.len();
        let output_slots: Vec<usize> = (input_count..input_count + actuators.len()).collect();

        // Neurons from which an actuator is reachable.
        let mut required = vec![false; nodes.len()];
        let mut pending = output_slots.clone();
        while let Some(slot) = pending.pop() {
            if slot >= input_count && !required[slot] {
                required[slot] = true;
                pending.extend(incoming[slot].iter().map(|&(source, _)| source));
            }
        }

        // Kahn's algorithm, lowest slot first.
        let mut in_degree: Vec<usize> = (0..nodes.len())
            .map(|slot| {
                incoming[slot]
                    .iter()
                    .filter(|&&(source, _)| source >= input_count && required[source])
                    .count()
            })
            .collect();
        let mut ready: BTreeSet<usize> = (input_count..nodes.len())
            .filter(|&slot| required[slot] && in_degree[slot] == 0)
            .collect();
        let mut order = Vec::with_capacity(nodes.len() - input_count);
        while let Some(slot) = ready.pop_first() {
            let node = nodes[slot];
            order.push(Neuron {
                id: node.id(),
                slot,
                bias: node.bias(),
                activation: node.activation(),
                aggregation: node.aggregation(),
                inputs: std::mem::take(&mut incoming[slot]).into(),
            });
            for &target in &outgoing[slot] {
                if required[target] {
                    in_degree[target] -= 1;
                    if in_degree[target] == 0 {
                        ready.insert(target);
                    }
                }
            }
        }

        let required_count = required.iter().filter(|&&r| r).count();
        if order.len() < required_count {
            let stuck = (input_count..nodes.len())
                .find(|&slot| required[slot] && in_degree[slot] > 0)
                .map_or(0, |slot| nodes[slot].id());
            return Err(NetworkError::Cyclic(stuck));
        }

        Ok(FeedForwardNetwork {
            input_count,
            output_slots: output_slots.into(),
            order: order.into(),
            values: vec![0.0; nodes.len()].into(),
        })
    }

    /// Computes the network's outputs for `inputs`,
    /// one value per sensor in the order `-1, -2, …`.
    ///
    /// # Errors
    /// Fails if the number of inputs doesn't match the
    /// sensor count, or if any input or output is not finite.
    pub fn activate(&mut self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        check_inputs(inputs, self.input_count)?;
        self.values[..self.input_count].copy_from_slice(inputs);
        for neuron in self.order.iter() {
            let aggregate = neuron
                .aggregation
                .aggregate(neuron.inputs.iter().map(|&(source, weight)| self.values[source] * weight));
            self.values[neuron.slot] = neuron.activation.apply(neuron.bias + aggregate);
        }
        check_outputs(self.output_slots.iter().map(|&slot| self.values[slot]).collect())
    }

    /// Returns the ids of evaluated neurons,
    /// in evaluation order.
    pub fn evaluation_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().map(|n| n.id)
    }
}
