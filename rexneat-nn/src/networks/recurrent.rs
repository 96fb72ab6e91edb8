use super::{check_inputs, check_outputs};
use crate::genomics::{ActivationType, AggregationType, NNGenome, NetworkError, NodeType};
use crate::NodeId;

use ahash::RandomState;

use std::collections::HashMap;

/// An arbitrarily-structured neural network, best suited
/// for real-time control: new inputs are set for each
/// activation, and signals advance one connection per step.
#[derive(Clone, Debug)]
pub struct RecurrentNetwork {
    input_count: usize,
    output_count: usize,
    node_ids: Box<[NodeId]>,
    biases: Box<[f32]>,
    activation_levels: Box<[f32]>,
    next_levels: Box<[f32]>,
    activation_functions: Box<[ActivationType]>,
    aggregations: Box<[AggregationType]>,
    incoming: Box<[Box<[(usize, f32)]>]>,
}

impl RecurrentNetwork {
    /// Generates a new network from the passed genome.
    pub fn new(genome: &NNGenome) -> RecurrentNetwork {
        let mut input_nodes = vec![];
        let mut output_nodes = vec![];
        let mut hidden_nodes = vec![];

        for node in genome.nodes() {
            match node.node_type() {
                NodeType::Sensor => &mut input_nodes,
                NodeType::Actuator => &mut output_nodes,
                NodeType::Hidden => &mut hidden_nodes,
            }
            .push(node);
        }
        // Nodes arrive sorted by id; sensor -1 is the first input.
        input_nodes.reverse();
        let nodes: Vec<_> = input_nodes
            .iter()
            .chain(&output_nodes)
            .chain(&hidden_nodes)
            .copied()
            .collect();

        let node_index_from_id: HashMap<_, _, RandomState> =
            nodes.iter().enumerate().map(|(i, n)| (n.id(), i)).collect();
        let mut incoming = vec![vec![]; nodes.len()];
        for gene in genome.connections().filter(|g| g.enabled()) {
            if let (Some(&source), Some(&target)) = (
                node_index_from_id.get(&gene.source()),
                node_index_from_id.get(&gene.target()),
            ) {
                incoming[target].push((source, gene.weight()));
            }
        }

        RecurrentNetwork {
            input_count: input_nodes.len(),
            output_count: output_nodes.len(),
            node_ids: nodes.iter().map(|n| n.id()).collect(),
            biases: nodes.iter().map(|n| n.bias()).collect(),
            activation_levels: vec![0.0; nodes.len()].into(),
            next_levels: vec![0.0; nodes.len()].into(),
            activation_functions: nodes.iter().map(|n| n.activation()).collect(),
            aggregations: nodes.iter().map(|n| n.aggregation()).collect(),
            incoming: incoming.into_iter().map(Vec::into_boxed_slice).collect(),
        }
    }

    /// Sets the inputs, advances the network one step and
    /// returns the new output activation levels.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{
    ///     ActivationType, AggregationType, ConnectionGene, NNGenome, NodeGene, NodeType,
    /// };
    /// use rexneat_nn::networks::RecurrentNetwork;
    ///
    /// let mut genome = NNGenome::empty();
    /// for (id, node_type) in [(-1, NodeType::Sensor), (0, NodeType::Actuator), (1, NodeType::Hidden)] {
    ///     genome
    ///         .add_node(NodeGene::new(id, node_type, ActivationType::ReLU, AggregationType::Sum))
    ///         .unwrap();
    /// }
    /// genome.add_connection(ConnectionGene::new(0, -1, 1, 2.0), false).unwrap();
    /// genome.add_connection(ConnectionGene::new(1, 1, 0, 1.0), false).unwrap();
    ///
    /// let mut network = RecurrentNetwork::new(&genome);
    ///
    /// // The signal needs two steps to reach the output.
    /// assert_eq!(network.activate(&[1.5]).unwrap(), vec![0.0]);
    /// assert_eq!(network.activate(&[0.0]).unwrap(), vec![3.0]);
    /// ```
    pub fn activate(&mut self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        check_inputs(inputs, self.input_count)?;
        self.activation_levels[..self.input_count].copy_from_slice(inputs);
        self.fire_nodes();
        self.compute_activations();
        check_outputs(self.outputs())
    }

    /// Aggregates each node's incoming signals from
    /// the current activation levels.
    fn fire_nodes(&mut self) {
        for node in self.input_count..self.node_ids.len() {
            let sum = self.aggregations[node].aggregate(
                self.incoming[node]
                    .iter()
                    .map(|&(source, weight)| self.activation_levels[source] * weight),
            );
            self.next_levels[node] = sum + self.biases[node];
        }
    }

    /// Computes each node's activation level,
    /// based on its aggregated input.
    fn compute_activations(&mut self) {
        for ((level, next), function) in self.activation_levels[self.input_count..]
            .iter_mut()
            .zip(&self.next_levels[self.input_count..])
            .zip(&self.activation_functions[self.input_count..])
        {
            *level = function.apply(*next);
        }
    }

    /// Clears the activation state of all nodes.
    pub fn clear_state(&mut self) {
        for (level, next) in self
            .activation_levels
            .iter_mut()
            .zip(self.next_levels.iter_mut())
        {
            *level = 0.0;
            *next = 0.0;
        }
    }

    /// Returns the current output node activation levels
    /// as a vector.
    pub fn outputs(&self) -> Vec<f32> {
        self.activation_levels[self.input_count..self.input_count + self.output_count].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ConnectionGene, NodeGene};

    fn looped() -> NNGenome {
        let mut genome = NNGenome::empty();
        for (id, node_type) in [
            (-1, NodeType::Sensor),
            (0, NodeType::Actuator),
            (1, NodeType::Hidden),
            (2, NodeType::Hidden),
        ] {
            genome
                .add_node(NodeGene::new(id, node_type, ActivationType::Identity, AggregationType::Sum))
                .unwrap();
        }
        for (innovation, (source, target, weight)) in
            [(-1, 1, 1.0), (1, 2, 1.0), (2, 1, 1.0), (1, 0, 1.0)].into_iter().enumerate()
        {
            genome
                .add_connection(ConnectionGene::new(innovation, source, target, weight), false)
                .unwrap();
        }
        genome
    }

    #[test]
    fn cycles_accumulate_state() {
        let mut network = RecurrentNetwork::new(&looped());
        // Step 1: 1 = 1. Step 2: 2 = 1, 1 = 1, out = 1.
        // Step 3: 1 = 1 + 1, out = 1. Step 4: out = 2.
        let outputs: Vec<f32> = (0..4).map(|_| network.activate(&[1.0]).unwrap()[0]).collect();
        assert_eq!(outputs, vec![0.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn clear_state_resets_levels() {
        let mut network = RecurrentNetwork::new(&looped());
        network.activate(&[1.0]).unwrap();
        network.activate(&[1.0]).unwrap();
        assert_ne!(network.outputs(), vec![0.0]);
        network.clear_state();
        assert_eq!(network.outputs(), vec![0.0]);
    }
}
