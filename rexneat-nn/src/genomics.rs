//! A Genome is the representation of a neural network
//! as a set of node genes and connection genes, aligned
//! across a population through an innovation [`History`].
//!
//! Genomes are the unit of evolution: they are mutated,
//! mated, and compared for speciation, and are turned
//! into executable [`Network`]s for evaluation.
//!
//! [`Network`]: crate::networks::Network
mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
pub use errors::*;
pub use genes::ConnectionGene;
pub use history::History;
pub use nodes::*;

use crate::{Innovation, NodeId};
use history::sensor_id;

use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use rexneat::rng::Chance;
use rexneat::Genome;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Genomes are the focus of evolution in NEAT.
/// They are a collection of nodes and the connections
/// between them, and can be mutated, mated, and compared
/// with each other.
///
/// Connections are keyed by their `(source, target)` pair,
/// which is in one-to-one correspondence with their
/// innovation number throughout a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NNGenome {
    nodes: BTreeMap<NodeId, NodeGene>,
    connections: BTreeMap<(NodeId, NodeId), ConnectionGene>,
    fitness: Option<f32>,
}

impl NNGenome {
    /// Creates a new genome with the minimal topology:
    /// every sensor connected to every actuator, no hidden
    /// nodes, random weights.
    ///
    /// Connection innovation numbers match those pre-registered
    /// by [`History::new`], so every fresh genome shares them.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// assert_eq!(genome.nodes().count(), 12 + 3);
    /// assert_eq!(genome.connections().count(), 12 * 3);
    /// assert_eq!(genome.fitness(), None);
    /// ```
    pub fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> NNGenome {
        let (inputs, outputs) = (config.input_count.get(), config.output_count.get());
        let mut genome = NNGenome::empty();
        for i in 0..inputs {
            genome.insert_node(sensor_id(i), NodeType::Sensor, config);
        }
        for o in 0..outputs {
            genome.insert_node(o as NodeId, NodeType::Actuator, config);
        }
        for i in 0..inputs {
            for o in 0..outputs {
                let weight = ConnectionGene::random_weight(config, rng);
                let gene = ConnectionGene::new(o + i * outputs, sensor_id(i), o as NodeId, weight);
                genome.connections.insert(gene.endpoints(), gene);
            }
        }
        genome
    }

    /// Returns a genome with no nodes and no connections,
    /// to be filled in with [`add_node`] and [`add_connection`].
    ///
    /// [`add_node`]: NNGenome::add_node
    /// [`add_connection`]: NNGenome::add_connection
    pub fn empty() -> NNGenome {
        NNGenome {
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            fitness: None,
        }
    }

    fn insert_node(&mut self, id: NodeId, node_type: NodeType, config: &GeneticConfig) {
        let node = NodeGene::new(id, node_type, config.activation, config.aggregation);
        self.nodes.insert(id, node);
    }

    /// Adds a node to the genome.
    ///
    /// # Errors
    /// Returns an error if a node with the same id exists,
    /// or if the id lies outside the range of its node type:
    /// negative for sensors, non-negative otherwise.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{ActivationType, AggregationType, NNGenome, NodeGene, NodeType};
    ///
    /// let mut genome = NNGenome::empty();
    /// let node = NodeGene::new(-1, NodeType::Sensor, ActivationType::Identity, AggregationType::Sum);
    ///
    /// assert!(genome.add_node(node.clone()).is_ok());
    /// assert!(genome.add_node(node).is_err());
    /// ```
    pub fn add_node(&mut self, node: NodeGene) -> Result<(), NodeValidityError> {
        if self.nodes.contains_key(&node.id()) {
            return Err(NodeValidityError::DuplicateNode(node.id()));
        }
        if (node.node_type() == NodeType::Sensor) != (node.id() < 0) {
            return Err(NodeValidityError::WrongIdRange(node.id()));
        }
        self.nodes.insert(node.id(), node);
        Ok(())
    }

    /// Adds a connection to the genome.
    ///
    /// # Errors
    /// Returns an error if either endpoint is missing, the
    /// target is a sensor, the connection is a self-loop or
    /// already exists, or, when `feed_forward` is set, if it
    /// would close a cycle.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{
    ///     ActivationType, AggregationType, ConnectionGene, GeneValidityError,
    ///     NNGenome, NodeGene, NodeType,
    /// };
    ///
    /// let mut genome = NNGenome::empty();
    /// for (id, node_type) in [(-1, NodeType::Sensor), (0, NodeType::Actuator)] {
    ///     genome
    ///         .add_node(NodeGene::new(id, node_type, ActivationType::Sigmoid, AggregationType::Sum))
    ///         .unwrap();
    /// }
    ///
    /// assert!(genome.add_connection(ConnectionGene::new(0, -1, 0, 1.0), true).is_ok());
    /// assert_eq!(
    ///     genome.add_connection(ConnectionGene::new(1, 0, -1, 1.0), true),
    ///     Err(GeneValidityError::SensorTarget(-1))
    /// );
    /// ```
    pub fn add_connection(
        &mut self,
        gene: ConnectionGene,
        feed_forward: bool,
    ) -> Result<(), GeneValidityError> {
        self.check_connection_viability(gene.source(), gene.target(), feed_forward)?;
        self.connections.insert(gene.endpoints(), gene);
        Ok(())
    }

    fn check_connection_viability(
        &self,
        source: NodeId,
        target: NodeId,
        feed_forward: bool,
    ) -> Result<(), GeneValidityError> {
        if !self.nodes.contains_key(&source) {
            return Err(GeneValidityError::MissingNode(source));
        }
        match self.nodes.get(&target) {
            None => return Err(GeneValidityError::MissingNode(target)),
            Some(node) if node.node_type() == NodeType::Sensor => {
                return Err(GeneValidityError::SensorTarget(target))
            }
            _ => {}
        }
        if source == target {
            return Err(GeneValidityError::SelfLoop(source));
        }
        if self.connections.contains_key(&(source, target)) {
            return Err(GeneValidityError::DuplicateConnection((source, target)));
        }
        if feed_forward && self.reaches(target, source) {
            return Err(GeneValidityError::Cycle((source, target)));
        }
        Ok(())
    }

    /// Whether `to` can be reached from `from` following
    /// connections, enabled or not.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = BTreeSet::from([from]);
        let mut pending = vec![from];
        while let Some(node) = pending.pop() {
            if node == to {
                return true;
            }
            let next = self
                .connections
                .range((node, NodeId::MIN)..=(node, NodeId::MAX))
                .map(|(&(_, target), _)| target);
            for target in next {
                if visited.insert(target) {
                    pending.push(target);
                }
            }
        }
        false
    }

    /// Mutates the weights of the genome's connections.
    ///
    /// Each weight is replaced by a random value with
    /// probability `weight_replace_chance`, and otherwise
    /// perturbed with probability `weight_perturb_chance`.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 5.0,
    ///     weight_mutation_power: 1.0,
    ///     weight_perturb_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(7);
    /// let mut genome = NNGenome::new(&config, &mut rng);
    /// let before = genome.connection(-1, 0).unwrap().weight();
    ///
    /// genome.mutate_weights(&config, &mut rng);
    ///
    /// let after = genome.connection(-1, 0).unwrap().weight();
    /// assert!(after.abs() <= config.weight_bound);
    /// assert!((after - before).abs() <= config.weight_mutation_power + f32::EPSILON);
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for gene in self.connections.values_mut() {
            if rng.chance(config.weight_replace_chance) {
                gene.randomize_weight(config, rng);
            } else if rng.chance(config.weight_perturb_chance) {
                gene.perturb_weight(config, rng);
            }
        }
    }

    /// Perturbs the bias of each non-sensor node with
    /// probability `bias_perturb_chance`.
    pub fn mutate_biases<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for node in self.nodes.values_mut() {
            if node.node_type() != NodeType::Sensor && rng.chance(config.bias_perturb_chance) {
                node.set_bias(genes::perturb(node.bias(), config, rng));
            }
        }
    }

    /// Induces a _connection mutation_ in the genome.
    /// If successful, returns the endpoints of the new connection.
    ///
    /// Random `(source, target)` pairs are drawn, at most
    /// `max_add_connection_attempts` times, until one passes
    /// the same checks as [`add_connection`].
    ///
    /// # Errors
    /// Returns an error if no viable pair was found.
    ///
    /// [`add_connection`]: NNGenome::add_connection
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(NodeId, NodeId), MutationError> {
        let sources: Vec<NodeId> = self.nodes.keys().copied().collect();
        let targets: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.node_type() != NodeType::Sensor)
            .map(NodeGene::id)
            .collect();

        for _ in 0..config.max_add_connection_attempts {
            let (source, target) = match (sources.choose(rng), targets.choose(rng)) {
                (Some(&source), Some(&target)) => (source, target),
                _ => break,
            };
            if self
                .check_connection_viability(source, target, config.feed_forward)
                .is_ok()
            {
                let innovation = history.add_connection_innovation(source, target);
                let weight = ConnectionGene::random_weight(config, rng);
                self.connections
                    .insert((source, target), ConnectionGene::new(innovation, source, target, weight));
                return Ok((source, target));
            }
        }
        Err(MutationError::NoConnectionFound(config.max_add_connection_attempts))
    }

    /// Induces a _node mutation_ in the genome.
    /// If successful, returns the id of the new node.
    ///
    /// A random enabled connection `A -> B` is disabled and
    /// replaced by a new hidden node `C` with connections
    /// `A -> C` (weight 1) and `C -> B` (the old weight).
    /// Identical splits in different genomes receive the
    /// same node id and innovation numbers.
    ///
    /// # Errors
    /// Returns an error if the genome has no enabled connections.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut history = History::new(&config);
    /// let mut genome = NNGenome::new(&config, &mut rng);
    ///
    /// let node = genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
    ///
    /// assert_eq!(node, 1);
    /// assert!(!genome.connection(-1, 0).unwrap().enabled());
    /// assert_eq!(genome.connection(-1, 1).unwrap().weight(), 1.0);
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<NodeId, MutationError> {
        let enabled: Vec<(NodeId, NodeId)> = self
            .connections
            .iter()
            .filter(|(_, g)| g.enabled())
            .map(|(&k, _)| k)
            .collect();
        let (source, target) = *enabled.choose(rng).ok_or(MutationError::NothingToSplit)?;
        let (split_innovation, weight) = match self.connections.get_mut(&(source, target)) {
            Some(gene) => {
                gene.set_enabled(false);
                (gene.innovation(), gene.weight())
            }
            None => return Err(MutationError::NothingToSplit),
        };

        let nodes = &self.nodes;
        let (incoming, new_node, outgoing) =
            history.add_split_innovation(split_innovation, source, target, |node| {
                nodes.contains_key(&node)
            });

        self.insert_node(new_node, NodeType::Hidden, config);
        self.connections.insert(
            (source, new_node),
            ConnectionGene::new(incoming, source, new_node, 1.0),
        );
        self.connections.insert(
            (new_node, target),
            ConnectionGene::new(outgoing, new_node, target, weight),
        );
        Ok(new_node)
    }

    /// Flips the enabled flag of a random connection,
    /// returning its endpoints.
    ///
    /// # Errors
    /// Returns an error if the genome has no connections.
    pub fn mutate_toggle_enable<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<(NodeId, NodeId), MutationError> {
        let keys: Vec<(NodeId, NodeId)> = self.connections.keys().copied().collect();
        let key = *keys.choose(rng).ok_or(MutationError::NoConnections)?;
        if let Some(gene) = self.connections.get_mut(&key) {
            gene.set_enabled(!gene.enabled());
        }
        Ok(key)
    }

    /// Applies every mutation, each with its configured chance.
    /// Structural mutations that find nothing to do are skipped.
    pub fn mutate_all<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        self.mutate_weights(config, rng);
        self.mutate_biases(config, rng);
        if rng.chance(config.add_node_chance) {
            if let Err(e) = self.mutate_add_node(history, config, rng) {
                trace!("skipped node mutation: {}", e);
            }
        }
        if rng.chance(config.add_connection_chance) {
            if let Err(e) = self.mutate_add_connection(history, config, rng) {
                trace!("skipped connection mutation: {}", e);
            }
        }
        if rng.chance(config.toggle_enable_chance) {
            if let Err(e) = self.mutate_toggle_enable(rng) {
                trace!("skipped toggle mutation: {}", e);
            }
        }
    }

    /// Combines two genomes into a child.
    ///
    /// The child inherits the structure of the primary parent:
    /// the fitter one, or on a tie the one with fewer connections,
    /// or `parent1`. Weights of connections shared by both parents
    /// come from a random parent, or are averaged with probability
    /// `mate_by_averaging_chance`; connections disabled in either
    /// parent are disabled with probability `disable_inherited_chance`.
    /// Biases of shared nodes come from a random parent.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use rexneat::Genome;
    ///
    /// let config = GeneticConfig { weight_bound: 1.0, ..GeneticConfig::default() };
    /// let mut rng = ChaCha8Rng::seed_from_u64(3);
    /// let mut history = History::new(&config);
    ///
    /// let mut fitter = NNGenome::new(&config, &mut rng);
    /// fitter.mutate_add_node(&mut history, &config, &mut rng).unwrap();
    /// fitter.set_fitness(2.0);
    /// let mut other = NNGenome::new(&config, &mut rng);
    /// other.set_fitness(1.0);
    ///
    /// let child = NNGenome::mate(&other, &fitter, &config, &mut rng);
    ///
    /// assert!(child.connections().map(|c| c.endpoints()).eq(fitter.connections().map(|c| c.endpoints())));
    /// assert_eq!(child.fitness(), None);
    /// ```
    pub fn mate<R: Rng + ?Sized>(
        parent1: &NNGenome,
        parent2: &NNGenome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> NNGenome {
        let (primary, secondary) = match Self::precedence(parent1, parent2) {
            Ordering::Less => (parent2, parent1),
            _ => (parent1, parent2),
        };

        let mut child = primary.clone();
        child.fitness = None;

        for (id, node) in child.nodes.iter_mut() {
            if let Some(other) = secondary.nodes.get(id) {
                if rng.gen::<bool>() {
                    node.set_bias(other.bias());
                }
            }
        }

        for (key, gene) in child.connections.iter_mut() {
            if let Some(other) = secondary.connections.get(key) {
                if rng.chance(config.mate_by_averaging_chance) {
                    gene.set_weight((gene.weight() + other.weight()) / 2.0);
                } else if rng.gen::<bool>() {
                    gene.set_weight(other.weight());
                }
                let disabled = !gene.enabled() || !other.enabled();
                gene.set_enabled(!(disabled && rng.chance(config.disable_inherited_chance)));
            }
        }

        child
    }

    /// `Greater` when `first` takes precedence as the primary parent.
    fn precedence(first: &NNGenome, second: &NNGenome) -> Ordering {
        let fitness = |g: &NNGenome| g.fitness.unwrap_or(0.0);
        fitness(first)
            .total_cmp(&fitness(second))
            .then_with(|| second.connections.len().cmp(&first.connections.len()))
            .then(Ordering::Greater)
    }

    /// Calculates the _genetic distance_ between `first` and `second`:
    ///
    /// `(c1 · D + c2 · E) / N + c3 · W`
    ///
    /// where `D` and `E` are the disjoint and excess connection
    /// counts, `W` the mean weight difference of matching connections
    /// and `N` the connection count of the larger genome, or 1 if
    /// that is below `normalization_floor`.
    pub fn genetic_distance(first: &NNGenome, second: &NNGenome, config: &GeneticConfig) -> f32 {
        let by_innovation = |g: &NNGenome| -> BTreeMap<Innovation, f32> {
            g.connections.values().map(|c| (c.innovation(), c.weight())).collect()
        };
        let (a, b) = (by_innovation(first), by_innovation(second));
        let excess_threshold = match (a.keys().next_back(), b.keys().next_back()) {
            (Some(&x), Some(&y)) => x.min(y),
            _ => 0,
        };

        let mut weight_difference = 0.0;
        let mut matching = 0usize;
        for (innovation, weight) in &a {
            if let Some(other) = b.get(innovation) {
                weight_difference += (weight - other).abs();
                matching += 1;
            }
        }
        let (mut disjoint, mut excess) = (0usize, 0usize);
        let unmatched = a
            .keys()
            .filter(|i| !b.contains_key(i))
            .chain(b.keys().filter(|i| !a.contains_key(i)));
        for &innovation in unmatched {
            if a.is_empty() || b.is_empty() || innovation > excess_threshold {
                excess += 1;
            } else {
                disjoint += 1;
            }
        }

        let size = a.len().max(b.len());
        let normalization = if size >= config.normalization_floor && size > 0 {
            size as f32
        } else {
            1.0
        };
        let mean_weight_difference = if matching > 0 {
            weight_difference / matching as f32
        } else {
            0.0
        };

        (config.disjoint_gene_factor * disjoint as f32 + config.excess_gene_factor * excess as f32)
            / normalization
            + config.common_weight_factor * mean_weight_difference
    }

    /// Returns an iterator over the genome's nodes,
    /// in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Returns an iterator over the genome's connections,
    /// ordered by `(source, target)`.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    pub fn connection(&self, source: NodeId, target: NodeId) -> Option<&ConnectionGene> {
        self.connections.get(&(source, target))
    }

    /// Returns the number of sensor nodes in the genome.
    pub fn input_count(&self) -> usize {
        self.nodes.range(..0).count()
    }

    /// Returns the number of actuator nodes in the genome.
    pub fn output_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.node_type() == NodeType::Actuator)
            .count()
    }

    /// Returns the genome's fitness, if evaluated.
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }
}

impl Genome for NNGenome {
    type Config = GeneticConfig;
    type InnovationHistory = History;

    fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> Self {
        NNGenome::new(config, rng)
    }

    fn genetic_distance(first: &Self, second: &Self, config: &GeneticConfig) -> f32 {
        NNGenome::genetic_distance(first, second, config)
    }

    fn mate<R: Rng + ?Sized>(parent1: &Self, parent2: &Self, config: &GeneticConfig, rng: &mut R) -> Self {
        NNGenome::mate(parent1, parent2, config, rng)
    }

    fn mutate<R: Rng + ?Sized>(&mut self, history: &mut History, config: &GeneticConfig, rng: &mut R) {
        self.mutate_all(history, config, rng)
    }

    fn child_mutation_chance(config: &GeneticConfig) -> f32 {
        config.child_mutation_chance
    }

    /// Records every connection, and every hidden node `C` found
    /// between the endpoints of a connection `A -> B` as a split
    /// of that connection.
    fn register_innovations(&self, history: &mut History) {
        for gene in self.connections.values() {
            history.register(gene.source(), gene.target(), gene.innovation());
        }
        let hidden = self.nodes.values().filter(|n| n.node_type() == NodeType::Hidden);
        for node in hidden.map(|n| n.id()) {
            for incoming in self.connections.values().filter(|g| g.target() == node) {
                for outgoing in self.connections.values().filter(|g| g.source() == node) {
                    if let Some(split) = self.connections.get(&(incoming.source(), outgoing.target())) {
                        history.register_split(
                            split.innovation(),
                            (incoming.innovation(), node, outgoing.innovation()),
                        );
                    }
                }
            }
        }
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    fn size(&self) -> usize {
        self.connections.len()
    }
}

impl fmt::Display for NNGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes.values().map(ToString::to_string).collect();
        let connections: Vec<String> = self.connections.values().map(ToString::to_string).collect();
        write!(
            f,
            "Genome {{\n\tnodes: [{}],\n\tconnections: [{}],\n\tfitness: {:?}\n}}",
            nodes.join(", "),
            connections.join(", "),
            self.fitness,
        )
    }
}
