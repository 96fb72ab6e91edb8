use crate::genomics::GeneticConfig;
use crate::{Innovation, NodeId};

use ahash::RandomState;
use rexneat::InnovationHistory;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// A `History` keeps track of connection and node innovations in a
/// population, in order to make sure identical mutations
/// are assigned the same innovation numbers.
///
/// For connection innovations the source and target nodes are used
/// to identify identical mutations, and the corresponding innovation
/// number is recorded.
///
/// For node innovations the split connection's innovation is used to
/// identify identical mutations, and the innovation numbers for the
/// corresponding incoming connection, new node, and outgoing
/// connection are recorded, in that order. A connection split
/// again by a genome already holding its recorded node gets a
/// further record, shared by every genome making the same
/// repeated split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    next_gene_innovation: Innovation,
    next_node_id: NodeId,
    gene_innovations: HashMap<(NodeId, NodeId), Innovation, RandomState>,
    node_innovations: HashMap<Innovation, Vec<(Innovation, NodeId, Innovation)>, RandomState>,
}

impl InnovationHistory for History {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> History {
        Self::new(config)
    }
}

impl History {
    /// Creates a new History using the specified configuration.
    ///
    /// Initially generated connections are given the innovation number
    /// `o + i ⨯ output_count`, where `-(i + 1)` is the id of their
    /// sensor and `o` that of their actuator. Thus, the next available
    /// innovation number starts at `input_count ⨯ output_count`,
    /// and the first hidden node id is `output_count`.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{GeneticConfig, History};
    ///
    /// let history = History::new(&GeneticConfig::default());
    ///
    /// assert_eq!(history.connection_innovation(-1, 0), Some(0));
    /// assert_eq!(history.connection_innovation(-12, 2), Some(35));
    /// assert_eq!(history.max_gene_innovation(), Some(35));
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let (inputs, outputs) = (config.input_count.get(), config.output_count.get());
        let gene_innovations = (0..inputs)
            .flat_map(|i| (0..outputs).map(move |o| (i, o)))
            .map(|(i, o)| ((sensor_id(i), o as NodeId), o + i * outputs))
            .collect();
        History {
            next_gene_innovation: inputs * outputs,
            next_node_id: outputs as NodeId,
            gene_innovations,
            node_innovations: HashMap::default(),
        }
    }

    /// Returns the innovation number recorded for the
    /// `(source, target)` connection, if any.
    pub fn connection_innovation(&self, source: NodeId, target: NodeId) -> Option<Innovation> {
        self.gene_innovations.get(&(source, target)).copied()
    }

    /// Returns the innovation number of the `(source, target)`
    /// connection, recording a new one if the pair is unseen.
    pub(crate) fn add_connection_innovation(&mut self, source: NodeId, target: NodeId) -> Innovation {
        match self.gene_innovations.entry((source, target)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = self.next_gene_innovation;
                self.next_gene_innovation += 1;
                *entry.insert(innovation)
            }
        }
    }

    /// Returns the numbers first recorded for splitting the
    /// connection with innovation `split_gene`, in the format
    /// `(incoming connection, new node, outgoing connection)`.
    pub fn split_innovation(&self, split_gene: Innovation) -> Option<(Innovation, NodeId, Innovation)> {
        self.split_innovations(split_gene).first().copied()
    }

    /// Returns every record of splitting the connection with
    /// innovation `split_gene`, oldest first.
    pub fn split_innovations(&self, split_gene: Innovation) -> &[(Innovation, NodeId, Innovation)] {
        self.node_innovations
            .get(&split_gene)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the numbers for splitting the `source -> target`
    /// connection with innovation `split_gene`.
    ///
    /// The oldest record whose node is not `held` by the mutating
    /// genome is reused. If the genome holds every recorded node,
    /// fresh numbers are allocated and recorded after the others.
    pub(crate) fn add_split_innovation(
        &mut self,
        split_gene: Innovation,
        source: NodeId,
        target: NodeId,
        held: impl Fn(NodeId) -> bool,
    ) -> (Innovation, NodeId, Innovation) {
        if let Some(&record) = self
            .split_innovations(split_gene)
            .iter()
            .find(|(_, node, _)| !held(*node))
        {
            return record;
        }
        let new_node = self.next_node_id;
        self.next_node_id += 1;
        let record = (
            self.add_connection_innovation(source, new_node),
            new_node,
            self.add_connection_innovation(new_node, target),
        );
        self.node_innovations.entry(split_gene).or_default().push(record);
        record
    }

    /// Records connections and nodes carried by a genome built
    /// outside of this history, and moves the counters past them.
    pub(crate) fn register(&mut self, source: NodeId, target: NodeId, innovation: Innovation) {
        self.gene_innovations.entry((source, target)).or_insert(innovation);
        self.next_gene_innovation = self.next_gene_innovation.max(innovation + 1);
        for node in [source, target] {
            self.next_node_id = self.next_node_id.max(node + 1);
        }
    }

    /// Records a split carried by a genome built outside of
    /// this history, unless its node is already recorded
    /// for the same connection.
    pub(crate) fn register_split(&mut self, split_gene: Innovation, record: (Innovation, NodeId, Innovation)) {
        let records = self.node_innovations.entry(split_gene).or_default();
        if records.iter().all(|(_, node, _)| *node != record.1) {
            records.push(record);
        }
        self.next_node_id = self.next_node_id.max(record.1 + 1);
    }

    /// Returns the highest connection innovation number generated.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{GeneticConfig, History};
    ///
    /// let history = History::new(&GeneticConfig::zero());
    ///
    /// assert_eq!(history.max_gene_innovation(), Some(0));
    /// ```
    pub fn max_gene_innovation(&self) -> Option<Innovation> {
        self.next_gene_innovation.checked_sub(1)
    }

    /// Returns the id the next new hidden node will receive.
    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    /// Returns an iterator over the complete record of
    /// connection innovations, in the format
    /// `((source, target), innovation)`.
    /// No ordering is guaranteed.
    pub fn gene_innovation_history(&self) -> impl Iterator<Item = (&(NodeId, NodeId), &Innovation)> {
        self.gene_innovations.iter()
    }

    /// Returns an iterator over the complete record of
    /// node innovations, in the format
    /// `(split connection, (incoming connection, new node, outgoing connection))`.
    /// No ordering is guaranteed.
    pub fn node_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&Innovation, &(Innovation, NodeId, Innovation))> {
        self.node_innovations
            .iter()
            .flat_map(|(split, records)| records.iter().map(move |record| (split, record)))
    }
}

/// Returns the id of the sensor with index `index`.
pub(crate) fn sensor_id(index: usize) -> NodeId {
    -(index as NodeId) - 1
}
