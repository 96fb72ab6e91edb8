use crate::NodeId;

use serde::{Deserialize, Serialize};

use std::fmt;

/// An ActivationType represents the type
/// of activation function the node's network
/// equivalent will use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    // 1 / (1 + exp(-4.9x))
    Sigmoid,
    // tanh(x)
    Tanh,
    // 0   if x < 0
    // x   if x ≥ 0
    ReLU,
    // x
    Identity,
}

impl ActivationType {
    /// Applies the activation function to `x`.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::ReLU.apply(-3.0), 0.0);
    /// assert_eq!(ActivationType::Identity.apply(-3.0), -3.0);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * x.clamp(-60.0, 60.0)).exp()),
            ActivationType::Tanh => x.tanh(),
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Identity => x,
        }
    }
}

/// How a node combines its weighted inputs
/// before the bias and activation are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AggregationType {
    Sum,
    Product,
    Max,
    Mean,
}

impl AggregationType {
    /// Aggregates the values. An empty set of
    /// inputs aggregates to 0 for every rule.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::AggregationType;
    ///
    /// let inputs = [1.0, -2.0, 4.0];
    /// assert_eq!(AggregationType::Sum.aggregate(inputs.iter().copied()), 3.0);
    /// assert_eq!(AggregationType::Product.aggregate(inputs.iter().copied()), -8.0);
    /// assert_eq!(AggregationType::Max.aggregate(inputs.iter().copied()), 4.0);
    /// assert_eq!(AggregationType::Mean.aggregate(inputs.iter().copied()), 1.0);
    /// assert_eq!(AggregationType::Max.aggregate(std::iter::empty()), 0.0);
    /// ```
    pub fn aggregate(self, values: impl Iterator<Item = f32>) -> f32 {
        let mut count = 0usize;
        let mut acc: Option<f32> = None;
        for v in values {
            count += 1;
            acc = Some(match (self, acc) {
                (_, None) => v,
                (AggregationType::Sum | AggregationType::Mean, Some(a)) => a + v,
                (AggregationType::Product, Some(a)) => a * v,
                (AggregationType::Max, Some(a)) => a.max(v),
            });
        }
        match (self, acc) {
            (_, None) => 0.0,
            (AggregationType::Mean, Some(a)) => a / count as f32,
            (_, Some(a)) => a,
        }
    }
}

/// A NodeType indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes.
    Sensor,
    /// Hidden nodes.
    Hidden,
    /// Output nodes.
    Actuator,
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
///
/// Sensors have ids `-1, -2, …`, actuators `0, 1, …`,
/// and hidden nodes are numbered by the innovation
/// history from the output count onwards.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NodeGene {
    id: NodeId,
    node_type: NodeType,
    bias: f32,
    activation: ActivationType,
    aggregation: AggregationType,
}

impl NodeGene {
    /// Generate a new node with the passed parameters.
    /// Sensors always use the identity activation
    /// and no bias.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::{ActivationType, AggregationType, NodeGene, NodeType};
    ///
    /// let node = NodeGene::new(-1, NodeType::Sensor, ActivationType::Sigmoid, AggregationType::Sum);
    /// assert_eq!(node.activation(), ActivationType::Identity);
    /// ```
    pub fn new(
        id: NodeId,
        node_type: NodeType,
        activation: ActivationType,
        aggregation: AggregationType,
    ) -> NodeGene {
        NodeGene {
            id,
            node_type,
            bias: 0.0,
            activation: if node_type == NodeType::Sensor {
                ActivationType::Identity
            } else {
                activation
            },
            aggregation,
        }
    }

    /// Returns the node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's node type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f32) {
        if self.node_type != NodeType::Sensor {
            self.bias = bias;
        }
    }

    /// Returns the node's activation type.
    pub fn activation(&self) -> ActivationType {
        self.activation
    }

    pub fn aggregation(&self) -> AggregationType {
        self.aggregation
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, {:?}, {:?}, bias {:.3}]",
            self.id, self.node_type, self.activation, self.aggregation, self.bias,
        )
    }
}
