//! Per-step control of an endless-runner agent by an
//! evolved network: sensor readings in, one [`Action`] out.
use crate::genomics::{GeneticConfig, NNGenome, NetworkError};
use crate::networks::Network;

use ahash::RandomState;
use log::warn;
use rexneat::GenomeId;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};
use std::collections::HashSet;

/// Number of values in a [`Sensors`] reading.
pub const SENSOR_COUNT: usize = 12;
/// Number of network outputs decoded into an [`Action`].
pub const ACTION_COUNT: usize = 3;

/// What the agent perceives on one step, as normalized values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    /// Distance to the next obstacle, 1 when none is in sight.
    pub distance: f32,
    /// Type code of the next obstacle, 0 when none is in sight.
    pub obstacle_type: f32,
    pub speed: f32,
    pub obstacle_width: f32,
    pub obstacle_height: f32,
    pub obstacle_x: f32,
    pub obstacle_y: f32,
    pub agent_x: f32,
    pub agent_y: f32,
    pub agent_width: f32,
    pub agent_height: f32,
    /// 0 jumping, 1 ducking, 2 running.
    pub agent_state: f32,
}

impl Sensors {
    /// Returns the readings in network input order.
    pub fn as_inputs(&self) -> [f32; SENSOR_COUNT] {
        [
            self.distance,
            self.obstacle_type,
            self.speed,
            self.obstacle_width,
            self.obstacle_height,
            self.obstacle_x,
            self.obstacle_y,
            self.agent_x,
            self.agent_y,
            self.agent_width,
            self.agent_height,
            self.agent_state,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Jump,
    Duck,
    Run,
}

impl Action {
    /// Decodes network outputs: the first output above 0.5 among
    /// jump and duck wins, otherwise the agent keeps running.
    /// Missing outputs count as 0.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::controller::Action;
    ///
    /// assert_eq!(Action::decode(&[0.9, 0.9, 0.0]), Action::Jump);
    /// assert_eq!(Action::decode(&[0.5, 0.7, 0.0]), Action::Duck);
    /// assert_eq!(Action::decode(&[0.1, 0.2, 0.9]), Action::Run);
    /// assert_eq!(Action::decode(&[]), Action::Run);
    /// ```
    pub fn decode(outputs: &[f32]) -> Action {
        let output = |i: usize| outputs.get(i).copied().unwrap_or(0.0);
        if output(0) > 0.5 {
            Action::Jump
        } else if output(1) > 0.5 {
            Action::Duck
        } else {
            Action::Run
        }
    }
}

/// Activates `network` on `sensors` and decodes its outputs.
/// Activation failures are logged with the offending
/// readings and resolve to [`Action::Run`].
pub fn decide(network: &mut Network, sensors: &Sensors) -> Action {
    match network.activate(&sensors.as_inputs()) {
        Ok(outputs) => Action::decode(&outputs),
        Err(e) => {
            warn!("network activation failed ({}) for inputs {:?}", e, sensors);
            Action::Run
        }
    }
}

/// Keeps one network per genome id, built on first use.
///
/// Genome ids are never reused for a modified genome, so a
/// cached network stays valid for as long as its id is alive.
#[derive(Clone, Debug)]
pub struct Controller {
    config: GeneticConfig,
    networks: HashMap<GenomeId, Network, RandomState>,
}

impl Controller {
    pub fn new(config: GeneticConfig) -> Controller {
        Controller {
            config,
            networks: HashMap::default(),
        }
    }

    /// Chooses the action of genome `id` for this step.
    ///
    /// # Examples
    /// ```
    /// use rexneat::GenomeId;
    /// use rexneat_nn::controller::{Action, Controller, Sensors};
    /// use rexneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// // With no weights, every output sits at sigmoid(0) = 0.5.
    /// let config = GeneticConfig { weight_bound: 0.0, ..GeneticConfig::default() };
    /// let genome = NNGenome::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// let mut controller = Controller::new(config);
    /// let action = controller.action(GenomeId(0), &genome, &Sensors::default());
    /// assert_eq!(action, Action::Run);
    /// ```
    pub fn action(&mut self, id: GenomeId, genome: &NNGenome, sensors: &Sensors) -> Action {
        match self.network(id, genome) {
            Ok(network) => decide(network, sensors),
            Err(e) => {
                warn!("no network for genome {} ({}), inputs {:?}", id, e, sensors);
                Action::Run
            }
        }
    }

    /// Returns the cached network of genome `id`,
    /// building it from `genome` if needed.
    pub fn network(&mut self, id: GenomeId, genome: &NNGenome) -> Result<&mut Network, NetworkError> {
        match self.networks.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(Network::new(genome, &self.config)?)),
        }
    }

    /// Builds the networks of all listed genomes that are
    /// not cached yet, and drops those of unlisted ones.
    /// Genomes whose network can't be built are skipped
    /// with a warning.
    pub fn sync<'a>(&mut self, genomes: impl IntoIterator<Item = (&'a GenomeId, &'a NNGenome)>) {
        let mut live = HashSet::<GenomeId, RandomState>::default();
        for (&id, genome) in genomes {
            live.insert(id);
            if let Err(e) = self.network(id, genome) {
                warn!("skipping network of genome {}: {}", id, e);
            }
        }
        self.retain(|id| live.contains(&id));
    }

    /// Returns the cached network of genome `id`, if any.
    pub fn cached(&self, id: GenomeId) -> Option<&Network> {
        self.networks.get(&id)
    }

    /// Drops the networks of genomes for which `live` is false.
    pub fn retain(&mut self, live: impl Fn(GenomeId) -> bool) {
        self.networks.retain(|&id, _| live(id));
    }

    /// Forgets every network, e.g. after a population reset,
    /// since genome ids start over.
    pub fn clear(&mut self) {
        self.networks.clear();
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use std::collections::BTreeMap;

    fn genomes(n: u64, config: &GeneticConfig) -> BTreeMap<GenomeId, NNGenome> {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        (0..n).map(|i| (GenomeId(i), NNGenome::new(config, &mut rng))).collect()
    }

    #[test]
    fn inputs_follow_declared_order() {
        let sensors = Sensors {
            distance: 1.0,
            speed: 3.0,
            agent_state: 12.0,
            ..Sensors::default()
        };
        let inputs = sensors.as_inputs();
        assert_eq!(inputs[0], 1.0);
        assert_eq!(inputs[2], 3.0);
        assert_eq!(inputs[11], 12.0);
    }

    #[test]
    fn cache_keeps_only_live_genomes() {
        let config = GeneticConfig::default();
        let mut controller = Controller::new(config.clone());
        let all = genomes(4, &config);

        controller.sync(&all);
        assert_eq!(controller.len(), 4);

        let survivors: BTreeMap<_, _> = all.into_iter().filter(|(id, _)| id.0 % 2 == 0).collect();
        controller.sync(&survivors);
        assert_eq!(controller.len(), 2);
        assert!(controller.cached(GenomeId(1)).is_none());
        assert!(controller.cached(GenomeId(2)).is_some());

        controller.clear();
        assert!(controller.is_empty());
    }

    #[test]
    fn activation_failure_falls_back_to_run() {
        // A genome with the wrong number of sensors.
        let config = GeneticConfig {
            input_count: std::num::NonZeroUsize::new(2).unwrap(),
            weight_bound: 5.0,
            ..GeneticConfig::default()
        };
        let genome = genomes(1, &config).remove(&GenomeId(0)).unwrap();
        let mut controller = Controller::new(config);
        let sensors = Sensors {
            distance: 1.0,
            ..Sensors::default()
        };
        assert_eq!(controller.action(GenomeId(0), &genome, &sensors), Action::Run);
    }
}
