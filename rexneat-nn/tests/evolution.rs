use rexneat::{Genome, GenomeId, Phase, Population, PopulationConfig};
use rexneat_nn::controller::{decide, Controller, Sensors};
use rexneat_nn::genomics::{GeneticConfig, History, NNGenome, NodeType};
use rexneat_nn::networks::Network;

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

type RexPopulation = Population<GeneticConfig, History, NNGenome>;

fn population_config(size: usize, seed: u64) -> PopulationConfig {
    PopulationConfig {
        size: NonZeroUsize::new(size).unwrap(),
        seed: Some(seed),
        ..PopulationConfig::default()
    }
}

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        add_node_chance: 0.2,
        add_connection_chance: 0.3,
        ..GeneticConfig::default()
    }
}

/// Fitness rewarding a strong first output for near obstacles.
fn reflex(genome: &NNGenome, config: &GeneticConfig) -> Option<f32> {
    let mut network = Network::new(genome, config).ok()?;
    let near = Sensors {
        distance: 0.1,
        obstacle_type: 0.4,
        ..Sensors::default()
    };
    Some(network.activate(&near.as_inputs()).ok()?[0])
}

#[test]
fn initial_population_shares_minimal_topology() {
    let population = RexPopulation::new(population_config(50, 1), GeneticConfig::default());

    assert_eq!(population.genomes().len(), 50);
    let reference: BTreeSet<usize> = (0..36).collect();
    for genome in population.genomes().values() {
        let innovations: BTreeSet<usize> = genome.connections().map(|c| c.innovation()).collect();
        assert_eq!(innovations, reference);
        assert!(genome.nodes().all(|n| n.node_type() != NodeType::Hidden));
        assert!(genome.connections().all(|c| c.enabled()));
    }
    assert_eq!(population.history().max_gene_innovation(), Some(35));
    assert_eq!(population.phase(), Phase::AwaitingEvaluation);
}

#[test]
fn size_is_constant_and_networks_build() {
    let config = genetic_config();
    let mut population = RexPopulation::new(population_config(40, 2), config.clone());
    for generation in 0..10 {
        population.par_evaluate_fitness(|_, g| reflex(g, &config));
        population.evolve().unwrap();
        assert_eq!(population.genomes().len(), 40);
        assert_eq!(population.generation(), generation + 1);

        let assigned: usize = population.species().map(|s| s.len()).sum();
        assert_eq!(assigned, 40);
        for genome in population.genomes().values() {
            assert!(Network::new(genome, &config).is_ok());
        }
    }
}

#[test]
fn champion_is_copied_unchanged() {
    let config = genetic_config();
    let mut population = RexPopulation::new(population_config(30, 3), config.clone());
    for _ in 0..5 {
        population.evaluate_fitness(|_, g| reflex(g, &config));
        let (id, champion) = population.champion().unwrap();
        let mut expected = champion.clone();
        expected.clear_fitness();

        population.evolve().unwrap();

        assert_eq!(population.genome(id), Some(&expected));
    }
}

#[test]
fn seeded_run_is_reproducible() {
    let config = genetic_config();
    let run = || {
        let mut population = RexPopulation::new(population_config(25, 4), config.clone());
        for _ in 0..6 {
            population.evaluate_fitness(|_, g| reflex(g, &config));
            population.evolve().unwrap();
        }
        population
    };
    let (a, b) = (run(), run());
    assert_eq!(a.genomes(), b.genomes());
    assert_eq!(a.history(), b.history());
    let ids = |p: &RexPopulation| p.species().map(|s| s.id()).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
}

#[test]
fn snapshot_round_trip_continues_identically() {
    let config = genetic_config();
    let mut original = RexPopulation::new(population_config(20, 5), config.clone());
    for _ in 0..3 {
        original.evaluate_fitness(|_, g| reflex(g, &config));
        original.evolve().unwrap();
    }
    let mut restored = RexPopulation::from_bytes(&original.to_bytes().unwrap()).unwrap();

    assert_eq!(restored.generation(), original.generation());
    assert_eq!(restored.genomes(), original.genomes());
    assert_eq!(restored.history(), original.history());
    for (a, b) in original.species().zip(restored.species()) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.members().collect::<Vec<_>>(), b.members().collect::<Vec<_>>());
        assert_eq!(a.representative_id(), b.representative_id());
    }

    for population in [&mut original, &mut restored] {
        population.evaluate_fitness(|_, g| reflex(g, &config));
        population.evolve().unwrap();
    }
    assert_eq!(restored.genomes(), original.genomes());
}

#[test]
fn seeding_from_a_saved_genome() {
    let config = genetic_config();
    let mut population = RexPopulation::new(population_config(20, 6), config.clone());
    for _ in 0..5 {
        population.evaluate_fitness(|_, g| reflex(g, &config));
        population.evolve().unwrap();
    }
    let best = population.genomes().values().max_by_key(|g| g.connections().count()).unwrap().clone();

    let seeded = RexPopulation::new_seeded(vec![best.clone()], population_config(20, 7), config.clone()).unwrap();
    let mut stripped = best.clone();
    stripped.clear_fitness();
    assert_eq!(seeded.genome(GenomeId(0)), Some(&stripped));
    assert!(best
        .nodes()
        .all(|n| n.id() < seeded.history().next_node_id()));
    assert!(best
        .connections()
        .all(|c| Some(c.innovation()) <= seeded.history().max_gene_innovation()));

    // Every hidden node sits between the endpoints of a split it came from.
    let split_nodes: BTreeSet<i64> = seeded
        .history()
        .node_innovation_history()
        .map(|(_, &(_, node, _))| node)
        .collect();
    for node in best.nodes().filter(|n| n.node_type() == NodeType::Hidden) {
        assert!(split_nodes.contains(&node.id()));
    }
    for (&split, &(incoming, node, outgoing)) in seeded.history().node_innovation_history() {
        let split_gene = best.connections().find(|c| c.innovation() == split).unwrap();
        assert_eq!(best.connection(split_gene.source(), node).unwrap().innovation(), incoming);
        assert_eq!(best.connection(node, split_gene.target()).unwrap().innovation(), outgoing);
    }
}

#[test]
fn controller_follows_population() {
    let config = genetic_config();
    let mut population = RexPopulation::new(population_config(20, 8), config.clone());
    let mut controller = Controller::new(config.clone());
    for _ in 0..3 {
        controller.sync(population.genomes());
        assert_eq!(controller.len(), 20);
        population.par_evaluate_fitness(|id, _| {
            let mut network = controller.cached(id)?.clone();
            let sensors = Sensors::default();
            Some(match decide(&mut network, &sensors) {
                rexneat_nn::controller::Action::Jump => 1.0,
                _ => 0.5,
            })
        });
        population.evolve().unwrap();
    }
    controller.retain(|id| population.genome(id).is_some());
    assert!(controller.len() <= 20);
}
