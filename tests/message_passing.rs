use pmbp::image::encode_colour;
use pmbp::lowlevel::Direction;
use pmbp::{
    CostParams, EnergyModel, FlowModel, ModelKind, ParticleGraph, PatchEvaluator, PmbpConfig,
    RgbaImage, State, SweepOrder, View,
};
use rand::Rng;
use std::cell::RefCell;
use std::collections::HashSet;
use std::ops::ControlFlow;

fn uniform_graph(
    width: usize,
    height: usize,
    model: FlowModel,
    n_particles: usize,
) -> ParticleGraph<FlowModel> {
    let img = RgbaImage::filled(width, height, encode_colour(90, 120, 60, 255)).unwrap();
    let config = PmbpConfig {
        n_particles,
        cost: CostParams {
            patch_size: 1,
            ..CostParams::default()
        },
        ..PmbpConfig::default()
    };
    ParticleGraph::new(model, config, img.clone(), img).unwrap()
}

fn textured(width: usize, height: usize, phase: usize) -> RgbaImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let v = ((x + phase) * 37 + y * 91) % 256;
            data.push(encode_colour(v as u8, (255 - v) as u8, ((v * 3) % 256) as u8, 255));
        }
    }
    RgbaImage::new(data, width, height).unwrap()
}

#[test]
fn sweep_orders_cycle_every_four_iterations() {
    assert_eq!(SweepOrder::for_iteration(0), SweepOrder::TopLeftToBottomRight);
    assert_eq!(SweepOrder::for_iteration(1), SweepOrder::BottomRightToTopLeft);
    assert_eq!(SweepOrder::for_iteration(2), SweepOrder::BottomLeftToTopRight);
    assert_eq!(SweepOrder::for_iteration(3), SweepOrder::TopRightToBottomLeft);
    assert_eq!(SweepOrder::for_iteration(4), SweepOrder::for_iteration(0));
    assert_eq!(SweepOrder::for_iteration(7), SweepOrder::for_iteration(3));
}

#[test]
fn every_sweep_visits_each_pixel_once() {
    for it in 0..4 {
        let pixels: Vec<_> = SweepOrder::for_iteration(it).pixels(5, 3).collect();
        let unique: HashSet<_> = pixels.iter().copied().collect();
        assert_eq!(pixels.len(), 15);
        assert_eq!(unique.len(), 15);
    }
}

#[test]
fn messages_take_the_cheapest_sender_particle() {
    let mut graph = uniform_graph(3, 1, FlowModel::new(1.0, 50.0), 2);
    let sender = graph.node_mut(View::One, 0, 0);
    sender.set_particle(0, State::from_data(vec![0.0, 0.0]), 0.0);
    sender.set_particle(1, State::from_data(vec![1.0, 0.0]), 0.0);
    let foundation = sender.foundation_mut(Direction::Right);
    foundation.set(0, 0.5);
    foundation.set(1, 0.0);

    let still = State::from_data(vec![0.0, 0.0]);
    let moving = State::from_data(vec![1.0, 0.0]);
    assert_eq!(graph.evaluate_message(View::One, (0, 0), (1, 0), &moving), 0.0);
    assert_eq!(graph.evaluate_message(View::One, (0, 0), (1, 0), &still), 0.5);
}

#[test]
fn raising_foundations_never_lowers_messages() {
    let mut graph = uniform_graph(3, 1, FlowModel::new(1.0, 50.0), 2);
    let probe = State::from_data(vec![0.3, -0.2]);
    let before = graph.evaluate_message(View::One, (0, 0), (1, 0), &probe);

    let foundation = graph
        .node_mut(View::One, 0, 0)
        .foundation_mut(Direction::Right);
    foundation.set(0, 2.0);
    foundation.set(1, 1.0);
    let after = graph.evaluate_message(View::One, (0, 0), (1, 0), &probe);

    assert!(after >= before, "{after} < {before}");
}

#[test]
fn disbelief_is_unary_when_neighbours_are_silent() {
    let one = textured(4, 3, 1);
    let two = textured(4, 3, 0);
    let config = PmbpConfig {
        n_particles: 2,
        ..PmbpConfig::default()
    };
    let graph = ParticleGraph::new(FlowModel::new(0.0, 50.0), config, one, two).unwrap();
    let state = State::from_data(vec![0.75, 0.5]);
    let infinity = graph.config().cost.infinity;

    let unary = graph
        .model()
        .unary_energy(&graph.evaluator(), View::One, 1, 1, &state, infinity);
    let disbelief = graph.evaluate_disbelief(View::One, 1, 1, &state, false);
    assert_eq!(disbelief, unary);
}

#[test]
fn propagation_only_reads_processed_neighbours() {
    let mut graph = uniform_graph(3, 1, FlowModel::new(0.0, 50.0), 1);
    graph
        .node_mut(View::One, 0, 0)
        .set_particle(0, State::from_data(vec![0.5, 0.0]), 0.0);
    graph
        .node_mut(View::One, 1, 0)
        .set_particle(0, State::from_data(vec![0.25, 0.0]), 1e9);

    graph.propagate(View::One, 1, 0);
    assert_eq!(graph.node(View::One, 1, 0).state(0).data, vec![0.25, 0.0]);
    assert!(!graph.propagated(View::One).get(1, 0));

    graph.cache(View::One, 0, 0);
    assert!(graph.processed(View::One).get(0, 0));
    graph.propagate(View::One, 1, 0);
    assert_eq!(graph.node(View::One, 1, 0).state(0).data, vec![0.5, 0.0]);
    assert!(graph.propagated(View::One).get(1, 0));
}

#[test]
fn candidate_must_strictly_beat_the_worst_particle() {
    let mut graph = uniform_graph(3, 1, FlowModel::new(0.0, 50.0), 1);
    graph
        .node_mut(View::One, 1, 0)
        .set_particle(0, State::from_data(vec![0.25, 0.0]), 0.0);

    let accepted =
        graph.propose_candidate(View::One, 1, 0, State::from_data(vec![0.5, 0.0]), false);
    assert!(!accepted);
    assert_eq!(graph.node(View::One, 1, 0).state(0).data, vec![0.25, 0.0]);
}

#[test]
fn forcing_does_not_bypass_the_score_test() {
    let mut graph = uniform_graph(3, 1, FlowModel::new(0.0, 50.0), 1);
    graph
        .node_mut(View::One, 1, 0)
        .set_particle(0, State::from_data(vec![0.25, 0.0]), 0.0);

    let accepted =
        graph.propose_candidate(View::One, 1, 0, State::from_data(vec![0.5, 0.0]), true);
    assert!(!accepted);
    assert_eq!(graph.node(View::One, 1, 0).state(0).data, vec![0.25, 0.0]);
}

/// Walks right by `ratio` from wherever it is asked to start and records
/// each starting point. Cost falls as `x` grows, so every step is accepted.
#[derive(Debug, Default)]
struct RecordingWalk {
    centres: RefCell<Vec<f32>>,
}

impl EnergyModel for RecordingWalk {
    fn tag(&self) -> ModelKind {
        ModelKind::Flow
    }

    fn data_dim(&self) -> usize {
        2
    }

    fn meta_dim(&self) -> usize {
        0
    }

    fn pairwise_energy(
        &self,
        _x1: usize,
        _y1: usize,
        _s1: &State,
        _x2: usize,
        _y2: usize,
        _s2: &State,
    ) -> f32 {
        0.0
    }

    fn displacement(&self, _x: f32, _y: f32, state: &State) -> (f32, f32) {
        (state.data[0], state.data[1])
    }

    fn random_state<R: Rng + ?Sized>(
        &self,
        _evaluator: &PatchEvaluator<'_>,
        _view: View,
        _x: usize,
        _y: usize,
        _rng: &mut R,
    ) -> State {
        State::zeros(2, 0)
    }

    fn random_state_around<R: Rng + ?Sized>(
        &self,
        _evaluator: &PatchEvaluator<'_>,
        _view: View,
        _x: usize,
        _y: usize,
        current: &State,
        ratio: f32,
        _rng: &mut R,
    ) -> State {
        self.centres.borrow_mut().push(current.data[0]);
        State::from_data(vec![current.data[0] + ratio, current.data[1]])
    }

    fn unary_energy(
        &self,
        _evaluator: &PatchEvaluator<'_>,
        _view: View,
        _x: usize,
        _y: usize,
        state: &State,
        _threshold: f32,
    ) -> f32 {
        100.0 - state.data[0]
    }
}

#[test]
fn random_search_recentres_on_accepted_proposals() {
    let img = RgbaImage::filled(1, 1, encode_colour(10, 20, 30, 255)).unwrap();
    let config = PmbpConfig {
        n_particles: 1,
        ..PmbpConfig::default()
    };
    let mut graph =
        ParticleGraph::new(RecordingWalk::default(), config, img.clone(), img).unwrap();
    graph.update_current_disbelief(View::One, 0, 0);
    graph.randomise(View::One, 0, 0);

    let expected = [0.0, 0.1, 0.15, 0.175, 0.1875, 0.19375, 0.196875];
    let centres = graph.model().centres.borrow().clone();
    assert_eq!(centres.len(), expected.len());
    for (got, want) in centres.iter().zip(expected) {
        assert!((got - want).abs() < 1e-5, "{centres:?}");
    }
    let last = graph.node(View::One, 0, 0).state(0).data[0];
    assert!((last - 0.1984375).abs() < 1e-5, "{last}");
}

#[test]
fn cache_centres_foundations() {
    let one = textured(3, 2, 2);
    let two = textured(3, 2, 0);
    let config = PmbpConfig {
        n_particles: 3,
        seed: 9,
        ..PmbpConfig::default()
    };
    let mut graph = ParticleGraph::new(FlowModel::new(0.5, 50.0), config, one, two).unwrap();
    graph.update_current_disbelief(View::One, 1, 0);
    graph.cache(View::One, 1, 0);

    let node = graph.node(View::One, 1, 0);
    for direction in [Direction::Left, Direction::Right, Direction::Down] {
        let sum: f32 = node.foundation(direction).values().iter().sum();
        assert!(sum.abs() < 1e-2, "{direction:?} sums to {sum}");
    }
    assert!(node.foundation(Direction::Up).values().iter().all(|&v| v == 0.0));
}

#[test]
fn solve_with_stops_when_asked() {
    let one = textured(4, 3, 1);
    let two = textured(4, 3, 0);
    let config = PmbpConfig {
        n_iterations: 5,
        n_particles: 2,
        ..PmbpConfig::default()
    };
    let mut graph = ParticleGraph::new(FlowModel::default(), config, one, two).unwrap();

    let mut seen = Vec::new();
    let completed = graph.solve_with(|it, _| {
        seen.push(it);
        if it == 1 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(completed, 2);
    assert_eq!(seen, vec![0, 1]);
}

#[test]
fn iteration_clears_processed_flags() {
    let one = textured(4, 3, 1);
    let two = textured(4, 3, 0);
    let mut graph =
        ParticleGraph::new(FlowModel::default(), PmbpConfig::default(), one, two).unwrap();
    graph.iterate(0);
    assert_eq!(graph.processed(View::One).count(true), 0);
    let pct = graph.propagated_percentage(View::One);
    assert!((0.0..=100.0).contains(&pct));
}
