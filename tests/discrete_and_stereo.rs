use pmbp::image::encode_colour;
use pmbp::{
    Application, CostParams, DiscreteModel, EnergyModel, Model, ModelKind, ParticleGraph,
    PmbpConfig, RgbaImage, StereoModel, View,
};

fn textured(width: usize, height: usize, phase: usize) -> RgbaImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let v = ((x + phase) * 59 + y * 23 + 31) % 256;
            data.push(encode_colour(v as u8, (v * 7 % 256) as u8, (255 - v) as u8, 255));
        }
    }
    RgbaImage::new(data, width, height).unwrap()
}

fn discrete_config(max_motion: f32) -> PmbpConfig {
    PmbpConfig {
        n_iterations: 2,
        cost: CostParams {
            patch_size: 1,
            max_motion,
            ..CostParams::default()
        },
        ..PmbpConfig::default()
    }
}

#[test]
fn discrete_nodes_hold_the_whole_lattice() {
    let model = DiscreteModel::new(0.1, 50.0, 1.0);
    let lattice = model.lattice(1.0);
    let graph = ParticleGraph::new(
        model,
        discrete_config(1.0),
        textured(5, 4, 1),
        textured(5, 4, 0),
    )
    .unwrap();

    assert_eq!(graph.n_particles(), 9);
    for node in graph.nodes(View::One).iter() {
        let states: Vec<_> = node.particles().iter().map(|p| p.state.clone()).collect();
        assert_eq!(states, lattice);
    }
}

#[test]
fn discrete_solve_rescores_without_resampling() {
    let model = DiscreteModel::new(0.1, 50.0, 1.0);
    let lattice = model.lattice(1.0);
    let mut graph = ParticleGraph::new(
        model,
        discrete_config(1.0),
        textured(5, 4, 1),
        textured(5, 4, 0),
    )
    .unwrap();
    graph.solve();

    let node = graph.node(View::One, 2, 2);
    let states: Vec<_> = node.particles().iter().map(|p| p.state.clone()).collect();
    assert_eq!(states, lattice);
    let (dx, dy) = graph.displacement_at(View::One, 2, 2);
    assert!(lattice.iter().any(|s| s.data == vec![dx, dy]));
}

#[test]
fn discrete_defaults_derive_infinity_from_the_border() {
    let config = Application::Discrete.default_config();
    let p = config.cost.patch_size as f32;
    assert_eq!(config.cost.infinity, p * p * config.cost.border_cost());
    assert_eq!(Application::Discrete.kind(), ModelKind::Discrete);
}

#[test]
fn stereo_moves_only_horizontally() {
    let config = PmbpConfig {
        n_iterations: 2,
        n_particles: 2,
        seed: 4,
        cost: CostParams {
            patch_size: 1,
            max_motion: 3.0,
            ..CostParams::default()
        },
        ..PmbpConfig::default()
    };
    let mut graph = ParticleGraph::new(
        StereoModel::default(),
        config,
        textured(6, 4, 2),
        textured(6, 4, 0),
    )
    .unwrap();
    graph.solve();

    for y in 0..4 {
        for x in 0..6 {
            let (dx, dy) = graph.displacement_at(View::One, x, y);
            assert!(dx.is_finite());
            assert_eq!(dy, 0.0);
        }
    }
    let disparity = graph.output_disparity(View::One, 4.0);
    assert_eq!((disparity.width(), disparity.height()), (6, 4));
}

#[test]
fn stereo_states_keep_unit_normals() {
    let config = PmbpConfig {
        n_iterations: 1,
        n_particles: 2,
        cost: CostParams {
            max_motion: 3.0,
            ..CostParams::default()
        },
        ..PmbpConfig::default()
    };
    let mut graph = ParticleGraph::new(
        StereoModel::default(),
        config,
        textured(5, 3, 1),
        textured(5, 3, 0),
    )
    .unwrap();
    graph.solve();

    for node in graph.nodes(View::One).iter() {
        for particle in node.particles() {
            let n = &particle.state.meta;
            let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-4, "normal length {length}");
        }
    }
}

#[test]
fn runtime_model_delegates_to_the_concrete_one() {
    let model = Application::Flow.default_model();
    assert_eq!(model.tag(), ModelKind::Flow);
    assert_eq!((model.data_dim(), model.meta_dim()), (2, 0));
    assert!(matches!(model, Model::Flow(_)));

    let stereo = Model::Stereo(StereoModel::default());
    assert_eq!((stereo.data_dim(), stereo.meta_dim()), (3, 4));
    assert_eq!(stereo.tag(), ModelKind::Stereo);
}
